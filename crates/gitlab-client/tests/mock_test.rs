//! Behaviour of the in-memory mock that controller tests rely on

use gitlab_client::*;

#[tokio::test]
async fn test_records_calls_and_injects_failures() {
    let mock = MockGitLabClient::new();
    mock.add_project(Project {
        id: 7,
        name: "demo".to_string(),
        ..Default::default()
    });

    mock.fail_next("get_project", 503, "maintenance");
    let err = mock.get_project("7").await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.is_transient());

    // Failures are one-shot.
    let project = mock.get_project("7").await.unwrap();
    assert_eq!(project.name, "demo");
    assert_eq!(mock.operations(), vec!["get_project", "get_project"]);
}

#[tokio::test]
async fn test_project_delete_is_two_step() {
    let mock = MockGitLabClient::new();
    let project = mock
        .create_project(&CreateProjectOptions {
            name: Some("demo".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    mock.delete_project(project.id, &DeleteProjectOptions::default())
        .await
        .unwrap();
    let marked = mock.project(project.id).unwrap();
    assert!(marked.marked_for_deletion_on.is_some());

    mock.delete_project(
        project.id,
        &DeleteProjectOptions {
            permanently_remove: Some(true),
            full_path: Some(project.path_with_namespace.clone()),
        },
    )
    .await
    .unwrap();
    assert!(mock.project(project.id).is_none());
}

#[tokio::test]
async fn test_missing_objects_are_not_found() {
    let mock = MockGitLabClient::new();
    let err = mock.get_protected_branch(1, "main").await.unwrap_err();
    assert!(is_not_found(&err));
    let err = mock.delete_registered_runner_by_id(9).await.unwrap_err();
    assert!(is_not_found(&err));
}

#[tokio::test]
async fn test_create_body_is_recorded() {
    let mock = MockGitLabClient::new();
    mock.create_variable(
        3,
        &CreateProjectVariableOptions {
            key: "TOKEN".to_string(),
            value: "s3cr3t".to_string(),
            masked: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let calls = mock.calls_to("create_variable");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body["masked"], serde_json::json!(true));
    assert!(calls[0].body.get("raw").is_none());
}
