//! Integration tests for GitLab client
//!
//! These tests require a running GitLab instance.
//! Set GITLAB_URL and GITLAB_TOKEN environment variables to run.

use gitlab_client::{
    is_not_found, AuthMethod, CreateProjectOptions, DeleteProjectOptions, GitLabClient,
    ProjectVariablesApi, ProjectsApi,
};

fn client() -> GitLabClient {
    let url = std::env::var("GITLAB_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let token = std::env::var("GITLAB_TOKEN").expect("GITLAB_TOKEN environment variable must be set");
    GitLabClient::new(url, token, false, AuthMethod::PrivateToken).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running GitLab instance
async fn test_missing_project_is_not_found() {
    let err = client()
        .get_project("does-not-exist/really-not")
        .await
        .expect_err("project should not exist");
    assert!(is_not_found(&err), "unexpected error: {err}");
}

#[tokio::test]
#[ignore]
async fn test_project_lifecycle() {
    let client = client();
    let project = client
        .create_project(&CreateProjectOptions {
            name: Some(format!("it-{}", chrono::Utc::now().timestamp())),
            ..Default::default()
        })
        .await
        .expect("Failed to create project");

    let fetched = client
        .get_project(&project.id.to_string())
        .await
        .expect("Failed to get project");
    assert_eq!(fetched.path_with_namespace, project.path_with_namespace);

    let missing = client.get_variable(project.id, "NOPE", None).await;
    assert!(missing.as_ref().is_err_and(is_not_found));

    client
        .delete_project(project.id, &DeleteProjectOptions::default())
        .await
        .expect("Failed to delete project");
}
