use super::project::*;
use crate::error::ControllerError;
use crate::external::{connection_detail, ExternalClient};
use crate::test_utils::{context, project_record, MemorySecrets};
use crds::{ConditionReason, ConditionType, Managed, ProjectParameters, VisibilityValue};
use gitlab_client::{MockGitLabClient, Project as RemoteProject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde_json::json;

fn external(mock: &MockGitLabClient) -> ProjectExternal<MockGitLabClient> {
    ProjectExternal::new(mock.clone(), context(MemorySecrets::default()))
}

fn remote(id: i64, path_with_namespace: &str) -> RemoteProject {
    RemoteProject {
        id,
        name: "demo".to_string(),
        path: "demo".to_string(),
        path_with_namespace: path_with_namespace.to_string(),
        visibility: "private".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_observe_update() {
    let mock = MockGitLabClient::new();
    let external = external(&mock);
    let mut cr = project_record("demo");
    cr.spec.for_provider.name = Some("demo".to_string());

    let observation = external.observe(&mut cr).await.unwrap();
    assert!(!observation.resource_exists);
    assert!(mock.operations().is_empty());

    let creation = external.create(&mut cr).await.unwrap();
    assert_eq!(cr.external_name(), "1001");
    assert_eq!(
        creation.connection_details,
        connection_detail(RUNNERS_TOKEN_KEY, "GR1348941mock1001")
    );

    let observation = external.observe(&mut cr).await.unwrap();
    assert!(observation.resource_exists);
    assert!(observation.resource_up_to_date);
    assert!(observation.resource_late_initialized);
    assert_eq!(
        cr.condition(ConditionType::Ready).map(|c| c.reason),
        Some(ConditionReason::Available)
    );
    let at_provider = &cr.status.as_ref().unwrap().at_provider;
    assert_eq!(at_provider.id, Some(1001));
    assert_eq!(at_provider.path_with_namespace.as_deref(), Some("root/demo"));

    cr.spec.for_provider.name = Some("demo2".to_string());
    let observation = external.observe(&mut cr).await.unwrap();
    assert!(!observation.resource_up_to_date);

    external.update(&mut cr).await.unwrap();
    let edits = mock.calls_to("edit_project");
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].body["name"], "demo2");
    assert!(edits[0].body.get("namespace_id").is_none());
    assert_eq!(mock.project(1001).unwrap().name, "demo2");
}

#[tokio::test]
async fn create_defaults_name_to_record_name() {
    let mock = MockGitLabClient::new();
    let mut cr = project_record("from-metadata");
    external(&mock).create(&mut cr).await.unwrap();
    assert_eq!(mock.calls_to("create_project")[0].body["name"], "from-metadata");
}

#[tokio::test]
async fn observe_is_idempotent() {
    let mock = MockGitLabClient::new();
    mock.add_project(remote(5, "p/q"));
    let external = external(&mock);
    let mut cr = project_record("demo");
    cr.set_external_name("5");
    cr.spec.for_provider.visibility = Some(VisibilityValue::Public);

    let first = external.observe(&mut cr).await.unwrap();
    let second = external.observe(&mut cr).await.unwrap();
    assert_eq!(first.resource_up_to_date, second.resource_up_to_date);
    assert!(!first.resource_up_to_date);
    // Late init happened once
    assert!(first.resource_late_initialized);
    assert!(!second.resource_late_initialized);
}

#[tokio::test]
async fn malformed_external_name_is_rejected() {
    let mock = MockGitLabClient::new();
    let mut cr = project_record("demo");
    cr.set_external_name("p/q");
    let err = external(&mock).observe(&mut cr).await.unwrap_err();
    assert!(matches!(err, ControllerError::MalformedExternalName { .. }));
    assert_eq!(err.to_string(), "ID is not an integer");
}

#[tokio::test]
async fn legacy_path_external_name_is_rewritten() {
    let mock = MockGitLabClient::new();
    mock.add_project(remote(5, "p/q"));
    let mut ctx = context(MemorySecrets::default());
    ctx.project_path_external_names = true;
    let external = ProjectExternal::new(mock.clone(), ctx);
    let mut cr = project_record("demo");
    cr.set_external_name("p/q");

    let observation = external.observe(&mut cr).await.unwrap();
    assert!(observation.resource_exists);
    assert_eq!(cr.external_name(), "5");
    assert_eq!(mock.calls_to("get_project")[0].body, json!({ "pid": "p/q" }));
}

#[tokio::test]
async fn not_found_and_errors() {
    let mock = MockGitLabClient::new();
    let external = external(&mock);
    let mut cr = project_record("demo");
    cr.set_external_name("9");
    assert!(!external.observe(&mut cr).await.unwrap().resource_exists);

    mock.fail_next("get_project", 500, "boom");
    let err = external.observe(&mut cr).await.unwrap_err();
    assert_eq!(err.to_string(), "cannot observe Project: MOCK get_project: 500 boom");
    assert!(err.is_transient());
}

#[tokio::test]
async fn permanent_delete_issues_two_calls() {
    let mock = MockGitLabClient::new();
    mock.add_project(remote(5, "p/q"));
    let external = external(&mock);
    let mut cr = project_record("demo");
    cr.set_external_name("5");
    cr.spec.for_provider.permanently_remove = Some(true);
    cr.status.get_or_insert_with(Default::default).at_provider.path_with_namespace = Some("p/q".to_string());

    external.delete(&mut cr).await.unwrap();

    let deletes = mock.calls_to("delete_project");
    assert_eq!(deletes.len(), 2);
    assert_eq!(deletes[0].body, json!({ "pid": 5, "opts": {} }));
    assert_eq!(
        deletes[1].body,
        json!({ "pid": 5, "opts": { "permanently_remove": true, "full_path": "p/q" } })
    );
    assert!(mock.project(5).is_none());
    assert!(!external.observe(&mut cr).await.unwrap().resource_exists);
}

#[tokio::test]
async fn soft_delete_leaves_project_marked() {
    let mock = MockGitLabClient::new();
    mock.add_project(remote(5, "p/q"));
    let external = external(&mock);
    let mut cr = project_record("demo");
    cr.set_external_name("5");

    external.delete(&mut cr).await.unwrap();
    assert_eq!(mock.calls_to("delete_project").len(), 1);

    // Still exists, now marked
    let observation = external.observe(&mut cr).await.unwrap();
    assert!(observation.resource_exists);
    let marked = cr.status.as_ref().unwrap().at_provider.marked_for_deletion_on.clone();
    assert!(marked.is_some());

    // A second delete does not repeat the soft delete
    external.delete(&mut cr).await.unwrap();
    assert_eq!(mock.calls_to("delete_project").len(), 1);
}

#[tokio::test]
async fn pending_deletion_releases_record_when_asked() {
    let mock = MockGitLabClient::new();
    let mut project = remote(5, "p/q");
    project.marked_for_deletion_on = Some("2026-10-25".to_string());
    mock.add_project(project);
    let external = external(&mock);
    let mut cr = project_record("demo");
    cr.set_external_name("5");
    cr.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));

    assert!(external.observe(&mut cr).await.unwrap().resource_exists);

    cr.spec.for_provider.remove_finalizer_on_pending_deletion = Some(true);
    assert!(!external.observe(&mut cr).await.unwrap().resource_exists);
}

#[tokio::test]
async fn delete_of_missing_project_succeeds() {
    let mock = MockGitLabClient::new();
    let mut cr = project_record("demo");
    cr.set_external_name("5");
    external(&mock).delete(&mut cr).await.unwrap();
}

#[test]
fn public_jobs_wins_over_public_builds() {
    let both = ProjectParameters {
        public_builds: Some(false),
        public_jobs: Some(true),
        ..Default::default()
    };
    assert_eq!(create_options(&both, "demo").settings.public_jobs, Some(true));
    let remote = remote(5, "p/q");
    assert_eq!(observation(&both, &remote).using_deprecated_public_builds, Some(false));

    let deprecated_only = ProjectParameters {
        public_builds: Some(false),
        ..Default::default()
    };
    assert_eq!(update_options(&deprecated_only).settings.public_jobs, Some(false));
    assert_eq!(
        observation(&deprecated_only, &remote).using_deprecated_public_builds,
        Some(true)
    );
}

#[test]
fn late_initialize_is_monotonic() {
    let mut remote = remote(5, "p/q");
    remote.topics = vec!["b".to_string(), "a".to_string()];
    remote.mirror_user_id = Some(0);
    let mut params = ProjectParameters {
        visibility: Some(VisibilityValue::Internal),
        ..Default::default()
    };

    late_initialize(&mut params, &remote);
    let once = params.clone();
    late_initialize(&mut params, &remote);

    assert_eq!(params, once);
    assert_eq!(params.visibility, Some(VisibilityValue::Internal));
    assert_eq!(params.name.as_deref(), Some("demo"));
    assert_eq!(params.topics, Some(vec!["b".to_string(), "a".to_string()]));
    assert_eq!(params.mirror_user_id, None);
}

#[test]
fn topics_compare_as_multiset() {
    let mut remote = remote(5, "p/q");
    remote.topics = vec!["b".to_string(), "a".to_string()];
    let params = ProjectParameters {
        topics: Some(vec!["a".to_string(), "b".to_string()]),
        ..Default::default()
    };
    assert!(is_up_to_date(&params, &remote));

    let params = ProjectParameters {
        topics: Some(vec!["a".to_string()]),
        ..Default::default()
    };
    assert!(!is_up_to_date(&params, &remote));
    assert!(is_up_to_date(&ProjectParameters::default(), &remote));
}
