use super::group::*;
use crate::external::{connection_detail, ExternalClient};
use crate::test_utils::{context, record, MemorySecrets};
use crds::{Group, GroupParameters, GroupSpec, Managed, ProjectCreationLevelValue, VisibilityValue};
use gitlab_client::{Group as RemoteGroup, MockGitLabClient};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde_json::json;

fn group(parent_id: Option<i64>) -> Group {
    record(Group::new(
        "platform",
        GroupSpec {
            resource: Default::default(),
            for_provider: GroupParameters {
                name: "Platform".to_string(),
                path: "platform".to_string(),
                parent_id,
                ..Default::default()
            },
        },
    ))
}

fn external(mock: &MockGitLabClient) -> GroupExternal<MockGitLabClient> {
    GroupExternal::new(mock.clone(), context(MemorySecrets::default()))
}

#[tokio::test]
async fn create_observe_update() {
    let mock = MockGitLabClient::new();
    mock.add_group(RemoteGroup {
        id: 3,
        name: "Org".to_string(),
        path: "org".to_string(),
        full_name: "Org".to_string(),
        full_path: "org".to_string(),
        ..Default::default()
    });
    let mut cr = group(Some(3));

    let creation = external(&mock).create(&mut cr).await.unwrap();
    assert_eq!(cr.external_name(), "1001");
    assert_eq!(
        creation.connection_details,
        connection_detail(RUNNERS_TOKEN_KEY, "GR1348941group1001")
    );

    let observation = external(&mock).observe(&mut cr).await.unwrap();
    assert!(observation.resource_exists);
    assert!(observation.resource_up_to_date);
    assert!(observation.resource_late_initialized);
    assert_eq!(cr.spec.for_provider.visibility, Some(VisibilityValue::Private));
    assert_eq!(
        cr.spec.for_provider.project_creation_level,
        Some(ProjectCreationLevelValue::Developer)
    );
    let at_provider = &cr.status.as_ref().unwrap().at_provider;
    assert_eq!(at_provider.full_path.as_deref(), Some("org/platform"));
    assert_eq!(at_provider.parent_id, Some(3));

    // reparenting is not an update
    cr.spec.for_provider.parent_id = Some(99);
    assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);

    cr.spec.for_provider.description = Some("Platform team".to_string());
    assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
    external(&mock).update(&mut cr).await.unwrap();
    let body = &mock.calls_to("update_group")[0].body;
    assert_eq!(body["description"], "Platform team");
    assert!(body.get("parent_id").is_none());
}

#[tokio::test]
async fn permanent_delete_issues_two_calls() {
    let mock = MockGitLabClient::new();
    let mut cr = group(None);
    cr.spec.for_provider.permanently_remove = Some(true);
    external(&mock).create(&mut cr).await.unwrap();
    external(&mock).observe(&mut cr).await.unwrap();

    external(&mock).delete(&mut cr).await.unwrap();
    let deletes: Vec<_> = mock.calls_to("delete_group").into_iter().map(|c| c.body).collect();
    assert_eq!(
        deletes,
        [
            json!({ "gid": 1001, "opts": {} }),
            json!({ "gid": 1001, "opts": { "permanently_remove": true, "full_path": "platform" } }),
        ]
    );
    assert!(mock.group(1001).is_none());
    assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_exists);
}

#[tokio::test]
async fn pending_deletion_releases_record_when_asked() {
    let mock = MockGitLabClient::new();
    let mut cr = group(None);
    external(&mock).create(&mut cr).await.unwrap();
    external(&mock).observe(&mut cr).await.unwrap();
    external(&mock).delete(&mut cr).await.unwrap();
    assert!(mock.group(1001).unwrap().marked_for_deletion_on.is_some());

    cr.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
    assert!(external(&mock).observe(&mut cr).await.unwrap().resource_exists);

    cr.spec.for_provider.remove_finalizer_on_pending_deletion = Some(true);
    assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_exists);
    assert!(
        cr.status
            .as_ref()
            .unwrap()
            .at_provider
            .marked_for_deletion_on
            .is_some()
    );
}
