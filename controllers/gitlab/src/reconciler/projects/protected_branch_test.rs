use super::protected_branch::*;
use crate::external::ExternalClient;
use crate::test_utils::{context, record, MemorySecrets};
use crds::{BranchPermission, Managed, ProtectedBranch, ProtectedBranchParameters, ProtectedBranchSpec};
use gitlab_client::{BranchAccessDescription, MockGitLabClient, ProtectedBranch as RemoteProtectedBranch};

fn branch() -> ProtectedBranch {
    record(ProtectedBranch::new(
        "main-protection",
        ProtectedBranchSpec {
            resource: Default::default(),
            for_provider: ProtectedBranchParameters {
                project_id: Some(11),
                branch_name: "main".to_string(),
                push_access_level: Some(40),
                ..Default::default()
            },
        },
    ))
}

fn external(mock: &MockGitLabClient) -> ProtectedBranchExternal<MockGitLabClient> {
    ProtectedBranchExternal::new(mock.clone(), context(MemorySecrets::default()))
}

#[tokio::test]
async fn update_replaces_protection() {
    let mock = MockGitLabClient::new();
    let mut cr = branch();
    external(&mock).create(&mut cr).await.unwrap();
    assert_eq!(cr.external_name(), "main");
    assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);

    cr.spec.for_provider.push_access_level = Some(30);
    cr.spec.for_provider.allowed_to_push = Some(vec![BranchPermission {
        user_id: Some(5),
        group_id: None,
        access_level: None,
    }]);
    assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);

    external(&mock).update(&mut cr).await.unwrap();
    let ops = mock.operations();
    let tail: Vec<&str> = ops.iter().rev().take(2).rev().map(String::as_str).collect();
    assert_eq!(tail, ["unprotect_repository_branches", "protect_repository_branches"]);
    let body = &mock.calls_to("protect_repository_branches")[1].body;
    assert_eq!(body["name"], "main");
    assert_eq!(body["push_access_level"], 30);

    assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
}

#[tokio::test]
async fn failed_reprotect_is_reported_distinctly() {
    let mock = MockGitLabClient::new();
    let mut cr = branch();
    external(&mock).create(&mut cr).await.unwrap();

    mock.fail_next("protect_repository_branches", 422, "invalid access level");
    let err = external(&mock).update(&mut cr).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot re-protect branch after update: MOCK protect_repository_branches: 422 invalid access level"
    );
    assert_eq!(cr.external_name(), "main");
    assert!(mock.protected_branch(11, "main").is_none());
}

#[tokio::test]
async fn failed_unprotect_stops_update() {
    let mock = MockGitLabClient::new();
    let mut cr = branch();
    external(&mock).create(&mut cr).await.unwrap();

    mock.fail_next("unprotect_repository_branches", 500, "boom");
    let err = external(&mock).update(&mut cr).await.unwrap_err();
    assert!(err.to_string().starts_with("cannot update ProtectedBranch"));
    assert_eq!(mock.calls_to("protect_repository_branches").len(), 1);
}

#[tokio::test]
async fn delete_unprotects() {
    let mock = MockGitLabClient::new();
    let mut cr = branch();
    external(&mock).create(&mut cr).await.unwrap();
    external(&mock).delete(&mut cr).await.unwrap();
    assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_exists);
    external(&mock).delete(&mut cr).await.unwrap();
}

#[test]
fn grants_ignore_order() {
    let grant = |user_id: Option<i64>, group_id: Option<i64>| BranchAccessDescription {
        access_level: 30,
        user_id,
        group_id,
        ..Default::default()
    };
    let remote = RemoteProtectedBranch {
        name: "main".to_string(),
        push_access_levels: vec![
            BranchAccessDescription {
                access_level: 40,
                ..Default::default()
            },
            grant(None, Some(9)),
            grant(Some(5), None),
        ],
        ..Default::default()
    };
    let perm = |user_id: Option<i64>, group_id: Option<i64>| BranchPermission {
        user_id,
        group_id,
        access_level: None,
    };
    let mut p = ProtectedBranchParameters {
        branch_name: "main".to_string(),
        push_access_level: Some(40),
        allowed_to_push: Some(vec![perm(Some(5), None), perm(None, Some(9))]),
        ..Default::default()
    };
    assert!(is_up_to_date(&p, &remote));

    p.allowed_to_push = Some(vec![perm(Some(5), None)]);
    assert!(!is_up_to_date(&p, &remote));

    late_initialize(&mut p, &remote);
    assert_eq!(p.merge_access_level, None);
    assert_eq!(p.allow_force_push, Some(false));
}
