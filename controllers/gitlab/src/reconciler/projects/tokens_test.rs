use super::access_token::{AccessTokenExternal, TOKEN_KEY};
use super::deploy_token::{self, DeployTokenExternal};
use crate::error::ControllerError;
use crate::external::{connection_detail, ExternalClient};
use crate::reconciler::runners::RunnerExternal;
use crate::test_utils::{context, record, MemorySecrets};
use crds::{
    AccessToken, AccessTokenParameters, AccessTokenSpec, DeployToken, DeployTokenObservation, DeployTokenParameters,
    DeployTokenSpec, Managed, ResourceSpec, Runner, RunnerParameters, RunnerSpec, RunnerTypeValue, SecretReference,
};
use gitlab_client::{DeployToken as RemoteDeployToken, MockGitLabClient};

fn with_secret() -> ResourceSpec {
    ResourceSpec {
        write_connection_secret_to_ref: Some(SecretReference {
            name: "ci-token".to_string(),
            namespace: None,
        }),
        ..Default::default()
    }
}

fn access_token(resource: ResourceSpec) -> AccessToken {
    record(AccessToken::new(
        "ci-token",
        AccessTokenSpec {
            resource,
            for_provider: AccessTokenParameters {
                project_id: Some(9),
                name: "ci".to_string(),
                scopes: vec!["api".to_string()],
                ..Default::default()
            },
        },
    ))
}

fn deploy_token(resource: ResourceSpec) -> DeployToken {
    record(DeployToken::new(
        "registry-pull",
        DeployTokenSpec {
            resource,
            for_provider: DeployTokenParameters {
                project_id: Some(9),
                name: "registry".to_string(),
                scopes: vec!["read_registry".to_string()],
                ..Default::default()
            },
        },
    ))
}

fn instance_runner(resource: ResourceSpec) -> Runner {
    record(Runner::new(
        "shared-runner",
        RunnerSpec {
            resource,
            for_provider: RunnerParameters {
                runner_type: RunnerTypeValue::Instance,
                group_id: None,
                group_id_ref: None,
                project_id: None,
                project_id_ref: None,
                description: None,
                paused: None,
                locked: None,
                run_untagged: None,
                tag_list: None,
                access_level: None,
                maximum_timeout: None,
                maintenance_note: None,
            },
        },
    ))
}

#[tokio::test]
async fn access_token_is_emitted_once() {
    let mock = MockGitLabClient::new();
    let external = AccessTokenExternal::new(mock.clone(), context(MemorySecrets::default()));
    let mut cr = access_token(with_secret());

    let creation = external.create(&mut cr).await.unwrap();
    assert_eq!(cr.external_name(), "1001");
    assert_eq!(creation.connection_details, connection_detail(TOKEN_KEY, "glpat-mock1001"));

    let observation = external.observe(&mut cr).await.unwrap();
    assert!(observation.resource_exists);
    assert!(observation.resource_up_to_date);
    assert!(observation.connection_details.is_empty());
    assert_eq!(cr.spec.for_provider.access_level, Some(40));
    assert_eq!(cr.status.as_ref().unwrap().at_provider.active, Some(true));
}

#[tokio::test]
async fn token_kinds_need_a_connection_secret() {
    let mock = MockGitLabClient::new();
    let external = AccessTokenExternal::new(mock.clone(), context(MemorySecrets::default()));
    let err = external.create(&mut access_token(ResourceSpec::default())).await.unwrap_err();
    assert!(matches!(err, ControllerError::MissingIdentifier("writeConnectionSecretToRef")));

    let external = DeployTokenExternal::new(mock.clone(), context(MemorySecrets::default()));
    let err = external.create(&mut deploy_token(ResourceSpec::default())).await.unwrap_err();
    assert!(matches!(err, ControllerError::MissingIdentifier("writeConnectionSecretToRef")));

    let external = RunnerExternal::new(mock.clone(), context(MemorySecrets::default()));
    let mut runner = instance_runner(ResourceSpec::default());
    let err = external.create(&mut runner).await.unwrap_err();
    assert!(matches!(err, ControllerError::MissingIdentifier("writeConnectionSecretToRef")));
    assert_eq!(runner.external_name(), "");

    external.create(&mut instance_runner(with_secret())).await.unwrap();
    assert_eq!(mock.operations(), vec!["create_user_runner".to_string()]);
}

#[tokio::test]
async fn revoked_access_token_is_gone() {
    let mock = MockGitLabClient::new();
    let external = AccessTokenExternal::new(mock.clone(), context(MemorySecrets::default()));
    let mut cr = access_token(with_secret());
    external.create(&mut cr).await.unwrap();

    external.delete(&mut cr).await.unwrap();
    assert_eq!(mock.operations().last().map(String::as_str), Some("revoke_project_access_token"));
    assert!(!external.observe(&mut cr).await.unwrap().resource_exists);
}

#[tokio::test]
async fn deploy_token_emits_username_and_token() {
    let mock = MockGitLabClient::new();
    let external = DeployTokenExternal::new(mock.clone(), context(MemorySecrets::default()));
    let mut cr = deploy_token(with_secret());

    let creation = external.create(&mut cr).await.unwrap();
    let details = creation.connection_details;
    assert_eq!(details["token"], b"gldt-mock1001".to_vec());
    assert_eq!(details["username"], b"gitlab+deploy-token-1001".to_vec());

    let observation = external.observe(&mut cr).await.unwrap();
    assert!(observation.resource_late_initialized);
    assert!(observation.connection_details.is_empty());
    assert_eq!(
        cr.spec.for_provider.username.as_deref(),
        Some("gitlab+deploy-token-1001")
    );

    // no update API; update never calls GitLab
    let calls = mock.calls().len();
    external.update(&mut cr).await.unwrap();
    assert_eq!(mock.calls().len(), calls);
}

#[test]
fn deploy_token_expiry_is_preserved() {
    let previous = DeployTokenObservation {
        expires_at: Some("2027-06-01T00:00:00Z".to_string()),
        ..Default::default()
    };
    let remote = RemoteDeployToken {
        id: 3,
        username: "bot".to_string(),
        ..Default::default()
    };
    let observed = deploy_token::observation(&previous, &remote);
    assert_eq!(observed.expires_at.as_deref(), Some("2027-06-01T00:00:00Z"));
    assert_eq!(observed.revoked, Some(false));
}
