use super::variable::*;
use crate::error::ControllerError;
use crate::external::ExternalClient;
use crate::test_utils::{context, record, MemorySecrets};
use crds::{Managed, SecretKeySelector, Variable, VariableParameters, VariableSpec, VariableTypeValue};
use gitlab_client::{MockGitLabClient, ProjectVariable};
use serde_json::json;

fn variable(params: VariableParameters) -> Variable {
    record(Variable::new(
        "registry-password",
        VariableSpec {
            resource: Default::default(),
            for_provider: params,
        },
    ))
}

fn from_secret() -> VariableParameters {
    VariableParameters {
        project_id: Some(7),
        key: "K".to_string(),
        value_secret_ref: Some(SecretKeySelector {
            name: "S".to_string(),
            namespace: Some("N".to_string()),
            key: "v".to_string(),
        }),
        ..Default::default()
    }
}

fn secrets() -> MemorySecrets {
    MemorySecrets::default().with("N", "S", "v", "secret")
}

#[tokio::test]
async fn secret_value_is_masked_and_raw_by_default() {
    let mock = MockGitLabClient::new();
    let external = VariableExternal::new(mock.clone(), context(secrets()));
    let mut cr = variable(from_secret());

    external.create(&mut cr).await.unwrap();

    let body = &mock.calls_to("create_variable")[0].body;
    assert_eq!(body["key"], "K");
    assert_eq!(body["value"], "secret");
    assert_eq!(body["masked"], true);
    assert_eq!(body["raw"], true);
    assert_eq!(cr.external_name(), "K");
}

#[tokio::test]
async fn update_keeps_secret_defaults_and_explicit_flags() {
    let mock = MockGitLabClient::new();
    mock.add_variable(
        7,
        ProjectVariable {
            key: "K".to_string(),
            value: "stale".to_string(),
            variable_type: "env_var".to_string(),
            environment_scope: "*".to_string(),
            ..Default::default()
        },
    );
    let external = VariableExternal::new(mock.clone(), context(secrets()));
    let mut cr = variable(VariableParameters {
        raw: Some(false),
        ..from_secret()
    });
    cr.set_external_name("K");

    let observation = external.observe(&mut cr).await.unwrap();
    assert!(observation.resource_exists);
    assert!(!observation.resource_up_to_date);

    external.update(&mut cr).await.unwrap();
    let body = &mock.calls_to("update_variable")[0].body;
    assert_eq!(body["value"], "secret");
    assert_eq!(body["raw"], false);
    let stored = mock.variable(7, "K").unwrap();
    assert_eq!(stored.value, "secret");
    assert!(!stored.raw);
}

#[tokio::test]
async fn inline_value_round_trip() {
    let mock = MockGitLabClient::new();
    let external = VariableExternal::new(mock.clone(), context(MemorySecrets::default()));
    let mut cr = variable(VariableParameters {
        project_id: Some(7),
        key: "DEPLOY_ENV".to_string(),
        value: Some("staging".to_string()),
        variable_type: Some(VariableTypeValue::EnvVar),
        ..Default::default()
    });

    assert!(!external.observe(&mut cr).await.unwrap().resource_exists);
    assert!(mock.operations().is_empty());

    external.create(&mut cr).await.unwrap();
    let body = &mock.calls_to("create_variable")[0].body;
    assert!(body.get("masked").is_none());

    let observation = external.observe(&mut cr).await.unwrap();
    assert!(observation.resource_up_to_date);
    assert!(observation.resource_late_initialized);
    assert_eq!(cr.spec.for_provider.environment_scope.as_deref(), Some("*"));
    assert_eq!(cr.spec.for_provider.masked, Some(false));

    cr.spec.for_provider.value = Some("production".to_string());
    assert!(!external.observe(&mut cr).await.unwrap().resource_up_to_date);
}

#[tokio::test]
async fn scope_is_passed_to_get_and_remove() {
    let mock = MockGitLabClient::new();
    let external = VariableExternal::new(mock.clone(), context(MemorySecrets::default()));
    let mut cr = variable(VariableParameters {
        project_id: Some(7),
        key: "TOKEN".to_string(),
        value: Some("x".to_string()),
        environment_scope: Some("production".to_string()),
        ..Default::default()
    });
    external.create(&mut cr).await.unwrap();
    external.observe(&mut cr).await.unwrap();
    external.delete(&mut cr).await.unwrap();

    assert_eq!(
        mock.calls_to("get_variable")[0].body,
        json!({ "pid": 7, "key": "TOKEN", "scope": "production" })
    );
    assert_eq!(mock.calls_to("remove_variable")[0].body["scope"], "production");
    assert!(!external.observe(&mut cr).await.unwrap().resource_exists);
    // already gone
    external.delete(&mut cr).await.unwrap();
}

#[tokio::test]
async fn missing_secret_key_is_reported() {
    let mock = MockGitLabClient::new();
    let secrets = MemorySecrets::default().with("N", "S", "other", "x");
    let external = VariableExternal::new(mock.clone(), context(secrets));
    let err = external.create(&mut variable(from_secret())).await.unwrap_err();
    assert!(matches!(err, ControllerError::SecretKeyNotFound { .. }));
}

#[test]
fn flags_pass_through_without_secret() {
    let params = VariableParameters {
        key: "K".to_string(),
        masked: Some(true),
        ..Default::default()
    };
    let opts = create_options(&params, "v".to_string());
    assert_eq!(opts.masked, Some(true));
    assert_eq!(opts.raw, None);
}
