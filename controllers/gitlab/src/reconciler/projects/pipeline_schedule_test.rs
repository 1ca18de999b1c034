use super::pipeline_schedule::*;
use crate::external::ExternalClient;
use crate::test_utils::{context, record, MemorySecrets};
use crds::{
    Managed, PipelineSchedule, PipelineScheduleParameters, PipelineScheduleSpec, PipelineScheduleVariable,
    VariableTypeValue,
};
use gitlab_client::{MockGitLabClient, PipelineSchedule as RemotePipelineSchedule, PipelineVariable};

fn var(key: &str, value: &str) -> PipelineScheduleVariable {
    PipelineScheduleVariable {
        key: key.to_string(),
        value: value.to_string(),
        variable_type: None,
    }
}

fn remote_var(key: &str, value: &str) -> PipelineVariable {
    PipelineVariable {
        key: key.to_string(),
        value: value.to_string(),
        variable_type: "env_var".to_string(),
    }
}

fn schedule(variables: Option<Vec<PipelineScheduleVariable>>) -> PipelineSchedule {
    record(PipelineSchedule::new(
        "nightly",
        PipelineScheduleSpec {
            resource: Default::default(),
            for_provider: PipelineScheduleParameters {
                project_id: Some(21),
                description: "nightly build".to_string(),
                ref_name: "main".to_string(),
                cron: "0 2 * * *".to_string(),
                variables,
                ..Default::default()
            },
        },
    ))
}

fn external(mock: &MockGitLabClient) -> PipelineScheduleExternal<MockGitLabClient> {
    PipelineScheduleExternal::new(mock.clone(), context(MemorySecrets::default()))
}

#[tokio::test]
async fn create_adds_variables() {
    let mock = MockGitLabClient::new();
    let mut cr = schedule(Some(vec![var("TARGET", "prod"), var("DRY_RUN", "false")]));

    external(&mock).create(&mut cr).await.unwrap();
    assert_eq!(cr.external_name(), "1001");
    let stored = mock.pipeline_schedule(21, 1001).unwrap();
    assert_eq!(stored.variables.len(), 2);

    let observation = external(&mock).observe(&mut cr).await.unwrap();
    assert!(observation.resource_up_to_date);
    assert_eq!(cr.spec.for_provider.cron_timezone.as_deref(), Some("UTC"));
    let owner = cr.status.as_ref().unwrap().at_provider.owner.clone().unwrap();
    assert_eq!(owner.username, "root");
}

#[tokio::test]
async fn update_applies_create_update_delete_in_order() {
    let mock = MockGitLabClient::new();
    mock.add_pipeline_schedule(
        21,
        RemotePipelineSchedule {
            id: 5,
            description: "nightly build".to_string(),
            ref_name: "main".to_string(),
            cron: "0 2 * * *".to_string(),
            cron_timezone: "UTC".to_string(),
            active: true,
            variables: vec![remote_var("TARGET", "staging"), remote_var("OLD", "x")],
            ..Default::default()
        },
    );
    let mut cr = schedule(Some(vec![var("TARGET", "prod"), var("NEW", "y")]));
    cr.set_external_name("5");

    assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
    external(&mock).update(&mut cr).await.unwrap();

    let ops: Vec<String> = mock
        .operations()
        .into_iter()
        .filter(|op| op.contains("variable"))
        .collect();
    assert_eq!(
        ops,
        [
            "create_pipeline_schedule_variable",
            "edit_pipeline_schedule_variable",
            "delete_pipeline_schedule_variable",
        ]
    );
    let keys: Vec<String> = mock
        .pipeline_schedule(21, 5)
        .unwrap()
        .variables
        .into_iter()
        .map(|v| v.key)
        .collect();
    assert_eq!(keys, ["TARGET", "NEW"]);
    assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
}

#[tokio::test]
async fn unset_variables_leave_remote_alone() {
    let mock = MockGitLabClient::new();
    let mut cr = schedule(None);
    external(&mock).create(&mut cr).await.unwrap();
    mock.add_pipeline_schedule(
        21,
        RemotePipelineSchedule {
            variables: vec![remote_var("MANUAL", "1")],
            ..mock.pipeline_schedule(21, 1001).unwrap()
        },
    );

    assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
    cr.spec.for_provider.cron = "0 3 * * *".to_string();
    external(&mock).update(&mut cr).await.unwrap();
    assert_eq!(mock.pipeline_schedule(21, 1001).unwrap().variables.len(), 1);
}

#[test]
fn variable_type_is_compared_when_set() {
    let observed = [remote_var("A", "1")];
    let mut desired = [var("A", "1")];
    assert!(variable_changes(&desired, &observed).is_empty());

    desired[0].variable_type = Some(VariableTypeValue::File);
    let changes = variable_changes(&desired, &observed);
    assert_eq!(changes.update.len(), 1);
    assert!(changes.create.is_empty() && changes.delete.is_empty());
}
