//! ApprovalRule external client and transformers
//!
//! The external-name is the numeric rule ID. User, group and protected-branch
//! lists compare as multisets; an unset list matches anything.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{
    equal_if_set, late_init, late_init_non_empty, list_equal_if_set, parse_external_id, require_external_id,
};
use crate::reconciler::projects::project_id;
use crate::reconciler::{deleted, failed, found};
use async_trait::async_trait;
use crds::{ApprovalRule, ApprovalRuleObservation, ApprovalRuleParameters, Condition, Managed};
use gitlab_client::{ApprovalRule as RemoteApprovalRule, ApprovalRuleOptions, ApprovalRulesApi};

const KIND: &str = "ApprovalRule";

pub fn rule_options(p: &ApprovalRuleParameters) -> ApprovalRuleOptions {
    ApprovalRuleOptions {
        name: Some(p.name.clone()),
        approvals_required: Some(p.approvals_required),
        rule_type: p.rule_type.clone(),
        user_ids: p.user_ids.clone(),
        group_ids: p.group_ids.clone(),
        protected_branch_ids: p.protected_branch_ids.clone(),
        usernames: p.usernames.clone(),
        applies_to_all_protected_branches: p.applies_to_all_protected_branches,
    }
}

pub fn late_initialize(p: &mut ApprovalRuleParameters, r: &RemoteApprovalRule) {
    late_init_non_empty(&mut p.rule_type, &r.rule_type);
    late_init(&mut p.applies_to_all_protected_branches, r.applies_to_all_protected_branches);
}

/// Approvers may be named by ID, by username or both; together they make up `users`
fn users_match(p: &ApprovalRuleParameters, r: &RemoteApprovalRule) -> bool {
    if p.usernames.is_none() {
        let ids: Vec<i64> = r.users.iter().map(|u| u.id).collect();
        return list_equal_if_set(&p.user_ids, &ids);
    }
    let by_id = p.user_ids.as_deref().unwrap_or_default();
    let by_name = p.usernames.as_deref().unwrap_or_default();
    by_id.len() + by_name.len() == r.users.len()
        && by_id.iter().all(|id| r.users.iter().any(|u| u.id == *id))
        && by_name.iter().all(|name| r.users.iter().any(|u| &u.username == name))
}

pub fn is_up_to_date(p: &ApprovalRuleParameters, r: &RemoteApprovalRule) -> bool {
    let group_ids: Vec<i64> = r.groups.iter().map(|g| g.id).collect();
    let branch_ids: Vec<i64> = r.protected_branches.iter().map(|b| b.id).collect();
    p.name == r.name
        && p.approvals_required == r.approvals_required
        && equal_if_set(&p.rule_type, &r.rule_type)
        && users_match(p, r)
        && list_equal_if_set(&p.group_ids, &group_ids)
        && list_equal_if_set(&p.protected_branch_ids, &branch_ids)
        && equal_if_set(&p.applies_to_all_protected_branches, &r.applies_to_all_protected_branches)
}

pub fn observation(r: &RemoteApprovalRule) -> ApprovalRuleObservation {
    ApprovalRuleObservation {
        id: Some(r.id),
        rule_type: Some(r.rule_type.clone()),
        eligible_approver_ids: r.eligible_approvers.iter().map(|u| u.id).collect(),
        contains_hidden_groups: Some(r.contains_hidden_groups),
    }
}

/// External client for `ApprovalRule`
pub struct ApprovalRuleExternal<C> {
    client: C,
}

impl<C: ApprovalRulesApi> ApprovalRuleExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ApprovalRulesApi + 'static> ExternalClient<ApprovalRule> for ApprovalRuleExternal<C> {
    async fn observe(&self, cr: &mut ApprovalRule) -> Result<ExternalObservation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(ExternalObservation::absent());
        };
        let Some(remote) = found(self.client.get_project_approval_rule(pid, id).await, KIND)? else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = is_up_to_date(&cr.spec.for_provider, &remote);
        let snapshot = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &remote);
        cr.status.get_or_insert_with(Default::default).at_provider = observation(&remote);
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            resource_late_initialized: snapshot != cr.spec.for_provider,
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut ApprovalRule) -> Result<ExternalCreation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let rule = self
            .client
            .create_project_approval_rule(pid, &rule_options(&cr.spec.for_provider))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(rule.id.to_string());
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut ApprovalRule) -> Result<ExternalUpdate, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let id = require_external_id(cr.external_name())?;
        self.client
            .update_project_approval_rule(pid, id, &rule_options(&cr.spec.for_provider))
            .await
            .map_err(failed("update", KIND))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut ApprovalRule) -> Result<(), ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let id = require_external_id(cr.external_name())?;
        deleted(self.client.delete_project_approval_rule(pid, id).await, KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context, record, MemorySecrets};
    use crds::ApprovalRuleSpec;
    use gitlab_client::{BasicUser, MockGitLabClient};

    fn rule(project_id: i64) -> ApprovalRule {
        record(ApprovalRule::new(
            "security-review",
            ApprovalRuleSpec {
                resource: Default::default(),
                for_provider: ApprovalRuleParameters {
                    project_id: Some(project_id),
                    name: "n".to_string(),
                    approvals_required: 1,
                    ..Default::default()
                },
            },
        ))
    }

    fn external(mock: &MockGitLabClient) -> ApprovalRuleExternal<MockGitLabClient> {
        ApprovalRuleExternal::new(mock.clone(), context(MemorySecrets::default()))
    }

    #[tokio::test]
    async fn missing_rule_is_absent() {
        let mock = MockGitLabClient::new();
        let mut cr = rule(0);

        let observation = external(&mock).observe(&mut cr).await.unwrap();
        assert!(!observation.resource_exists);
        assert!(mock.calls().is_empty());

        cr.set_external_name("1");
        mock.fail_next("get_project_approval_rule", 404, "404 Not Found");
        let observation = external(&mock).observe(&mut cr).await.unwrap();
        assert!(!observation.resource_exists);
    }

    #[tokio::test]
    async fn user_ids_compare_as_multiset() {
        let mock = MockGitLabClient::new();
        let mut cr = rule(4);
        cr.spec.for_provider.user_ids = Some(vec![3, 2]);
        external(&mock).create(&mut cr).await.unwrap();

        cr.spec.for_provider.user_ids = Some(vec![2, 3]);
        let observation = external(&mock).observe(&mut cr).await.unwrap();
        assert!(observation.resource_up_to_date);
        assert_eq!(cr.status.as_ref().unwrap().at_provider.eligible_approver_ids, vec![3, 2]);
        assert_eq!(cr.spec.for_provider.rule_type.as_deref(), Some("regular"));

        cr.spec.for_provider.user_ids = Some(vec![2]);
        assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
        external(&mock).update(&mut cr).await.unwrap();
        assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
    }

    #[test]
    fn usernames_count_toward_users() {
        let p = ApprovalRuleParameters {
            name: "n".to_string(),
            approvals_required: 1,
            user_ids: Some(vec![3]),
            usernames: Some(vec!["bob".to_string()]),
            ..Default::default()
        };
        let user = |id: i64, username: &str| BasicUser {
            id,
            username: username.to_string(),
            name: username.to_string(),
        };
        let mut r = RemoteApprovalRule {
            name: "n".to_string(),
            approvals_required: 1,
            users: vec![user(3, "alice"), user(8, "bob")],
            ..Default::default()
        };
        assert!(is_up_to_date(&p, &r));

        r.users.push(user(9, "carol"));
        assert!(!is_up_to_date(&p, &r));
    }
}
