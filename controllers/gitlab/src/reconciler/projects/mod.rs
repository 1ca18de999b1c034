//! Project-scoped kinds
//!
//! Handles: Project, Hook, Variable, Member, DeployToken, AccessToken,
//! ApprovalRule, ProtectedBranch, PipelineSchedule

pub mod access_token;
pub mod approval_rule;
pub mod deploy_token;
pub mod hook;
pub mod member;
pub mod pipeline_schedule;
pub mod project;
pub mod protected_branch;
pub mod variable;

pub use access_token::AccessTokenExternal;
pub use approval_rule::ApprovalRuleExternal;
pub use deploy_token::DeployTokenExternal;
pub use hook::HookExternal;
pub use member::MemberExternal;
pub use pipeline_schedule::PipelineScheduleExternal;
pub use project::ProjectExternal;
pub use protected_branch::ProtectedBranchExternal;
pub use variable::VariableExternal;

use crate::error::ControllerError;
use crate::reconcile_helpers::require_id;

/// Parent project of a project-scoped record
pub(crate) fn project_id(id: Option<i64>) -> Result<i64, ControllerError> {
    require_id(id, "ProjectID")
}

#[cfg(test)]
mod pipeline_schedule_test;
#[cfg(test)]
mod project_test;
#[cfg(test)]
mod protected_branch_test;
#[cfg(test)]
mod tokens_test;
#[cfg(test)]
mod variable_test;
