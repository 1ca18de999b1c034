//! Project-scoped kinds (`projects.gitlab.crossplane.io`)

pub mod access_token;
pub mod approval_rule;
pub mod deploy_token;
pub mod hook;
pub mod member;
pub mod pipeline_schedule;
pub mod project;
pub mod protected_branch;
pub mod variable;

pub use access_token::*;
pub use approval_rule::*;
pub use deploy_token::*;
pub use hook::*;
pub use member::*;
pub use pipeline_schedule::*;
pub use project::*;
pub use protected_branch::*;
pub use variable::*;
