//! Group-scoped kinds
//!
//! Handles: Group, SamlGroupLink, LdapGroupLink

pub mod group;
pub mod ldap_group_link;
pub mod saml_group_link;

pub use group::GroupExternal;
pub use ldap_group_link::LdapGroupLinkExternal;
pub use saml_group_link::SamlGroupLinkExternal;

use crate::error::ControllerError;
use crate::reconcile_helpers::require_id;

/// Parent group of a group-scoped record
pub(crate) fn group_id(id: Option<i64>) -> Result<i64, ControllerError> {
    require_id(id, "GroupID")
}

#[cfg(test)]
mod group_test;
