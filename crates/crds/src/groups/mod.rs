//! Group-scoped kinds (`groups.gitlab.crossplane.io`)

pub mod group;
pub mod ldap_group_link;
pub mod saml_group_link;

pub use group::*;
pub use ldap_group_link::*;
pub use saml_group_link::*;
