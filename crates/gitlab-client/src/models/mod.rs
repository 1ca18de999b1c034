//! GitLab API data models
//!
//! Response types mirror the JSON returned by GitLab REST v4. Request option
//! types serialize only the fields that are set, so an unset field never
//! overwrites server-side state.

pub mod groups;
pub mod projects;
pub mod runners;

pub use groups::*;
pub use projects::*;
pub use runners::*;

use serde::{Deserialize, Serialize};

/// Minimal user representation embedded in other responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicUser {
    pub id: i64,
    pub username: String,
    pub name: String,
}

/// Minimal group representation embedded in other responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicGroup {
    pub id: i64,
    pub name: String,
    pub full_path: String,
}
