//! GitLab REST API Client
//!
//! A Rust client library for the subset of the GitLab REST API v4 used by the
//! GitLab resource controller: projects and their hooks, variables, members,
//! tokens, approval rules, protected branches and pipeline schedules; groups
//! and their SAML/LDAP links; runners.
//!
//! # Example
//!
//! ```no_run
//! use gitlab_client::{AuthMethod, GitLabClient, ProjectsApi};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitLabClient::new(
//!     "https://gitlab.example.com".to_string(),
//!     "glpat-xxxxxxxx".to_string(),
//!     false,
//!     AuthMethod::PrivateToken,
//! )?;
//!
//! let project = client.get_project("my-group/my-project").await?;
//! println!("{} has ID {}", project.path_with_namespace, project.id);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Per-service traits**: each consumer depends only on the service it uses
//! - **Error classification**: `is_not_found`, `GitLabError::is_transient`
//! - **`test-util`**: in-memory `MockGitLabClient` with call recording and
//!   failure injection

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod gitlab_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::GitLabClient;
pub use common::{AuthMethod, HttpClient};
pub use error::{is_not_found, GitLabError};
pub use gitlab_trait::*;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::{MockCall, MockGitLabClient};
