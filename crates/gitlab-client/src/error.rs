//! GitLab client errors

use thiserror::Error;

/// Errors that can occur when interacting with the GitLab API
#[derive(Debug, Error)]
pub enum GitLabError {
    /// HTTP request/response error (connection refused, timeout, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GitLab API returned a non-success status
    #[error("{method} {path}: {status} {message}")]
    Api {
        method: &'static str,
        path: String,
        status: u16,
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (invalid token, expired, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("404 Not Found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GitLabError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitLabError::Api { status, .. } => Some(*status),
            GitLabError::NotFound(_) => Some(404),
            GitLabError::Authentication(_) => Some(401),
            GitLabError::Http(e) => e.status().map(|s| s.as_u16()),
            GitLabError::Serialization(_) | GitLabError::InvalidRequest(_) => None,
        }
    }

    /// Whether retrying the same request later may succeed.
    ///
    /// Network failures, 5xx, 409 (conflict) and 429 (rate limit) are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            GitLabError::Http(e) if e.status().is_none() => true,
            _ => matches!(self.status(), Some(409 | 429 | 500..=599)),
        }
    }

    /// Whether the error is a write conflict reported by the server.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Classifies an error as "remote object does not exist".
///
/// True when the response status is 404. Errors without a status fall back to
/// matching the "404 Not Found" text some GitLab versions put in the body.
pub fn is_not_found(err: &GitLabError) -> bool {
    match err.status() {
        Some(status) => status == 404,
        None => err.to_string().contains("404 Not Found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> GitLabError {
        GitLabError::Api {
            method: "GET",
            path: "/projects/1".to_string(),
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_not_found_by_status() {
        assert!(is_not_found(&api(404)));
        assert!(is_not_found(&GitLabError::NotFound("/projects/1".to_string())));
        assert!(!is_not_found(&api(403)));
        assert!(!is_not_found(&api(500)));
    }

    #[test]
    fn test_not_found_by_message_without_status() {
        let err = GitLabError::InvalidRequest("{message: 404 Not Found}".to_string());
        assert!(is_not_found(&err));
        let err = GitLabError::InvalidRequest("name has already been taken".to_string());
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_transient_classification() {
        assert!(api(502).is_transient());
        assert!(api(409).is_transient());
        assert!(api(429).is_transient());
        assert!(!api(400).is_transient());
        assert!(!api(404).is_transient());
        assert!(api(409).is_conflict());
    }
}
