//! Common utilities for GitLab API client
//!
//! Provides the authenticated HTTP wrapper shared by every service.

use crate::error::GitLabError;
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the access token is presented to GitLab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMethod {
    /// `PRIVATE-TOKEN` header (personal, project and group access tokens)
    #[default]
    PrivateToken,
    /// `Authorization: Bearer` header (OAuth2 tokens)
    Bearer,
}

/// HTTP client wrapper with authentication
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
    auth: AuthMethod,
}

impl HttpClient {
    /// Create a new HTTP client wrapper.
    ///
    /// `base_url` may or may not carry the `/api/v4` suffix.
    pub fn new(client: Client, base_url: String, token: String, auth: AuthMethod) -> Self {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = if trimmed.ends_with("/api/v4") {
            trimmed.to_string()
        } else {
            format!("{trimmed}/api/v4")
        };
        Self {
            client,
            base_url,
            token,
            auth,
        }
    }

    /// Get the base URL (always ends with `/api/v4`)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, self.build_url(path))
            .header("Accept", "application/json");
        match self.auth {
            AuthMethod::PrivateToken => builder.header("PRIVATE-TOKEN", &self.token),
            AuthMethod::Bearer => builder.bearer_auth(&self.token),
        }
    }

    async fn check(
        method: &'static str,
        path: &str,
        response: Response,
    ) -> Result<Response, GitLabError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            404 => Err(GitLabError::NotFound(format!("{method} {path} - {body}"))),
            401 => Err(GitLabError::Authentication(format!("{method} {path} - {body}"))),
            code => Err(GitLabError::Api {
                method,
                path: path.to_string(),
                status: code,
                message: body,
            }),
        }
    }

    /// Make a GET request
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, GitLabError> {
        debug!("GET {}", path);
        let response = self.request(Method::GET, path).send().await?;
        let response = Self::check("GET", path, response).await?;
        response.json().await.map_err(GitLabError::Http)
    }

    /// Make a POST request with a JSON body
    pub async fn post<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitLabError> {
        debug!("POST {}", path);
        let response = self.request(Method::POST, path).json(body).send().await?;
        let response = Self::check("POST", path, response).await?;
        response.json().await.map_err(GitLabError::Http)
    }

    /// Make a PUT request with a JSON body
    pub async fn put<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitLabError> {
        debug!("PUT {}", path);
        let response = self.request(Method::PUT, path).json(body).send().await?;
        let response = Self::check("PUT", path, response).await?;
        response.json().await.map_err(GitLabError::Http)
    }

    /// Make a DELETE request, discarding any response body
    pub async fn delete(&self, path: &str) -> Result<(), GitLabError> {
        debug!("DELETE {}", path);
        let response = self.request(Method::DELETE, path).send().await?;
        Self::check("DELETE", path, response).await?;
        Ok(())
    }

    /// Build query string from filters, skipping empty values
    pub fn build_query_string(filters: &[(&str, &str)]) -> String {
        filters
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append a query string to a path when there is anything to append
    pub fn with_query(path: &str, filters: &[(&str, &str)]) -> String {
        let query = Self::build_query_string(filters);
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        }
    }
}

/// Encode a path segment (project path, branch name, variable key, ...)
pub fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
