use std::env;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::repository::{
    CatalogRepository, CourseProgressRepository, ProfileRepository, Remote, RemoteError,
    WatchSessionRepository,
};

mod catalog_repo;
mod mapping;
mod profile_repo;
mod progress_repo;
mod session_repo;

/// Connection settings for the managed backend's table API.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    pub access_token: Option<String>,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Attach a per-learner access token; row-level security on the backend
    /// scopes reads/writes to that learner.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Read the connection settings from `ABNP_API_URL`, `ABNP_API_KEY`
    /// and (optionally) `ABNP_ACCESS_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("ABNP_API_URL").ok()?;
        let api_key = env::var("ABNP_API_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        let mut config = Self::new(base_url, api_key);
        if let Ok(token) = env::var("ABNP_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                config.access_token = Some(token);
            }
        }
        Some(config)
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PostgrestInitError {
    #[error("invalid api key: {0}")]
    InvalidApiKey(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Table-API client for the Remote Data Service.
///
/// One instance implements every repository trait; rows are exchanged as
/// JSON and mapped into validated domain types at the boundary.
#[derive(Clone)]
pub struct PostgrestRepository {
    http: Client,
    base_url: String,
}

impl PostgrestRepository {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `PostgrestInitError` if the api key is not a valid header
    /// value or the HTTP client cannot be constructed.
    pub fn connect(config: &RemoteConfig) -> Result<Self, PostgrestInitError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| PostgrestInitError::InvalidApiKey(e.to_string()))?;
        headers.insert("apikey", key);

        let bearer = config.access_token.as_deref().unwrap_or(&config.api_key);
        let auth = HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|e| PostgrestInitError::InvalidApiKey(e.to_string()))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    pub(crate) fn get(&self, table: &str) -> RequestBuilder {
        self.http.get(self.table_url(table))
    }

    pub(crate) fn post(&self, table: &str) -> RequestBuilder {
        self.http.post(self.table_url(table))
    }

    pub(crate) fn patch(&self, table: &str) -> RequestBuilder {
        self.http.patch(self.table_url(table))
    }

    /// Send a request and decode the JSON row set.
    pub(crate) async fn fetch_rows<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<Vec<T>, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let response = check_status(response)?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RemoteError::Serialization(e.to_string()))
    }

    /// Send a write and discard the body.
    pub(crate) async fn execute(request: RequestBuilder) -> Result<(), RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response, RemoteError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::Unauthorized),
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound),
        status => Err(RemoteError::Connection(format!(
            "unexpected status {status}"
        ))),
    }
}

impl Remote {
    /// Build a `Remote` backed by the managed backend's table API.
    ///
    /// # Errors
    ///
    /// Returns `PostgrestInitError` if the client cannot be constructed.
    pub fn postgrest(config: &RemoteConfig) -> Result<Self, PostgrestInitError> {
        let repo = PostgrestRepository::connect(config)?;
        let sessions: Arc<dyn WatchSessionRepository> = Arc::new(repo.clone());
        let catalog: Arc<dyn CatalogRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo.clone());
        let course_progress: Arc<dyn CourseProgressRepository> = Arc::new(repo);
        Ok(Self {
            sessions,
            catalog,
            profiles,
            course_progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgrestRepository>();
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let repo =
            PostgrestRepository::connect(&RemoteConfig::new("https://api.example.com/", "key"))
                .unwrap();
        assert_eq!(
            repo.table_url("video_sessions"),
            "https://api.example.com/rest/v1/video_sessions"
        );
    }
}
