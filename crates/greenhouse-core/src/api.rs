//! HTTP client for the greenhouse backend REST API.
//!
//! The backend contract is consumed, not owned: authentication,
//! sensor snapshots, history ranges, and threshold settings are all
//! served over JSON. Every protected call carries
//! `Authorization: Bearer <token>`.
//!
//! The [`SensorApi`] trait abstracts the backend so the coordinator,
//! history engine, and settings sync can run against either the real
//! [`ApiClient`] or [`crate::mock::MockApi`] in tests.
//!
//! # Example
//!
//! ```no_run
//! use greenhouse_core::api::{ApiClient, SensorApi};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new("http://localhost:8000")?;
//! let session = client.login("admin", "secret").await?;
//! let snapshot = client.latest_snapshot(&session.access_token).await?;
//! println!("temp: {:?}", snapshot.and_then(|s| s.temp));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use greenhouse_types::{HistoryPoint, SensorSnapshot, ThresholdConfig};

use crate::error::{Error, Result};

/// Response to a successful credential exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque bearer token for subsequent calls.
    pub access_token: String,
    /// Whether this account still has its initial password. Frontends
    /// route first logins to the change-password flow.
    #[serde(default)]
    pub is_first_login: bool,
}

/// Backend operations consumed by the engine.
///
/// Tokens are passed per call: the session store owns the token and
/// every other component treats it as read-only input.
#[async_trait]
pub trait SensorApi: Send + Sync {
    /// Exchange credentials for a session token.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse>;

    /// Change the authenticated user's password.
    async fn change_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<()>;

    /// Invalidate the session server-side. Best-effort: callers clear
    /// local state regardless of the outcome.
    async fn logout(&self, token: &str) -> Result<()>;

    /// The most recent sensor snapshot, or `None` when the backend has
    /// no readings yet.
    async fn latest_snapshot(&self, token: &str) -> Result<Option<SensorSnapshot>>;

    /// Ordered readings within the closed interval `[from, to]`.
    async fn history(
        &self,
        token: &str,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<HistoryPoint>>;

    /// The active threshold configuration.
    async fn settings(&self, token: &str) -> Result<ThresholdConfig>;

    /// Replace the active threshold configuration.
    async fn save_settings(&self, token: &str, config: &ThresholdConfig) -> Result<()>;
}

/// HTTP client for the greenhouse backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend base URL (e.g. "http://localhost:8000")
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(Error::Http)?;
        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        // Normalize URL (remove trailing slash)
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::invalid_url(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            response.json().await.map_err(Error::Http)
        } else {
            Err(Self::response_error(response).await)
        }
    }

    async fn check_response(&self, response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(response).await)
        }
    }

    async fn response_error(response: reqwest::Response) -> Error {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Unauthorized;
        }

        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| status.to_string());

        Error::api(status.as_u16(), message)
    }
}

#[async_trait]
impl SensorApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let url = format!("{}/auth/token", self.base_url);
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });
        let response = self.client.post(&url).json(&body).send().await?;
        self.handle_response(response).await
    }

    async fn change_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        let url = format!("{}/auth/change-password", self.base_url);
        let body = serde_json::json!({
            "new_password": new_password,
            "confirm_password": confirm_password,
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        self.check_response(response).await
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let url = format!("{}/logout", self.base_url);
        let response = self.client.post(&url).bearer_auth(token).send().await?;
        self.check_response(response).await
    }

    async fn latest_snapshot(&self, token: &str) -> Result<Option<SensorSnapshot>> {
        let url = format!("{}/sensors/", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        // The backend returns readings newest-first; the first element
        // is the live snapshot.
        let readings: Vec<SensorSnapshot> = self.handle_response(response).await?;
        Ok(readings.into_iter().next())
    }

    async fn history(
        &self,
        token: &str,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<HistoryPoint>> {
        let url = format!("{}/sensors/history", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("from", from.format(&Rfc3339)?), ("to", to.format(&Rfc3339)?)])
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn settings(&self, token: &str) -> Result<ThresholdConfig> {
        let url = format!("{}/settings", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        self.handle_response(response).await
    }

    async fn save_settings(&self, token: &str, config: &ThresholdConfig) -> Result<()> {
        let url = format!("{}/settings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(config)
            .send()
            .await?;
        self.check_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new("http://localhost:8000");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_rejects_bare_host() {
        let result = ApiClient::new("localhost:8000");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_login_response_first_login_defaults_false() {
        let json = r#"{"access_token": "abc123"}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "abc123");
        assert!(!response.is_first_login);
    }
}
