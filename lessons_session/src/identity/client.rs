use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::config::{LESSONS_API_BASE_URL, LESSONS_IDENTITY_PATH, LESSONS_IDENTITY_TIMEOUT};

use super::errors::IdentityError;
use super::types::{IdentityPayload, UserRecord};

/// Remote identity service as seen by the session manager.
#[async_trait]
pub trait IdentityClient: Send + Sync + 'static {
    /// Fetch the canonical record of the user owning `token`.
    async fn fetch_current_identity(&self, token: &str) -> Result<UserRecord, IdentityError>;
}

/// reqwest-backed identity client talking to the lessons REST backend.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpIdentityClient {
    /// Build a client for `{base_url}{identity_path}`.
    ///
    /// The client settings:
    ///
    /// - `timeout`: bounds every identity request. A timeout surfaces as a
    ///   transient failure, so a slow backend never logs the user out.
    ///
    /// - `pool_idle_timeout`: 90 seconds, the reqwest default.
    ///
    /// - `pool_max_idle_per_host`: 32 idle connections kept per host.
    pub fn new(
        base_url: &str,
        identity_path: &str,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        let endpoint = Url::parse(&format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            identity_path.trim_start_matches('/')
        ))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| IdentityError::Config(e.to_string()))?;

        tracing::debug!("Identity endpoint: {}", endpoint);
        Ok(Self { client, endpoint })
    }

    /// Build a client from `LESSONS_API_BASE_URL`, `LESSONS_IDENTITY_PATH`
    /// and `LESSONS_IDENTITY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, IdentityError> {
        Self::new(
            LESSONS_API_BASE_URL.as_str(),
            LESSONS_IDENTITY_PATH.as_str(),
            *LESSONS_IDENTITY_TIMEOUT,
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn fetch_current_identity(&self, token: &str) -> Result<UserRecord, IdentityError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            reqwest::StatusCode::UNAUTHORIZED => {
                tracing::debug!("Identity endpoint rejected the credential");
                return Err(IdentityError::Unauthorized);
            }
            status => {
                tracing::warn!("Identity endpoint answered with status: {}", status);
                return Err(IdentityError::Transient(format!("HTTP status {status}")));
            }
        }

        let response_body = response.text().await?;
        let payload: IdentityPayload = serde_json::from_str(&response_body).map_err(|e| {
            IdentityError::Transient(format!("Failed to deserialize identity response: {e}"))
        })?;

        let user = UserRecord::from(payload);
        tracing::debug!("Fetched identity for user {}", user.id);
        Ok(user)
    }
}
