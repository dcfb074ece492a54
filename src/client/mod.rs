//! Minimal async client for the Resend HTTP API.
//!
//! Only the endpoints the provider's resources need are covered: API key
//! create/remove and domain create/get/remove. Authentication is a bearer
//! token taken from a [`SecretString`] that never leaves this module in
//! cleartext.

mod error;
mod types;

use std::time::Duration;

use reqwest::{RequestBuilder, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

pub use error::ClientError;
pub use types::{
    CreateApiKeyRequest, CreateApiKeyResponse, CreateDomainRequest, Domain, Permission, REGIONS,
};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for building a [`ResendClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.resend.com`.
    pub base_url: String,
    /// Timeout for each request.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Handle to the Resend API.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug)]
pub struct ResendClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl ResendClient {
    /// Build a client authenticating with `api_key`.
    pub fn new(api_key: SecretString, config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{}: not a base URL",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── API keys ────────────────────────────────────────────────────

    /// `POST /api-keys`
    pub async fn create_api_key(
        &self,
        request: &CreateApiKeyRequest,
    ) -> Result<CreateApiKeyResponse, ClientError> {
        debug!(name = %request.name, "Creating API key");
        let body = self
            .execute(self.http.post(self.endpoint(&["api-keys"])).json(request))
            .await?;
        parse(&body)
    }

    /// `DELETE /api-keys/{id}`
    pub async fn remove_api_key(&self, id: &str) -> Result<(), ClientError> {
        debug!(id, "Removing API key");
        self.execute(self.http.delete(self.endpoint(&["api-keys", id])))
            .await
            .map(drop)
    }

    // ── Domains ─────────────────────────────────────────────────────

    /// `POST /domains`
    pub async fn create_domain(&self, request: &CreateDomainRequest) -> Result<Domain, ClientError> {
        debug!(name = %request.name, region = ?request.region, "Creating domain");
        let body = self
            .execute(self.http.post(self.endpoint(&["domains"])).json(request))
            .await?;
        parse(&body)
    }

    /// `GET /domains/{id}`
    pub async fn get_domain(&self, id: &str) -> Result<Domain, ClientError> {
        debug!(id, "Fetching domain");
        let body = self
            .execute(self.http.get(self.endpoint(&["domains", id])))
            .await?;
        parse(&body)
    }

    /// `DELETE /domains/{id}`
    pub async fn remove_domain(&self, id: &str) -> Result<(), ClientError> {
        debug!(id, "Removing domain");
        self.execute(self.http.delete(self.endpoint(&["domains", id])))
            .await
            .map(drop)
    }

    // ── Transport ───────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send an authenticated request and return the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ClientError> {
        let response = request
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "Resend responded");

        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::from_response(status.as_u16(), &body))
        }
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Deserialization {
        message: e.to_string(),
        body: body.to_string(),
    })
}
