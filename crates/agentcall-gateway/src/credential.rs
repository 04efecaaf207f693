use crate::config::GatewayConfig;
use crate::error::GatewayError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Short-lived credential (a signed WebSocket URL) for one voice session.
///
/// It is a bearer secret, so `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

/// Source of one-time connection credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch_credential(&self) -> Result<Credential, GatewayError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlResponse {
    signed_url: String,
}

/// Fetches credentials from `GET {base_url}/api/signed-url`.
///
/// The endpoint answers `200 { "signedUrl": "..." }`. Anything else is a
/// [`GatewayError::CredentialFetchFailed`]; there is no retry.
#[derive(Debug, Clone)]
pub struct HttpCredentialSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCredentialSource {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        if config.request_timeout_seconds == 0 {
            return Err(GatewayError::Config(
                "request_timeout_seconds must be greater than zero".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.credential_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CredentialSource for HttpCredentialSource {
    async fn fetch_credential(&self) -> Result<Credential, GatewayError> {
        debug!(url = %self.url, "fetching session credential");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "credential request failed");
            GatewayError::CredentialFetchFailed(format!("request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "credential endpoint rejected request");
            return Err(GatewayError::CredentialFetchFailed(format!(
                "endpoint returned {}",
                status
            )));
        }

        let body: SignedUrlResponse = response.json().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "credential response was malformed");
            GatewayError::CredentialFetchFailed(format!("malformed response: {}", e))
        })?;

        if body.signed_url.trim().is_empty() {
            warn!(url = %self.url, "credential endpoint returned an empty signedUrl");
            return Err(GatewayError::CredentialFetchFailed(
                "malformed response: empty signedUrl".to_string(),
            ));
        }

        Ok(Credential(body.signed_url))
    }
}
