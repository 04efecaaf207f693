use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_signed_url_path() -> String {
    "/api/signed-url".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_microphone_allowed() -> bool {
    true
}

/// Where and how the session credential is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Origin of the trusted backend that mints credentials.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the credential endpoint. Default: `/api/signed-url`.
    #[serde(default = "default_signed_url_path")]
    pub signed_url_path: String,
    /// Whole-request timeout for the credential fetch, in seconds. Default: 10.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            signed_url_path: default_signed_url_path(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Full URL of the credential endpoint.
    pub fn credential_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.signed_url_path.starts_with('/') {
            format!("{}{}", base, self.signed_url_path)
        } else {
            format!("{}/{}", base, self.signed_url_path)
        }
    }
}

/// Native-host stand-in for the browser's media permission prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrophoneConfig {
    #[serde(default = "default_microphone_allowed")]
    pub allowed: bool,
}

impl Default for MicrophoneConfig {
    fn default() -> Self {
        Self {
            allowed: default_microphone_allowed(),
        }
    }
}
