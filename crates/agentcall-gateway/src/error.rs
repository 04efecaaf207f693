use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("credential fetch failed: {0}")]
    CredentialFetchFailed(String),

    #[error("session open failed: {0}")]
    SessionOpenFailed(String),

    #[error("session close failed: {0}")]
    SessionCloseFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
