use crate::config::MicrophoneConfig;
use crate::error::GatewayError;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Boundary to the platform's media permission prompt.
///
/// Resolves when access is granted and fails with
/// [`GatewayError::PermissionDenied`] otherwise. Partial grants are not
/// modelled.
#[async_trait]
pub trait MicrophoneAccess: Send + Sync {
    async fn request_access(&self) -> Result<(), GatewayError>;
}

/// Grants or denies microphone access according to configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredMicrophoneAccess {
    allowed: bool,
}

impl ConfiguredMicrophoneAccess {
    pub fn new(config: &MicrophoneConfig) -> Self {
        Self {
            allowed: config.allowed,
        }
    }
}

#[async_trait]
impl MicrophoneAccess for ConfiguredMicrophoneAccess {
    async fn request_access(&self) -> Result<(), GatewayError> {
        if self.allowed {
            debug!("microphone access granted by configuration");
            Ok(())
        } else {
            warn!("microphone access denied by configuration");
            Err(GatewayError::PermissionDenied)
        }
    }
}
