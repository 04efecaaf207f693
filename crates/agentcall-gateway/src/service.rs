use crate::client::{SessionCallbacks, SessionEvent, SessionHandle, VoiceClient};
use crate::config::{GatewayConfig, MicrophoneConfig};
use crate::credential::{Credential, CredentialSource, HttpCredentialSource};
use crate::error::GatewayError;
use crate::permission::{ConfiguredMicrophoneAccess, MicrophoneAccess};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Bridge between the call state machine and the permission, credential and
/// voice-client boundaries.
///
/// Every operation touches the outside world; none of them retries.
#[derive(Clone)]
pub struct SessionGateway {
    microphone: Arc<dyn MicrophoneAccess>,
    credentials: Arc<dyn CredentialSource>,
    client: Arc<dyn VoiceClient>,
}

impl SessionGateway {
    pub fn new(
        microphone: Arc<dyn MicrophoneAccess>,
        credentials: Arc<dyn CredentialSource>,
        client: Arc<dyn VoiceClient>,
    ) -> Self {
        Self {
            microphone,
            credentials,
            client,
        }
    }

    /// Builds a gateway backed by the HTTP credential endpoint and the
    /// configured microphone policy.
    pub fn from_config(
        gateway: &GatewayConfig,
        microphone: &MicrophoneConfig,
        client: Arc<dyn VoiceClient>,
    ) -> Result<Self, GatewayError> {
        let credentials = HttpCredentialSource::new(gateway)?;
        Ok(Self::new(
            Arc::new(ConfiguredMicrophoneAccess::new(microphone)),
            Arc::new(credentials),
            client,
        ))
    }

    pub async fn request_microphone_access(&self) -> Result<(), GatewayError> {
        self.microphone.request_access().await.inspect_err(|e| {
            warn!(error = %e, "microphone access was not granted");
        })
    }

    pub async fn fetch_session_credential(&self) -> Result<Credential, GatewayError> {
        self.credentials.fetch_credential().await.inspect_err(|e| {
            error!(error = %e, "failed to fetch session credential");
        })
    }

    /// Opens a voice session for `attempt` and routes its hooks into `sink`.
    ///
    /// The returned handle exists as soon as the client created the session;
    /// `SessionEvent::Connected` arrives later through the sink.
    pub async fn open_session<F>(
        &self,
        attempt: u64,
        credential: &Credential,
        sink: F,
    ) -> Result<SessionHandle, GatewayError>
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        let sink = Arc::new(sink);
        let callbacks = SessionCallbacks::new(
            {
                let sink = Arc::clone(&sink);
                move || (*sink)(SessionEvent::Connected)
            },
            {
                let sink = Arc::clone(&sink);
                move || (*sink)(SessionEvent::Disconnected)
            },
            {
                let sink = Arc::clone(&sink);
                move |message| (*sink)(SessionEvent::Error(message))
            },
            move |change| (*sink)(SessionEvent::ModeChanged(change.mode)),
        );

        let session = self
            .client
            .start_session(credential, callbacks)
            .await
            .map_err(|e| match e {
                GatewayError::SessionOpenFailed(_) => e,
                other => GatewayError::SessionOpenFailed(other.to_string()),
            })
            .inspect_err(|e| {
                error!(attempt, error = %e, "failed to open voice session");
            })?;

        info!(attempt, "voice session opened");
        Ok(SessionHandle::new(attempt, session))
    }

    /// Ends the session behind `handle`. The handle is consumed, so each
    /// session is closed at most once.
    pub async fn close_session(&self, handle: SessionHandle) -> Result<(), GatewayError> {
        let attempt = handle.attempt();
        handle
            .session
            .end_session()
            .await
            .map_err(|e| match e {
                GatewayError::SessionCloseFailed(_) => e,
                other => GatewayError::SessionCloseFailed(other.to_string()),
            })
            .inspect_err(|e| {
                warn!(attempt, error = %e, "voice session did not close cleanly");
            })?;

        info!(attempt, "voice session closed");
        Ok(())
    }
}

impl fmt::Debug for SessionGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGateway").finish_non_exhaustive()
    }
}
