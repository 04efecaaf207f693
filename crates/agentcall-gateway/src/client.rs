//! Boundary to the real-time voice client.
//!
//! The client is a black box that opens a session from a credential and
//! reports back through four hooks. The contract this crate relies on:
//!
//! - `on_connect` fires at most once per opened session.
//! - `on_mode_change` fires only between `on_connect` and `on_disconnect`.
//! - `on_disconnect` fires at most once and marks the session closed for good.

use crate::credential::Credential;
use crate::error::GatewayError;
use agentcall_types::{AgentMode, ModeChange};
use async_trait::async_trait;
use std::fmt;
use tracing::warn;

type Hook = Box<dyn Fn() + Send + Sync>;
type ErrorHook = Box<dyn Fn(String) + Send + Sync>;
type ModeHook = Box<dyn Fn(ModeChange) + Send + Sync>;

/// The four hooks registered with a voice session.
pub struct SessionCallbacks {
    on_connect: Hook,
    on_disconnect: Hook,
    on_error: ErrorHook,
    on_mode_change: ModeHook,
}

impl SessionCallbacks {
    pub fn new(
        on_connect: impl Fn() + Send + Sync + 'static,
        on_disconnect: impl Fn() + Send + Sync + 'static,
        on_error: impl Fn(String) + Send + Sync + 'static,
        on_mode_change: impl Fn(ModeChange) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_connect: Box::new(on_connect),
            on_disconnect: Box::new(on_disconnect),
            on_error: Box::new(on_error),
            on_mode_change: Box::new(on_mode_change),
        }
    }

    pub fn connected(&self) {
        (self.on_connect)()
    }

    pub fn disconnected(&self) {
        (self.on_disconnect)()
    }

    pub fn error(&self, message: impl Into<String>) {
        (self.on_error)(message.into())
    }

    pub fn mode_changed(&self, mode: AgentMode) {
        (self.on_mode_change)(ModeChange { mode })
    }

    /// Dispatches a raw `{"mode": "..."}` frame from the wire.
    ///
    /// Frames with an unknown mode are logged and dropped.
    pub fn mode_changed_raw(&self, payload: &str) {
        match serde_json::from_str::<ModeChange>(payload) {
            Ok(change) => (self.on_mode_change)(change),
            Err(e) => warn!(error = %e, "dropping unrecognised mode change payload"),
        }
    }
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks").finish_non_exhaustive()
    }
}

/// Factory for live voice sessions.
#[async_trait]
pub trait VoiceClient: Send + Sync {
    /// Creates a session. Success means the session object exists; the
    /// connection may still be negotiating until `on_connect` fires.
    async fn start_session(
        &self,
        credential: &Credential,
        callbacks: SessionCallbacks,
    ) -> Result<Box<dyn VoiceSession>, GatewayError>;
}

/// A live voice session created by a [`VoiceClient`].
///
/// `end_session` is not guaranteed to be idempotent by the client, so it
/// consumes the session.
#[async_trait]
pub trait VoiceSession: Send {
    async fn end_session(self: Box<Self>) -> Result<(), GatewayError>;
}

/// Callback-originated events, after translation by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    Error(String),
    ModeChanged(AgentMode),
}

/// Exclusive ownership of one open voice session.
///
/// Only [`SessionGateway::close_session`](crate::SessionGateway::close_session)
/// can end it, and doing so consumes the handle.
pub struct SessionHandle {
    attempt: u64,
    pub(crate) session: Box<dyn VoiceSession>,
}

impl SessionHandle {
    pub fn new(attempt: u64, session: Box<dyn VoiceSession>) -> Self {
        Self { attempt, session }
    }

    /// The call attempt this session was opened for.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}
