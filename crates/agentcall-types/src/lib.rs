//! Shared types for the agentcall workspace.
//!
//! This crate holds the vocabulary every other crate speaks: the call status
//! codes, the remote agent's audio mode, the user-visible alert kinds, and the
//! read-only [`CallSnapshot`] handed to the presentation layer.
//!
//! Nothing here performs I/O. The gateway and session crates depend on
//! `agentcall-types` and on nothing else inside the workspace for shared
//! definitions, which keeps the dependency graph a straight line.

use serde::{Deserialize, Serialize};

pub mod snapshot;

pub use snapshot::{format_duration, CallSnapshot, Screen, StatusBanner};

/// Canonical status of the call session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// The controller has been shut down; no call can arrive.
    Idle,
    /// A call is ringing (initial state and the state after every teardown).
    Incoming,
    /// The user accepted and the voice session is being negotiated.
    Connecting,
    /// The voice session reported that it is connected.
    Connected,
}

impl CallStatus {
    /// Returns the canonical string label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Incoming => "incoming",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the remote agent is currently doing with audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// The agent is emitting audio.
    Speaking,
    /// The agent is waiting for the user to talk.
    Listening,
}

impl AgentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Speaking => "speaking",
            Self::Listening => "listening",
        }
    }

    pub fn is_speaking(self) -> bool {
        matches!(self, Self::Speaking)
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentMode {
    type Err = ParseAgentModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speaking" => Ok(Self::Speaking),
            "listening" => Ok(Self::Listening),
            _ => Err(ParseAgentModeError(s.to_string())),
        }
    }
}

/// Error returned when a voice client reports a mode we do not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown agent mode: {0}")]
pub struct ParseAgentModeError(pub String);

/// Payload of the voice client's mode-change hook: `{ "mode": "speaking" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeChange {
    pub mode: AgentMode,
}

/// User-visible notifications raised by the call flow.
///
/// Each kind maps to one blocking dialog in the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The microphone permission was declined while accepting a call.
    MicrophonePermissionRequired,
    /// Credential fetch, session open, or the live session failed.
    ConnectionError,
}

impl AlertKind {
    /// Returns the message shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            Self::MicrophonePermissionRequired => "Microphone permission is required",
            Self::ConnectionError => "An error occurred while connecting the call",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
