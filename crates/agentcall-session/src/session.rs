//! The single mutable aggregate of a call.

use agentcall_gateway::SessionHandle;
use agentcall_types::{CallSnapshot, CallStatus};

/// Canonical call state, owned exclusively by the [`CallMachine`](crate::CallMachine).
///
/// Invariants:
/// - `duration_seconds` only grows while `status == Connected && answered`.
/// - `handle` is present only between a successful open and teardown.
/// - `answered` never goes back to `false` except through [`reset`](Self::reset).
#[derive(Debug)]
pub struct CallSession {
    pub(crate) status: CallStatus,
    pub(crate) answered: bool,
    pub(crate) speaking: bool,
    pub(crate) duration_seconds: u64,
    pub(crate) muted: bool,
    pub(crate) speaker_on: bool,
    pub(crate) keypad_open: bool,
    pub(crate) handle: Option<SessionHandle>,
}

impl CallSession {
    /// A ringing call, as on mount.
    pub fn new() -> Self {
        Self {
            status: CallStatus::Incoming,
            answered: false,
            speaking: false,
            duration_seconds: 0,
            muted: false,
            speaker_on: true,
            keypad_open: false,
            handle: None,
        }
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn answered(&self) -> bool {
        self.answered
    }

    pub fn speaking(&self) -> bool {
        self.speaking
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the duration counter should be running.
    pub fn is_ticking(&self) -> bool {
        self.status == CallStatus::Connected && self.answered
    }

    pub fn accept_offered(&self) -> bool {
        self.status == CallStatus::Incoming && !self.answered
    }

    /// Restores every field to its construction value and hands back the
    /// session handle, if one was held, so the caller can release it.
    #[must_use = "a returned handle must be closed or deliberately dropped"]
    pub(crate) fn reset(&mut self) -> Option<SessionHandle> {
        let handle = self.handle.take();
        *self = Self::new();
        handle
    }

    pub fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            status: self.status,
            answered: self.answered,
            speaking: self.speaking,
            duration_seconds: self.duration_seconds,
            muted: self.muted,
            speaker_on: self.speaker_on,
            keypad_open: self.keypad_open,
            has_session: self.handle.is_some(),
        }
    }
}

impl Default for CallSession {
    fn default() -> Self {
        Self::new()
    }
}
