//! Transition logic of the call.
//!
//! [`CallMachine::handle`] is synchronous: it applies one event to the
//! [`CallSession`] and returns the side effects the runtime must perform.
//! Effects that complete later come back as new events tagged with the call
//! attempt that requested them. Each accept starts a new attempt; hang-up,
//! disconnect, failures and shutdown retire it, after which every event
//! tagged with it is stale.

use crate::event::{CallEvent, Effect};
use crate::session::CallSession;
use agentcall_gateway::{Credential, GatewayError, SessionEvent, SessionHandle};
use agentcall_types::{AgentMode, AlertKind, CallSnapshot, CallStatus};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Gateway work outstanding for the live attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Nothing,
    Microphone,
    Credential,
    Session,
}

#[derive(Debug)]
pub struct CallMachine {
    session: CallSession,
    live_attempt: Option<u64>,
    last_attempt: u64,
    pending: Pending,
    /// Attempt whose session the client closed before its handle arrived.
    disconnected_attempt: Option<u64>,
    error_grace: Duration,
    shut_down: bool,
}

impl CallMachine {
    /// Creates a machine with a ringing call.
    ///
    /// `error_grace` is how long a session may stay open after an error
    /// without a disconnect before it is torn down. Zero disables the timer.
    pub fn new(error_grace: Duration) -> Self {
        Self {
            session: CallSession::new(),
            live_attempt: None,
            last_attempt: 0,
            pending: Pending::Nothing,
            disconnected_attempt: None,
            error_grace,
            shut_down: false,
        }
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.session.snapshot()
    }

    /// The attempt currently in flight, if any.
    pub fn live_attempt(&self) -> Option<u64> {
        self.live_attempt
    }

    /// The attempt the duration timer should be counting for, if it should run.
    pub fn ticking_attempt(&self) -> Option<u64> {
        if self.session.is_ticking() {
            self.live_attempt
        } else {
            None
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn handle(&mut self, event: CallEvent) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            // Handles must be accounted for even after shutdown, otherwise
            // they would leak.
            CallEvent::SessionOpened { attempt, result } => {
                self.on_session_opened(attempt, result, &mut effects)
            }
            event if self.shut_down => debug!(?event, "ignoring event after shutdown"),
            CallEvent::AcceptCall => self.on_accept(&mut effects),
            CallEvent::HangUp => self.on_hang_up(&mut effects),
            CallEvent::ToggleMute => {
                if self.session.status == CallStatus::Connected {
                    self.session.muted = !self.session.muted;
                } else {
                    debug!(status = %self.session.status, "mute toggle ignored");
                }
            }
            CallEvent::ToggleSpeaker => {
                if self.session.status == CallStatus::Connected {
                    self.session.speaker_on = !self.session.speaker_on;
                } else {
                    debug!(status = %self.session.status, "speaker toggle ignored");
                }
            }
            CallEvent::ToggleKeypad => {
                self.session.keypad_open = !self.session.keypad_open;
            }
            CallEvent::Tick { attempt } => {
                if self.is_live(attempt) && self.session.is_ticking() {
                    self.session.duration_seconds += 1;
                } else {
                    debug!(attempt, "dropping stale duration tick");
                }
            }
            CallEvent::ErrorGraceElapsed { attempt } => {
                if self.is_live(attempt) {
                    warn!(
                        attempt,
                        "no disconnect followed the session error; tearing the call down"
                    );
                    self.teardown(&mut effects);
                }
            }
            CallEvent::MicrophoneResolved { attempt, result } => {
                if self.is_live(attempt) && self.pending == Pending::Microphone {
                    self.on_microphone(attempt, result, &mut effects);
                } else {
                    debug!(attempt, "ignoring stale microphone result");
                }
            }
            CallEvent::CredentialResolved { attempt, result } => {
                if self.is_live(attempt) && self.pending == Pending::Credential {
                    self.on_credential(attempt, result, &mut effects);
                } else {
                    debug!(attempt, "ignoring stale credential result");
                }
            }
            CallEvent::SessionClosed { attempt, result } => match result {
                Ok(()) => debug!(attempt, "session close completed"),
                Err(e) => warn!(attempt, error = %e, "session close failed"),
            },
            CallEvent::Session { attempt, event } => {
                if self.is_live(attempt) {
                    self.on_session_event(attempt, event, &mut effects);
                } else {
                    debug!(attempt, ?event, "ignoring callback from superseded session");
                }
            }
            CallEvent::Shutdown => {
                info!("call machine shutting down");
                self.teardown(&mut effects);
                self.session.status = CallStatus::Idle;
                self.shut_down = true;
            }
        }

        effects
    }

    fn is_live(&self, attempt: u64) -> bool {
        self.live_attempt == Some(attempt)
    }

    fn on_accept(&mut self, effects: &mut Vec<Effect>) {
        if !self.session.accept_offered() || self.pending != Pending::Nothing {
            debug!(
                status = %self.session.status,
                answered = self.session.answered,
                "accept ignored"
            );
            return;
        }

        self.last_attempt += 1;
        let attempt = self.last_attempt;
        self.live_attempt = Some(attempt);
        self.pending = Pending::Microphone;
        info!(attempt, "accepting call; requesting microphone access");
        effects.push(Effect::RequestMicrophone { attempt });
    }

    fn on_hang_up(&mut self, effects: &mut Vec<Effect>) {
        if self.live_attempt.is_none() && self.session.handle.is_none() {
            // Declining a ringing call touches nothing outside the machine.
            info!(status = %self.session.status, "call declined");
            drop(self.session.reset());
            return;
        }

        info!(
            attempt = ?self.live_attempt,
            status = %self.session.status,
            "hanging up"
        );
        self.teardown(effects);
    }

    fn on_microphone(
        &mut self,
        attempt: u64,
        result: Result<(), GatewayError>,
        effects: &mut Vec<Effect>,
    ) {
        match result {
            Ok(()) => {
                self.session.answered = true;
                self.session.status = CallStatus::Connecting;
                self.pending = Pending::Credential;
                effects.push(Effect::FetchCredential { attempt });
            }
            Err(e) => {
                warn!(attempt, error = %e, "accept aborted: microphone permission required");
                self.live_attempt = None;
                self.pending = Pending::Nothing;
                effects.push(Effect::Alert(AlertKind::MicrophonePermissionRequired));
            }
        }
    }

    fn on_credential(
        &mut self,
        attempt: u64,
        result: Result<Credential, GatewayError>,
        effects: &mut Vec<Effect>,
    ) {
        match result {
            Ok(credential) => {
                self.pending = Pending::Session;
                effects.push(Effect::OpenSession {
                    attempt,
                    credential,
                });
            }
            Err(e) => {
                error!(attempt, error = %e, "call attempt failed while fetching credential");
                self.teardown(effects);
                effects.push(Effect::Alert(AlertKind::ConnectionError));
            }
        }
    }

    fn on_session_opened(
        &mut self,
        attempt: u64,
        result: Result<SessionHandle, GatewayError>,
        effects: &mut Vec<Effect>,
    ) {
        if self.disconnected_attempt == Some(attempt) {
            // The client already closed this session; ending it again is not
            // guaranteed to be safe.
            self.disconnected_attempt = None;
            debug!(attempt, "releasing handle of a session the client already closed");
            drop(result);
            return;
        }

        if !self.is_live(attempt) || self.pending != Pending::Session || self.shut_down {
            match result {
                Ok(handle) => {
                    debug!(attempt, "closing session opened for a superseded attempt");
                    effects.push(Effect::CloseSession(handle));
                }
                Err(e) => debug!(attempt, error = %e, "ignoring stale session open failure"),
            }
            return;
        }

        match result {
            Ok(handle) => {
                debug!(attempt, "holding voice session handle");
                self.session.handle = Some(handle);
                self.pending = Pending::Nothing;
            }
            Err(e) => {
                error!(attempt, error = %e, "call attempt failed while opening session");
                self.teardown(effects);
                effects.push(Effect::Alert(AlertKind::ConnectionError));
            }
        }
    }

    fn on_session_event(&mut self, attempt: u64, event: SessionEvent, effects: &mut Vec<Effect>) {
        match event {
            SessionEvent::Connected => {
                if self.session.status == CallStatus::Connecting {
                    info!(attempt, "voice session connected");
                    self.session.status = CallStatus::Connected;
                    // The agent greets first.
                    self.session.speaking = true;
                } else {
                    debug!(attempt, status = %self.session.status, "duplicate connect ignored");
                }
            }
            SessionEvent::ModeChanged(mode) => {
                if self.session.status == CallStatus::Connected {
                    self.session.speaking = mode == AgentMode::Speaking;
                } else {
                    debug!(attempt, %mode, "mode change before connect ignored");
                }
            }
            SessionEvent::Error(message) => {
                error!(attempt, error = %message, "voice session reported an error");
                effects.push(Effect::Alert(AlertKind::ConnectionError));
                if !self.error_grace.is_zero() {
                    effects.push(Effect::ArmErrorGrace {
                        attempt,
                        after: self.error_grace,
                    });
                }
            }
            SessionEvent::Disconnected => {
                info!(attempt, "voice session disconnected");
                if self.pending == Pending::Session && self.session.handle.is_none() {
                    self.disconnected_attempt = Some(attempt);
                }
                // The client has already closed this session; the handle is
                // released without calling back into it.
                drop(self.session.reset());
                self.live_attempt = None;
                self.pending = Pending::Nothing;
            }
        }
    }

    /// Ends the live attempt: closes a held handle, resets the session and
    /// makes every outstanding completion stale.
    fn teardown(&mut self, effects: &mut Vec<Effect>) {
        if let Some(handle) = self.session.reset() {
            effects.push(Effect::CloseSession(handle));
        }
        self.live_attempt = None;
        self.pending = Pending::Nothing;
    }
}
