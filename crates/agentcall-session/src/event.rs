//! Inputs and outputs of the call state machine.

use agentcall_gateway::{Credential, GatewayError, SessionEvent, SessionHandle};
use agentcall_types::AlertKind;
use std::time::Duration;

/// Everything the state machine reacts to.
///
/// Variants that carry an `attempt` are completions or callbacks belonging
/// to one call attempt; they are ignored once that attempt is superseded.
#[derive(Debug)]
pub enum CallEvent {
    /// The user tapped accept.
    AcceptCall,
    /// The user tapped decline or end-call.
    HangUp,
    ToggleMute,
    ToggleSpeaker,
    ToggleKeypad,

    /// One period of the duration timer elapsed.
    Tick { attempt: u64 },
    /// The grace period after a session error ran out.
    ErrorGraceElapsed { attempt: u64 },

    MicrophoneResolved {
        attempt: u64,
        result: Result<(), GatewayError>,
    },
    CredentialResolved {
        attempt: u64,
        result: Result<Credential, GatewayError>,
    },
    SessionOpened {
        attempt: u64,
        result: Result<SessionHandle, GatewayError>,
    },
    SessionClosed {
        attempt: u64,
        result: Result<(), GatewayError>,
    },
    /// A voice-client callback for the session opened by `attempt`.
    Session { attempt: u64, event: SessionEvent },

    /// The owning component is going away.
    Shutdown,
}

/// Side effects requested by a transition, executed by the runtime.
#[derive(Debug)]
pub enum Effect {
    RequestMicrophone { attempt: u64 },
    FetchCredential { attempt: u64 },
    OpenSession { attempt: u64, credential: Credential },
    CloseSession(SessionHandle),
    Alert(AlertKind),
    ArmErrorGrace { attempt: u64, after: Duration },
}
