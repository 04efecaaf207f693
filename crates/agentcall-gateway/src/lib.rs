//! Session gateway for agentcall.
//!
//! Sits between the call state machine and everything outside the process:
//! the microphone permission prompt, the trusted backend that mints a
//! short-lived signed URL, and the real-time voice client that turns that URL
//! into a live conversation with the remote agent.
//!
//! Each boundary is a trait ([`MicrophoneAccess`], [`CredentialSource`],
//! [`VoiceClient`]) so that the concrete implementation can be injected and
//! replaced by a test double. [`SessionGateway`] composes the three and
//! translates the voice client's callbacks into [`SessionEvent`]s.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod permission;
pub mod service;

pub use client::{SessionCallbacks, SessionEvent, SessionHandle, VoiceClient, VoiceSession};
pub use config::{GatewayConfig, MicrophoneConfig};
pub use credential::{Credential, CredentialSource, HttpCredentialSource};
pub use error::GatewayError;
pub use permission::{ConfiguredMicrophoneAccess, MicrophoneAccess};
pub use service::SessionGateway;
