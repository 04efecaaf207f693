//! Call state machine for a phone-style voice conversation with a remote agent.
//!
//! A call rings (`Incoming`), the user accepts, the microphone permission is
//! requested, a credential is fetched, the voice session opens
//! (`Connecting`), and the client reports that it is live (`Connected`).
//! Hang-up, disconnect or any failure returns the call to a fresh `Incoming`
//! state, so the machine is cyclic.
//!
//! # Layers
//!
//! | Piece | Role |
//! |-------|------|
//! | [`CallSession`] | the single mutable aggregate |
//! | [`CallMachine`] | synchronous transitions returning [`Effect`]s |
//! | [`CallController`] | tokio task executing effects and owning timers |
//!
//! # Usage
//!
//! ```rust,ignore
//! use agentcall_session::{load_config, CallController};
//!
//! let config = load_config(Some("agentcall.toml"))?;
//! let gateway = SessionGateway::from_config(&config.gateway, &config.microphone, client)?;
//! let call = CallController::spawn(gateway, &config.call);
//! call.accept();
//! ```
//!
//! Mute, speaker and keypad are UI intent flags only; nothing here routes
//! audio.

pub mod config;
pub mod controller;
pub mod event;
pub mod machine;
pub mod session;
pub mod telemetry;
pub mod ticker;

pub use config::{apply_overrides, load_config, CallConfig, Config, ConfigError, LoggingConfig};
pub use controller::CallController;
pub use event::{CallEvent, Effect};
pub use machine::CallMachine;
pub use session::CallSession;
pub use telemetry::init_tracing;
pub use ticker::DurationTicker;
