//! Configuration loading from file and environment variables.

use agentcall_gateway::{GatewayConfig, MicrophoneConfig};
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Credential endpoint settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Microphone permission policy.
    #[serde(default)]
    pub microphone: MicrophoneConfig,

    /// Call timing settings.
    #[serde(default)]
    pub call: CallConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Timing of the call state machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallConfig {
    /// Period of the duration counter in milliseconds. Default: 1000.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Seconds a session may stay open after an error without a disconnect
    /// before the call is torn down. `0` keeps it open indefinitely.
    #[serde(default = "default_error_grace_seconds")]
    pub error_grace_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "agentcall_session=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_error_grace_seconds() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            error_grace_seconds: default_error_grace_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `AGENTCALL_CREDENTIAL_URL` overrides `gateway.base_url`
/// - `AGENTCALL_CREDENTIAL_PATH` overrides `gateway.signed_url_path`
/// - `AGENTCALL_CREDENTIAL_TIMEOUT_SECONDS` overrides `gateway.request_timeout_seconds`
/// - `AGENTCALL_MICROPHONE_ALLOWED` overrides `microphone.allowed`
/// - `AGENTCALL_TICK_MILLIS` overrides `call.tick_millis`
/// - `AGENTCALL_ERROR_GRACE_SECONDS` overrides `call.error_grace_seconds`
/// - `AGENTCALL_LOG_LEVEL` overrides `logging.level`
/// - `AGENTCALL_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `AGENTCALL_*` overrides read through `lookup`.
///
/// Values that fail to parse are ignored.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("AGENTCALL_CREDENTIAL_URL") {
        config.gateway.base_url = url;
    }
    if let Some(path) = lookup("AGENTCALL_CREDENTIAL_PATH") {
        config.gateway.signed_url_path = path;
    }
    if let Some(timeout) = lookup("AGENTCALL_CREDENTIAL_TIMEOUT_SECONDS") {
        if let Ok(parsed) = timeout.parse() {
            config.gateway.request_timeout_seconds = parsed;
        }
    }
    if let Some(allowed) = lookup("AGENTCALL_MICROPHONE_ALLOWED") {
        config.microphone.allowed = parse_flag(&allowed);
    }
    if let Some(tick) = lookup("AGENTCALL_TICK_MILLIS") {
        if let Ok(parsed) = tick.parse() {
            config.call.tick_millis = parsed;
        }
    }
    if let Some(grace) = lookup("AGENTCALL_ERROR_GRACE_SECONDS") {
        if let Ok(parsed) = grace.parse() {
            config.call.error_grace_seconds = parsed;
        }
    }
    if let Some(level) = lookup("AGENTCALL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("AGENTCALL_LOG_JSON") {
        config.logging.json = parse_flag(&json);
    }
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}
