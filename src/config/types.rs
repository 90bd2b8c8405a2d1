//! Core configuration types.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tkellem_proto::MAX_IRC_LINE_LEN;

use super::validation::{ValidationError, validate};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Bouncer configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bouncer: BouncerConfig,
    #[serde(default)]
    pub backlog: BacklogConfig,
    /// Accounts allowed to attach.
    #[serde(default)]
    pub account: Vec<AccountConfig>,
}

/// `[bouncer]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BouncerConfig {
    /// Name used in log output.
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Longest accepted client line, in bytes, including the line terminator.
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// Outbound queue length per client, in lines. Must hold the welcome
    /// burst plus a full backlog replay.
    #[serde(default = "default_sendq")]
    pub sendq: usize,
}

impl Default for BouncerConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            max_line_len: default_max_line_len(),
            sendq: default_sendq(),
        }
    }
}

/// `[backlog]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BacklogConfig {
    /// Lines kept per room.
    #[serde(default = "default_backlog_capacity")]
    pub capacity: usize,
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            capacity: default_backlog_capacity(),
        }
    }
}

/// One `[[account]]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub nick: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Networks this account may attach to. Empty means any.
    #[serde(default)]
    pub networks: Vec<String>,
}

impl AccountConfig {
    /// Whether this account may attach to `network`.
    pub fn allows_network(&self, network: &str) -> bool {
        self.networks.is_empty()
            || self
                .networks
                .iter()
                .any(|n| tkellem_proto::irc_eq(n, network))
    }
}

fn default_server_name() -> String {
    crate::BOUNCER_IDENTITY.to_string()
}

fn default_max_line_len() -> usize {
    MAX_IRC_LINE_LEN
}

fn default_sendq() -> usize {
    crate::client::DEFAULT_SENDQ
}

fn default_backlog_capacity() -> usize {
    500
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Run [`validate`] on this config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(self).map_err(ConfigError::Validation)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
