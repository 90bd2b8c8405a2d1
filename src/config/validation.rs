//! Configuration validation.
//!
//! Validates configuration at load time to catch common errors early.

use super::Config;
use crate::security::password::is_valid_hash;
use std::collections::HashSet;
use thiserror::Error;
use tkellem_proto::irc_to_lower;

/// Smallest accepted `bouncer.max_line_len`.
pub const MIN_LINE_LEN: usize = 64;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bouncer.max_line_len must be at least {MIN_LINE_LEN}, got {0}")]
    LineLengthTooSmall(usize),
    #[error("backlog.capacity must be greater than 0")]
    ZeroBacklogCapacity,
    #[error("bouncer.sendq ({sendq}) must be larger than backlog.capacity ({capacity})")]
    SendqTooSmall { sendq: usize, capacity: usize },
    #[error("account.nick is required")]
    MissingAccountNick,
    #[error("duplicate account nick '{0}'")]
    DuplicateAccount(String),
    #[error("account '{0}' has an unparseable password_hash")]
    InvalidPasswordHash(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bouncer.max_line_len < MIN_LINE_LEN {
        errors.push(ValidationError::LineLengthTooSmall(
            config.bouncer.max_line_len,
        ));
    }
    if config.backlog.capacity == 0 {
        errors.push(ValidationError::ZeroBacklogCapacity);
    }
    if config.bouncer.sendq <= config.backlog.capacity {
        errors.push(ValidationError::SendqTooSmall {
            sendq: config.bouncer.sendq,
            capacity: config.backlog.capacity,
        });
    }

    let mut seen = HashSet::new();
    for account in &config.account {
        if account.nick.is_empty() {
            errors.push(ValidationError::MissingAccountNick);
            continue;
        }
        if !seen.insert(irc_to_lower(&account.nick)) {
            errors.push(ValidationError::DuplicateAccount(account.nick.clone()));
        }
        if !is_valid_hash(&account.password_hash) {
            errors.push(ValidationError::InvalidPasswordHash(account.nick.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
