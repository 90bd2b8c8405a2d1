//! Configuration loading and management.
//!
//! - [`types`]: config struct definitions (Config, BouncerConfig, BacklogConfig, AccountConfig)
//! - [`validation`]: startup checks collected into [`ValidationError`]s

mod types;
mod validation;

pub use types::{AccountConfig, BacklogConfig, BouncerConfig, Config, ConfigError};
pub use validation::{ValidationError, validate};
