//! Centralized error types for the Sonos card core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Gives every error a machine-readable code for hosts and logs
//! - Converts the per-concern errors (config, commands) into [`CardError`]

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::dispatch::CommandError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "config_io_failed",
            Self::Yaml(_) => "config_yaml_invalid",
            Self::Json(_) => "config_json_invalid",
            Self::Invalid(_) => "config_invalid",
        }
    }
}

impl ErrorCode for CommandError {
    fn code(&self) -> &'static str {
        match self {
            Self::Failed { .. } => "command_failed",
            Self::Unavailable(_) => "command_target_unavailable",
        }
    }
}

/// Crate-wide error type.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum CardError {
    /// The active player id does not exist in the current roster.
    #[error("Active player not found: {0}")]
    ActivePlayerNotFound(String),

    /// A referenced player does not exist in the current roster.
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    /// The host snapshot contains no usable players.
    #[error("No players found")]
    NoPlayers,

    /// Card configuration is malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A command sent to the host failed.
    #[error("Command failed: {0}")]
    Command(String),
}

impl CardError {
    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ActivePlayerNotFound(_) => "active_player_not_found",
            Self::PlayerNotFound(_) => "player_not_found",
            Self::NoPlayers => "no_players",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Command(_) => "command_failed",
        }
    }
}

impl ErrorCode for CardError {
    fn code(&self) -> &'static str {
        CardError::code(self)
    }
}

/// Convenient Result alias for card operations.
pub type CardResult<T> = Result<T, CardError>;

impl From<ConfigError> for CardError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

impl From<CommandError> for CardError {
    fn from(err: CommandError) -> Self {
        Self::Command(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_player_not_found_has_descriptive_message() {
        let err = CardError::ActivePlayerNotFound("media_player.kitchen".into());
        assert_eq!(err.code(), "active_player_not_found");
        assert!(err.to_string().contains("media_player.kitchen"));
    }

    #[test]
    fn command_error_converts_with_code() {
        let err = CommandError::Unavailable("media_player.den".into());
        assert_eq!(err.code(), "command_target_unavailable");
        let card: CardError = err.into();
        assert_eq!(card.code(), "command_failed");
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_value(CardError::NoPlayers).unwrap();
        assert_eq!(json["type"], "NoPlayers");
    }
}
