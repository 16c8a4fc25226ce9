//! Outbound command dispatch.
//!
//! The card never talks to the host directly. Every command goes through
//! the [`MediaCommands`] trait, and [`MediaControlService`] wraps each call
//! with the started/finished events that drive the loading indicator.

mod recording;
mod service;

pub use recording::{MediaCall, RecordingCommands};
pub use service::MediaControlService;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the host for an outbound command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("{command} failed: {reason}")]
    Failed { command: String, reason: String },

    #[error("player unavailable: {0}")]
    Unavailable(String),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Transport buttons of the player section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportControl {
    Play,
    Pause,
    Stop,
    NextTrack,
    PreviousTrack,
    ShuffleSet,
    RepeatSet,
}

/// Commands the host integration layer executes on behalf of the card.
///
/// Implementations are expected to be fire-and-forget from the card's
/// point of view; failures are not retried.
#[async_trait]
pub trait MediaCommands: Send + Sync {
    /// Joins `members` to the group led by `leader`.
    async fn join(&self, leader: &str, members: &[String]) -> CommandResult<()>;

    /// Removes `members` from whatever group they are in.
    async fn unjoin(&self, members: &[String]) -> CommandResult<()>;

    /// Sets the volume (0-100) of a single player.
    async fn set_volume(&self, player: &str, volume: u8) -> CommandResult<()>;

    /// Sets the mute flag of a single player.
    async fn set_mute(&self, player: &str, muted: bool) -> CommandResult<()>;

    /// Seeks to `position` seconds.
    async fn seek(&self, player: &str, position: f64) -> CommandResult<()>;

    /// Starts the named media (favorite, source or URI) on a player.
    async fn play_media(&self, player: &str, media: &str) -> CommandResult<()>;

    /// Presses a transport button.
    async fn transport(&self, player: &str, control: TransportControl) -> CommandResult<()>;
}
