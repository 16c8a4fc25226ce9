//! In-memory command sink.
//!
//! Records every call instead of sending it anywhere. Used by the console
//! driver for dry runs and by tests as the host double.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use super::{CommandError, CommandResult, MediaCommands, TransportControl};

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum MediaCall {
    Join { leader: String, members: Vec<String> },
    UnJoin { members: Vec<String> },
    SetVolume { player: String, volume: u8 },
    SetMute { player: String, muted: bool },
    Seek { player: String, position: f64 },
    PlayMedia { player: String, media: String },
    Transport { player: String, control: TransportControl },
}

/// [`MediaCommands`] implementation that records calls.
#[derive(Default)]
pub struct RecordingCommands {
    calls: Mutex<Vec<MediaCall>>,
    failing: Mutex<HashSet<String>>,
    delay: Option<Duration>,
}

impl RecordingCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call complete only after `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes calls targeting `player` fail.
    pub fn fail_for(&self, player: impl Into<String>) {
        self.failing.lock().insert(player.into());
    }

    /// Returns every call recorded so far, in order.
    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    async fn record(&self, command: &str, targets: &[&str], call: MediaCall) -> CommandResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        log::debug!("[RecordingCommands] {:?}", call);
        self.calls.lock().push(call);

        let failing = self.failing.lock();
        match targets.iter().find(|t| failing.contains(**t)) {
            Some(target) => Err(CommandError::Failed {
                command: command.to_string(),
                reason: format!("{target} rejected the call"),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MediaCommands for RecordingCommands {
    async fn join(&self, leader: &str, members: &[String]) -> CommandResult<()> {
        let mut targets = vec![leader];
        targets.extend(members.iter().map(String::as_str));
        let call = MediaCall::Join {
            leader: leader.to_string(),
            members: members.to_vec(),
        };
        self.record("join", &targets, call).await
    }

    async fn unjoin(&self, members: &[String]) -> CommandResult<()> {
        let targets: Vec<&str> = members.iter().map(String::as_str).collect();
        let call = MediaCall::UnJoin {
            members: members.to_vec(),
        };
        self.record("unjoin", &targets, call).await
    }

    async fn set_volume(&self, player: &str, volume: u8) -> CommandResult<()> {
        let call = MediaCall::SetVolume {
            player: player.to_string(),
            volume,
        };
        self.record("volume_set", &[player], call).await
    }

    async fn set_mute(&self, player: &str, muted: bool) -> CommandResult<()> {
        let call = MediaCall::SetMute {
            player: player.to_string(),
            muted,
        };
        self.record("volume_mute", &[player], call).await
    }

    async fn seek(&self, player: &str, position: f64) -> CommandResult<()> {
        let call = MediaCall::Seek {
            player: player.to_string(),
            position,
        };
        self.record("media_seek", &[player], call).await
    }

    async fn play_media(&self, player: &str, media: &str) -> CommandResult<()> {
        let call = MediaCall::PlayMedia {
            player: player.to_string(),
            media: media.to_string(),
        };
        self.record("play_media", &[player], call).await
    }

    async fn transport(&self, player: &str, control: TransportControl) -> CommandResult<()> {
        let call = MediaCall::Transport {
            player: player.to_string(),
            control,
        };
        self.record("transport", &[player], call).await
    }
}
