//! Media control service.
//!
//! Turns card-level intents (set a group's volume, apply a grouping plan)
//! into [`MediaCommands`] calls. Every public operation is bracketed by a
//! [`CommandEvent::Started`]/[`CommandEvent::Finished`] pair carrying the
//! section it was issued from.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use crate::config::{CardConfig, Section};
use crate::events::{CommandEvent, EventEmitter};
use crate::grouping::{GroupingCommand, GroupingPlan, PredefinedGroup};
use crate::player::{MuteScope, Player};
use crate::utils::{clamp_volume, now_millis};

use super::{CommandError, CommandResult, MediaCommands, TransportControl};

/// Issues host commands on behalf of one store.
#[derive(Clone)]
pub struct MediaControlService {
    commands: Arc<dyn MediaCommands>,
    emitter: Arc<dyn EventEmitter>,
    section: Section,
    relative_volume: bool,
    volume_step: u8,
}

impl MediaControlService {
    pub fn new(
        commands: Arc<dyn MediaCommands>,
        emitter: Arc<dyn EventEmitter>,
        config: &CardConfig,
        section: Section,
    ) -> Self {
        Self {
            commands,
            emitter,
            section,
            relative_volume: config.adjust_volume_relative_to_main_player,
            volume_step: config.volume_step(),
        }
    }

    pub fn emitter(&self) -> &Arc<dyn EventEmitter> {
        &self.emitter
    }

    pub async fn join(&self, leader: &str, members: &[String]) -> CommandResult<()> {
        log::info!("[MediaControl] Joining {:?} to {}", members, leader);
        self.run("join", self.commands.join(leader, members)).await
    }

    pub async fn unjoin(&self, members: &[String]) -> CommandResult<()> {
        log::info!("[MediaControl] Unjoining {:?}", members);
        self.run("unjoin", self.commands.unjoin(members)).await
    }

    /// Sets a player's volume, and with `apply_to_members` its group's.
    ///
    /// Members marked as ignored for volume are left alone. When relative
    /// adjustment is configured each member moves by the same amount as the
    /// player instead of jumping to the same value.
    pub async fn volume_set(
        &self,
        player: Player<'_>,
        volume: u8,
        apply_to_members: bool,
    ) -> CommandResult<()> {
        let targets = self.volume_targets(player, volume.min(100), apply_to_members);
        self.run("volume_set", self.set_volumes(targets)).await
    }

    pub async fn volume_up(&self, player: Player<'_>, apply_to_members: bool) -> CommandResult<()> {
        let volume = player.get_volume().saturating_add(self.volume_step).min(100);
        self.volume_set(player, volume, apply_to_members).await
    }

    pub async fn volume_down(&self, player: Player<'_>, apply_to_members: bool) -> CommandResult<()> {
        let volume = player.get_volume().saturating_sub(self.volume_step);
        self.volume_set(player, volume, apply_to_members).await
    }

    /// Flips the mute state of a player, and with `apply_to_members` of its
    /// whole group so the group ends up uniformly muted or unmuted.
    pub async fn toggle_mute(&self, player: Player<'_>, apply_to_members: bool) -> CommandResult<()> {
        let (scope, targets) = if apply_to_members {
            let targets = player
                .group()
                .into_iter()
                .filter(|p| *p == player || !p.ignore_volume())
                .map(|p| p.id().to_string())
                .collect();
            (MuteScope::Group, targets)
        } else {
            (MuteScope::Player, vec![player.id().to_string()])
        };
        let muted = !player.is_muted(scope);
        log::info!("[MediaControl] Setting mute={} on {:?}", muted, targets);

        self.run("volume_mute", async {
            let futures = targets.iter().map(|id| {
                let commands = Arc::clone(&self.commands);
                async move { commands.set_mute(id, muted).await.map_err(|e| (id.clone(), e)) }
            });
            collect_fanout("volume_mute", join_all(futures).await)
        })
        .await
    }

    /// Seeks the player. Negative positions are clamped to the start.
    pub async fn seek(&self, player: Player<'_>, position: f64) -> CommandResult<()> {
        let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
        self.run("media_seek", self.commands.seek(player.id(), position))
            .await
    }

    pub async fn play_media(&self, player: Player<'_>, media: &str) -> CommandResult<()> {
        self.run("play_media", self.commands.play_media(player.id(), media))
            .await
    }

    pub async fn transport(&self, player: Player<'_>, control: TransportControl) -> CommandResult<()> {
        self.run("transport", self.commands.transport(player.id(), control))
            .await
    }

    /// Restores the saved volumes of a preset, then starts its media on the
    /// first member.
    pub async fn apply_predefined_group(&self, group: &PredefinedGroup) -> CommandResult<()> {
        let targets: Vec<(String, u8)> = group
            .entities
            .iter()
            .filter_map(|entity| entity.volume.map(|v| (entity.id.clone(), v)))
            .collect();
        if !targets.is_empty() {
            self.run("volume_set", self.set_volumes(targets)).await?;
        }

        if let (Some(media), Some(first)) = (&group.media, group.entities.first()) {
            log::info!("[MediaControl] Starting '{}' on {}", media, first.id);
            self.run("play_media", self.commands.play_media(&first.id, media))
                .await?;
        }
        Ok(())
    }

    /// Executes a grouping plan in order, stopping at the first failure.
    pub async fn execute_plan(&self, plan: &GroupingPlan) -> CommandResult<()> {
        for command in &plan.commands {
            match command {
                GroupingCommand::Join { leader, members } => self.join(leader, members).await?,
                GroupingCommand::UnJoin { members } => self.unjoin(members).await?,
                GroupingCommand::ApplyPredefinedGroup { group } => {
                    self.apply_predefined_group(group).await?
                }
            }
        }
        Ok(())
    }

    fn volume_targets(
        &self,
        player: Player<'_>,
        volume: u8,
        apply_to_members: bool,
    ) -> Vec<(String, u8)> {
        let mut targets = vec![(player.id().to_string(), volume)];
        if !apply_to_members {
            return targets;
        }

        let change = f64::from(volume) - f64::from(player.get_volume());
        for member in player.members().into_iter().filter(|m| !m.ignore_volume()) {
            let member_volume = if self.relative_volume {
                clamp_volume(f64::from(member.get_volume()) + change)
            } else {
                volume
            };
            targets.push((member.id().to_string(), member_volume));
        }
        targets
    }

    async fn set_volumes(&self, targets: Vec<(String, u8)>) -> CommandResult<()> {
        log::info!("[MediaControl] Setting volumes {:?}", targets);
        let futures = targets.into_iter().map(|(id, volume)| {
            let commands = Arc::clone(&self.commands);
            async move { commands.set_volume(&id, volume).await.map_err(|e| (id, e)) }
        });
        collect_fanout("volume_set", join_all(futures).await)
    }

    async fn run<F>(&self, command: &str, operation: F) -> CommandResult<()>
    where
        F: Future<Output = CommandResult<()>>,
    {
        let command_id = Uuid::new_v4().to_string();
        self.emitter.emit_command(CommandEvent::Started {
            command_id: command_id.clone(),
            section: self.section,
            timestamp: now_millis(),
        });

        let result = operation.await;
        if let Err(e) = &result {
            log::warn!("[MediaControl] {} failed: {}", command, e);
        }

        self.emitter.emit_command(CommandEvent::Finished {
            command_id,
            section: self.section,
            success: result.is_ok(),
            error: result.as_ref().err().map(ToString::to_string),
            timestamp: now_millis(),
        });
        result
    }
}

/// Folds the results of a per-player fan-out.
///
/// Partial failures are logged; an error is returned only when every
/// target failed.
fn collect_fanout(
    command: &str,
    results: Vec<Result<(), (String, CommandError)>>,
) -> CommandResult<()> {
    let total = results.len();
    let failures: Vec<(String, CommandError)> = results.into_iter().filter_map(Result::err).collect();

    if total > 0 && failures.len() == total {
        return Err(CommandError::Failed {
            command: command.to_string(),
            reason: format!("all {} targets failed: {:?}", total, failures),
        });
    }
    for (id, e) in &failures {
        log::warn!("[MediaControl] {} on {} failed: {}", command, id, e);
    }
    Ok(())
}
