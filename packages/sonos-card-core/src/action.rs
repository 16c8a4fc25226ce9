//! User intents flowing into the card and host actions flowing out.
//!
//! Widgets never mutate card state. They report a [`UserAction`] upward;
//! the coordinator updates its own state and, when the host has to be
//! involved, hands back a [`CardCommand`] to run asynchronously.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Section;
use crate::dispatch::{CommandError, CommandResult, TransportControl};
use crate::events::CardEvent;
use crate::grouping::GroupingPlan;
use crate::player::Player;
use crate::store::Store;
use crate::utils::now_millis;
use crate::volume::SliderInput;

/// An interaction reported by one of the card's widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum UserAction {
    /// Footer navigation.
    ShowSection { section: Section },
    /// A player or group was picked in the groups section.
    #[serde(rename_all = "camelCase")]
    SelectActivePlayer { entity_id: String },

    // Grouping section
    ToggleGroupingItem { player: String },
    SelectPredefinedGroup { name: String },
    SelectAll,
    DeselectAll,
    ApplyGrouping,
    CancelGrouping,
    /// Per-row mute button of the grouping section.
    MutePlayer { player: String },

    // Volume
    #[serde(rename_all = "camelCase")]
    SetVolume {
        player: String,
        volume: u8,
        #[serde(default)]
        apply_to_members: bool,
    },
    #[serde(rename_all = "camelCase")]
    ToggleMute {
        player: String,
        #[serde(default)]
        apply_to_members: bool,
    },
    /// Volume buttons of the player section.
    VolumeUp,
    VolumeDown,
    /// Pointer input on the player section's volume slider.
    VolumeSlider { input: SliderInput },

    // Playback
    PlayPause,
    Transport { control: TransportControl },
    Rewind,
    FastForward,
    /// Click on the progress bar.
    #[serde(rename_all = "camelCase")]
    Seek { offset_x: f64, width: f64 },

    /// An item was picked in the media browser or queue.
    PlayMedia { media: String },
}

impl UserAction {
    /// Whether this action edits the pending grouping selection.
    pub fn is_grouping_edit(&self) -> bool {
        matches!(
            self,
            Self::ToggleGroupingItem { .. }
                | Self::SelectPredefinedGroup { .. }
                | Self::SelectAll
                | Self::DeselectAll
        )
    }
}

/// A host operation decided by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CardAction {
    ApplyGrouping {
        plan: GroupingPlan,
    },
    #[serde(rename_all = "camelCase")]
    SetVolume {
        player: String,
        volume: u8,
        apply_to_members: bool,
    },
    #[serde(rename_all = "camelCase")]
    VolumeUp {
        player: String,
        apply_to_members: bool,
    },
    #[serde(rename_all = "camelCase")]
    VolumeDown {
        player: String,
        apply_to_members: bool,
    },
    #[serde(rename_all = "camelCase")]
    ToggleMute {
        player: String,
        apply_to_members: bool,
    },
    Seek {
        player: String,
        position: f64,
    },
    Transport {
        player: String,
        control: TransportControl,
    },
    PlayMedia {
        player: String,
        media: String,
    },
}

/// A [`CardAction`] bound to the store it was decided against.
///
/// Executing it never touches the coordinator. Once it succeeds, a
/// grouping apply may ask for a new active player through
/// [`CardCommand::follow_active_player`].
#[derive(Clone)]
pub struct CardCommand {
    store: Arc<Store>,
    action: CardAction,
    follow_active_player: Option<String>,
}

impl std::fmt::Debug for CardCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardCommand")
            .field("action", &self.action)
            .field("follow_active_player", &self.follow_active_player)
            .finish()
    }
}

impl CardCommand {
    pub fn new(store: Arc<Store>, action: CardAction) -> Self {
        Self {
            store,
            action,
            follow_active_player: None,
        }
    }

    #[must_use]
    pub fn with_follow_active_player(mut self, entity_id: Option<String>) -> Self {
        self.follow_active_player = entity_id;
        self
    }

    pub fn action(&self) -> &CardAction {
        &self.action
    }

    pub fn follow_active_player(&self) -> Option<&str> {
        self.follow_active_player.as_deref()
    }

    /// Runs the action through the store's media control service.
    ///
    /// Returns the player the card should switch to, if any. Players that
    /// vanished from the roster since the action was decided fail with
    /// [`CommandError::Unavailable`].
    pub async fn execute(&self) -> CommandResult<Option<String>> {
        let control = self.store.media_control();
        match &self.action {
            CardAction::ApplyGrouping { plan } => {
                control.execute_plan(plan).await?;
                control.emitter().emit_card(CardEvent::GroupingApplied {
                    main_player: plan.diff.new_main_player.clone(),
                    timestamp: now_millis(),
                });
            }
            CardAction::SetVolume {
                player,
                volume,
                apply_to_members,
            } => {
                control
                    .volume_set(self.player(player)?, *volume, *apply_to_members)
                    .await?
            }
            CardAction::VolumeUp {
                player,
                apply_to_members,
            } => control.volume_up(self.player(player)?, *apply_to_members).await?,
            CardAction::VolumeDown {
                player,
                apply_to_members,
            } => control.volume_down(self.player(player)?, *apply_to_members).await?,
            CardAction::ToggleMute {
                player,
                apply_to_members,
            } => control.toggle_mute(self.player(player)?, *apply_to_members).await?,
            CardAction::Seek { player, position } => {
                control.seek(self.player(player)?, *position).await?
            }
            CardAction::Transport { player, control: button } => {
                control.transport(self.player(player)?, *button).await?
            }
            CardAction::PlayMedia { player, media } => {
                control.play_media(self.player(player)?, media).await?
            }
        }
        Ok(self.follow_active_player.clone())
    }

    fn player(&self, id: &str) -> CommandResult<Player<'_>> {
        self.store
            .find_player(id)
            .ok_or_else(|| CommandError::Unavailable(id.to_string()))
    }
}
