//! Player section: now playing, progress, transport and volume.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::CardConfig;
use crate::player::Player;
use crate::progress::{progress_view, ProgressView};
use crate::snapshot::{MediaInfo, MediaPlayerFeature};
use crate::store::Store;
use crate::volume::VolumeSlider;

use super::{PlayerSummary, VolumeControlView};

/// Buttons of the player section, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerControl {
    VolumeDown,
    Shuffle,
    PreviousTrack,
    Rewind,
    Play,
    Pause,
    Stop,
    FastForward,
    NextTrack,
    Repeat,
    VolumeUp,
    BrowseMedia,
}

/// Rendered player section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub player: PlayerSummary,
    /// Names of the whole group, leader first.
    pub group: Vec<String>,
    pub media: MediaInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressView>,
    pub controls: Vec<PlayerControl>,
    pub volume: VolumeControlView,
}

/// The player the section's volume controls act on.
///
/// `playerVolumeEntityId` wins when it is a member of the active group, or
/// anywhere in the roster when allowed outside the group. Otherwise the
/// active player is used.
pub fn volume_player(store: &Store) -> Player<'_> {
    let active = store.active_player();
    let config = store.config();
    config
        .player_volume_entity_id
        .as_deref()
        .and_then(|id| {
            if config.allow_player_volume_entity_outside_of_group {
                store.find_player(id)
            } else {
                active.get_member(id)
            }
        })
        .unwrap_or(active)
}

/// Members follow the volume controls only without an explicit volume entity.
pub fn updates_member_volumes(config: &CardConfig) -> bool {
    config.player_volume_entity_id.is_none()
}

/// Renders the section. `drag` is the slider state while a drag runs.
pub fn render_player(store: &Store, drag: Option<&VolumeSlider>, now: DateTime<Utc>) -> PlayerView {
    let active = store.active_player();
    let config = store.config();

    let target = volume_player(store);
    let slider = match drag {
        Some(slider) => slider.clone(),
        None => VolumeSlider::for_player(target, config),
    };

    PlayerView {
        player: active.into(),
        group: active.group().iter().map(|p| p.name().to_string()).collect(),
        media: active.snapshot().media.clone(),
        progress: progress_view(active, now),
        controls: controls(active, config),
        volume: VolumeControlView::new(target, &slider, updates_member_volumes(config)),
    }
}

fn controls(player: Player<'_>, config: &CardConfig) -> Vec<PlayerControl> {
    let supported = |feature| player.supports(feature);
    let mut controls = Vec::new();

    if config.show_volume_up_and_down_buttons {
        controls.push(PlayerControl::VolumeDown);
    }
    if !config.hide_player_control_shuffle_button && supported(MediaPlayerFeature::SHUFFLE_SET) {
        controls.push(PlayerControl::Shuffle);
    }
    if !config.hide_player_control_prev_track_button
        && supported(MediaPlayerFeature::PREVIOUS_TRACK)
    {
        controls.push(PlayerControl::PreviousTrack);
    }
    if config.show_fast_forward_and_rewind_buttons {
        controls.push(PlayerControl::Rewind);
    }
    controls.push(if !player.is_playing() {
        PlayerControl::Play
    } else if config.stop_instead_of_pause {
        PlayerControl::Stop
    } else {
        PlayerControl::Pause
    });
    if config.show_fast_forward_and_rewind_buttons {
        controls.push(PlayerControl::FastForward);
    }
    if !config.hide_player_control_next_track_button && supported(MediaPlayerFeature::NEXT_TRACK) {
        controls.push(PlayerControl::NextTrack);
    }
    if !config.hide_player_control_repeat_button && supported(MediaPlayerFeature::REPEAT_SET) {
        controls.push(PlayerControl::Repeat);
    }
    if config.show_volume_up_and_down_buttons {
        controls.push(PlayerControl::VolumeUp);
    }
    if config.show_browse_media_in_player_section && supported(MediaPlayerFeature::BROWSE_MEDIA) {
        controls.push(PlayerControl::BrowseMedia);
    }
    controls
}
