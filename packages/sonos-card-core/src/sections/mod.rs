//! Section view models.
//!
//! Each section is rendered by a pure function from the [`Store`] into a
//! serializable view. The only section with local state is grouping, whose
//! pending edits live in [`GroupingSection`] and are owned by the card.

mod grouping;
mod groups;
mod player;
mod volumes;

pub use grouping::{
    joined_players, not_joined_players, GroupingApply, GroupingItemView, GroupingSection,
    GroupingView, PredefinedGroupView,
};
pub use groups::{render_groups, GroupView, GroupsView};
pub use player::{
    render_player, updates_member_volumes, volume_player, PlayerControl, PlayerView,
};
pub use volumes::{render_volumes, VolumesView};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::Section;
use crate::player::{MuteScope, Player};
use crate::snapshot::MediaInfo;
use crate::store::Store;
use crate::volume::{tick_states, VolumeSlider};

/// The rendered content of the visible section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "camelCase")]
pub enum SectionView {
    Player(PlayerView),
    Groups(GroupsView),
    Grouping(GroupingView),
    MediaBrowser(MediaBrowserView),
    Volumes(VolumesView),
    Queue(QueueView),
}

/// Inputs of a render pass besides the store.
pub struct RenderContext<'a> {
    pub grouping: &'a GroupingSection,
    /// Slider of the player section while a drag is in progress.
    pub volume_drag: Option<&'a VolumeSlider>,
    pub now: DateTime<Utc>,
}

/// Renders the store's section.
pub fn render_section(store: &Store, context: &RenderContext<'_>) -> SectionView {
    match store.section() {
        Section::Player => {
            SectionView::Player(render_player(store, context.volume_drag, context.now))
        }
        Section::Groups => SectionView::Groups(render_groups(store)),
        Section::Grouping => SectionView::Grouping(context.grouping.view(store)),
        Section::MediaBrowser => SectionView::MediaBrowser(render_media_browser(store)),
        Section::Volumes => SectionView::Volumes(render_volumes(store)),
        Section::Queue => SectionView::Queue(render_queue(store)),
    }
}

/// Compact description of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: String,
    pub name: String,
    pub volume: u8,
    pub muted: bool,
    pub is_playing: bool,
}

impl From<Player<'_>> for PlayerSummary {
    fn from(player: Player<'_>) -> Self {
        Self {
            id: player.id().to_string(),
            name: player.name().to_string(),
            volume: player.get_volume(),
            muted: player.is_muted(MuteScope::Player),
            is_playing: player.is_playing(),
        }
    }
}

/// A volume slider with its mute button.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeControlView {
    pub player: String,
    pub name: String,
    pub value: u8,
    pub max: f64,
    pub disabled: bool,
    pub muted: bool,
    /// Whether slider changes also move the group members.
    pub apply_to_members: bool,
    pub ticks: Vec<bool>,
}

impl VolumeControlView {
    pub(crate) fn new(player: Player<'_>, slider: &VolumeSlider, apply_to_members: bool) -> Self {
        let scope = if apply_to_members {
            MuteScope::Group
        } else {
            MuteScope::Player
        };
        Self {
            player: player.id().to_string(),
            name: player.name().to_string(),
            value: slider.value(),
            max: slider.max(),
            disabled: slider.is_disabled(),
            muted: player.is_muted(scope),
            apply_to_members,
            ticks: slider.ticks(),
        }
    }

    /// Full-range slider with a custom tick count, as drawn per grouping row.
    pub(crate) fn fixed_range(player: Player<'_>, disabled: bool, tick_count: usize) -> Self {
        let value = player.get_volume();
        Self {
            player: player.id().to_string(),
            name: player.name().to_string(),
            value,
            max: 100.0,
            disabled,
            muted: player.is_muted(MuteScope::Player),
            apply_to_members: false,
            ticks: tick_states(f64::from(value), 100.0, tick_count),
        }
    }
}

/// Media browser section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBrowserView {
    pub active_player: String,
    pub items_per_row: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Value>,
}

/// Queue section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub active_player: String,
    pub now_playing: MediaInfo,
}

fn render_media_browser(store: &Store) -> MediaBrowserView {
    let config = store.config();
    MediaBrowserView {
        active_player: store.active_player().id().to_string(),
        items_per_row: config.favorites_items_per_row.unwrap_or(4),
        favorites: config.custom_favorites.clone(),
        thumbnails: config.custom_favorite_thumbnails.clone(),
    }
}

fn render_queue(store: &Store) -> QueueView {
    let active = store.active_player();
    QueueView {
        active_player: active.id().to_string(),
        now_playing: active.snapshot().media.clone(),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::store_for;
    use super::*;
    use crate::config::CardConfig;
    use crate::snapshot::{EntitySnapshot, PlayerSnapshot};

    fn roster() -> EntitySnapshot {
        EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "Alpha").with_volume(35).with_members(["b"]),
            PlayerSnapshot::new("b", "Bravo").with_volume(20).with_muted(true),
        ])
    }

    #[test]
    fn each_section_renders_its_variant() {
        let grouping = GroupingSection::default();
        let context = RenderContext {
            grouping: &grouping,
            volume_drag: None,
            now: Utc::now(),
        };
        for section in Section::ALL {
            let store = store_for(roster(), CardConfig::default(), section, None);
            let view = render_section(&store, &context);
            let tag = serde_json::to_value(&view).unwrap()["section"].clone();
            let expected = match section {
                Section::Player => "player",
                Section::Groups => "groups",
                Section::Grouping => "grouping",
                Section::MediaBrowser => "mediaBrowser",
                Section::Volumes => "volumes",
                Section::Queue => "queue",
            };
            assert_eq!(tag, expected);
        }
    }

    #[test]
    fn media_browser_uses_normalized_row_count() {
        let config = CardConfig::from_yaml_str("mediaBrowserItemsPerRow: 6").unwrap();
        let store = store_for(roster(), config, Section::MediaBrowser, None);
        assert_eq!(render_media_browser(&store).items_per_row, 6);
    }
}
