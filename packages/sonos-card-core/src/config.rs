//! Card configuration.
//!
//! The host hands the card a structured options object (YAML in dashboards,
//! JSON over the wire). [`CardConfig::normalize`] applies the defaults and
//! legacy-key migrations every consumer relies on, so the rest of the crate
//! only ever sees a normalized config.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default number of favorites shown per row in the media browser.
const DEFAULT_FAVORITES_ITEMS_PER_ROW: u32 = 4;
/// Default volume below which the dynamic slider range kicks in.
const DEFAULT_DYNAMIC_VOLUME_SLIDER_THRESHOLD: f64 = 20.0;
/// Default slider range used while below the dynamic threshold.
const DEFAULT_DYNAMIC_VOLUME_SLIDER_MAX: f64 = 30.0;
/// Default step for volume up/down buttons.
const DEFAULT_VOLUME_STEP: u8 = 1;
/// Default seek step for rewind/fast-forward buttons.
const DEFAULT_SEEK_STEP_SECONDS: f64 = 15.0;

/// Errors raised while loading or validating a card configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

/// The card sections a user can navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "player")]
    Player,
    #[serde(rename = "groups")]
    Groups,
    #[serde(rename = "grouping")]
    Grouping,
    #[serde(rename = "media browser")]
    MediaBrowser,
    #[serde(rename = "volumes")]
    Volumes,
    #[serde(rename = "queue")]
    Queue,
}

impl Section {
    /// Every section in footer order.
    pub const ALL: [Section; 6] = [
        Section::MediaBrowser,
        Section::Groups,
        Section::Player,
        Section::Grouping,
        Section::Volumes,
        Section::Queue,
    ];
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Player => "player",
            Self::Groups => "groups",
            Self::Grouping => "grouping",
            Self::MediaBrowser => "media browser",
            Self::Volumes => "volumes",
            Self::Queue => "queue",
        };
        f.write_str(name)
    }
}

/// One player entry of a predefined group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedGroupEntity {
    /// Entity id of the player.
    pub player: String,
    /// Volume to restore when the group is applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
}

/// A named grouping preset from the card configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedGroupConfig {
    /// Display name, also used as the preset identity.
    pub name: String,
    /// Member players, either bare ids or `{player, volume}` objects.
    #[serde(deserialize_with = "deserialize_group_entities")]
    pub entities: Vec<PredefinedGroupEntity>,
    /// Media to start on the group leader once applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// Volume applied to every member without its own volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
}

/// Card configuration object.
///
/// All fields are optional in the source document; missing keys take the
/// defaults documented on each accessor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardConfig {
    /// Card type as registered in the dashboard (e.g. `custom:sonos-card`).
    #[serde(rename = "type")]
    pub card_type: String,
    pub title: Option<String>,
    pub sections: Option<Vec<Section>>,
    pub start_section: Option<Section>,
    /// Player to select when no player has been chosen yet.
    pub entity_id: Option<String>,
    /// Explicit roster, in display order. Accepts auto-entities objects.
    #[serde(deserialize_with = "deserialize_entity_ids")]
    pub entities: Vec<String>,
    /// Integration platform the host uses to discover players. Entity
    /// states carry no platform, so the roster is not filtered on it here;
    /// hosts read it to choose which states they send.
    pub entity_platform: Option<String>,
    pub show_non_sonos_players: bool,

    // Grouping
    pub skip_apply_button_when_grouping: bool,
    pub dont_switch_player_when_grouping: bool,
    pub predefined_groups: Vec<PredefinedGroupConfig>,

    // Volume
    pub dynamic_volume_slider: bool,
    pub dynamic_volume_slider_threshold: Option<f64>,
    pub dynamic_volume_slider_max: Option<f64>,
    pub entities_to_ignore_volume_level_for: Vec<String>,
    pub player_volume_entity_id: Option<String>,
    pub allow_player_volume_entity_outside_of_group: bool,
    pub adjust_volume_relative_to_main_player: bool,
    pub volume_step_size: Option<u8>,

    // Player controls
    pub fast_forward_and_rewind_step_size_seconds: Option<f64>,
    pub show_volume_up_and_down_buttons: bool,
    pub show_fast_forward_and_rewind_buttons: bool,
    pub stop_instead_of_pause: bool,
    pub hide_player_control_shuffle_button: bool,
    pub hide_player_control_prev_track_button: bool,
    pub hide_player_control_next_track_button: bool,
    pub hide_player_control_repeat_button: bool,
    pub show_browse_media_in_player_section: bool,

    // Media browser
    pub favorites_items_per_row: Option<u32>,
    pub media_browser_items_per_row: Option<u32>,
    pub custom_favorites: Option<Value>,
    pub custom_favorite_thumbnails: Option<Value>,
    pub custom_favorite_thumbnails_if_missing: Option<Value>,

    // Deprecated keys, migrated by `normalize`
    #[serde(skip_serializing)]
    pub custom_sources: Option<Value>,
    #[serde(skip_serializing)]
    pub custom_thumbnail: Option<Value>,
    #[serde(skip_serializing)]
    pub custom_thumbnail_if_missing: Option<Value>,
}

impl CardConfig {
    /// Parses and normalizes a YAML configuration document.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(source)?;
        config.normalize()
    }

    /// Parses and normalizes a JSON configuration document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.normalize()
    }

    /// Loads a configuration file. `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Applies defaults, legacy-key migrations and validation.
    pub fn normalize(mut self) -> Result<Self, ConfigError> {
        // Empty lists behave as if the key were absent
        if self.sections.as_ref().is_some_and(Vec::is_empty) {
            self.sections = None;
        }
        self.custom_favorites = drop_empty(self.custom_favorites);
        self.custom_favorite_thumbnails = drop_empty(self.custom_favorite_thumbnails);
        self.custom_favorite_thumbnails_if_missing =
            drop_empty(self.custom_favorite_thumbnails_if_missing);
        self.entity_id = self.entity_id.filter(|id| !id.is_empty());

        if self.is_sonos_card() {
            self.entity_platform = if self.show_non_sonos_players {
                None
            } else {
                Some("sonos".to_string())
            };
        }

        if let Some(sources) = drop_empty(self.custom_sources.take()) {
            self.custom_favorites = Some(sources);
        }
        if let Some(thumbnails) = drop_empty(self.custom_thumbnail.take()) {
            self.custom_favorite_thumbnails = Some(thumbnails);
        }
        if let Some(thumbnails) = drop_empty(self.custom_thumbnail_if_missing.take()) {
            self.custom_favorite_thumbnails_if_missing = Some(thumbnails);
        }

        self.favorites_items_per_row = Some(
            self.media_browser_items_per_row
                .or(self.favorites_items_per_row)
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_FAVORITES_ITEMS_PER_ROW),
        );

        for group in &self.predefined_groups {
            if group.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "predefined group name cannot be empty".to_string(),
                ));
            }
            if group.entities.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "predefined group '{}' has no entities",
                    group.name
                )));
            }
        }

        Ok(self)
    }

    /// Whether this is the Sonos-specific card variant.
    pub fn is_sonos_card(&self) -> bool {
        self.card_type.contains("sonos")
    }

    /// Sections shown in the footer.
    pub fn available_sections(&self) -> Vec<Section> {
        match &self.sections {
            Some(sections) => sections.clone(),
            None => Section::ALL
                .into_iter()
                .filter(|s| self.is_sonos_card() || *s != Section::Queue)
                .collect(),
        }
    }

    /// Section the card opens on.
    pub fn initial_section(&self) -> Section {
        let sections = self.available_sections();
        if let Some(start) = self.start_section.filter(|s| sections.contains(s)) {
            return start;
        }
        let preference = [
            Section::Player,
            Section::MediaBrowser,
            Section::Groups,
            Section::Grouping,
        ];
        if let Some(section) = preference.into_iter().find(|s| sections.contains(s)) {
            return section;
        }
        if sections.contains(&Section::Queue) && self.is_sonos_card() {
            Section::Queue
        } else {
            Section::Volumes
        }
    }

    /// Whether a navigation request to `section` is honored.
    ///
    /// Without an explicit `sections` list every section is reachable.
    pub fn allows_section(&self, section: Section) -> bool {
        self.sections
            .as_ref()
            .map_or(true, |sections| sections.contains(&section))
    }

    /// Whether `section` is explicitly listed in `sections`.
    pub fn lists_section(&self, section: Section) -> bool {
        self.sections
            .as_ref()
            .is_some_and(|sections| sections.contains(&section))
    }

    /// The footer is hidden when only one section is configured.
    pub fn shows_footer(&self) -> bool {
        self.sections.as_ref().map_or(true, |s| s.len() > 1)
    }

    /// Volume below which the dynamic slider range applies (0-100).
    pub fn dynamic_volume_slider_threshold(&self) -> f64 {
        self.dynamic_volume_slider_threshold
            .unwrap_or(DEFAULT_DYNAMIC_VOLUME_SLIDER_THRESHOLD)
            .clamp(0.0, 100.0)
    }

    /// Slider maximum used while below the dynamic threshold (0-100).
    pub fn dynamic_volume_slider_max(&self) -> f64 {
        self.dynamic_volume_slider_max
            .unwrap_or(DEFAULT_DYNAMIC_VOLUME_SLIDER_MAX)
            .clamp(0.0, 100.0)
    }

    /// Step used by volume up/down.
    pub fn volume_step(&self) -> u8 {
        self.volume_step_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_VOLUME_STEP)
    }

    /// Step used by rewind/fast-forward, in seconds.
    pub fn seek_step_seconds(&self) -> f64 {
        self.fast_forward_and_rewind_step_size_seconds
            .filter(|s| *s > 0.0)
            .unwrap_or(DEFAULT_SEEK_STEP_SECONDS)
    }

    /// Whether `id` is marked as not independently volume-controllable.
    pub fn ignores_volume_for(&self, id: &str) -> bool {
        self.entities_to_ignore_volume_level_for
            .iter()
            .any(|e| e == id)
    }
}

fn drop_empty(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !matches!(v, Value::Array(items) if items.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntityRef {
    Id(String),
    Object { entity: String },
}

fn deserialize_entity_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs = Option::<Vec<EntityRef>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(refs
        .into_iter()
        .map(|r| match r {
            EntityRef::Id(id) => id,
            EntityRef::Object { entity } => entity,
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GroupEntityRef {
    Id(String),
    Detailed(PredefinedGroupEntity),
}

fn deserialize_group_entities<'de, D>(
    deserializer: D,
) -> Result<Vec<PredefinedGroupEntity>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs = Vec::<GroupEntityRef>::deserialize(deserializer)?;
    Ok(refs
        .into_iter()
        .map(|r| match r {
            GroupEntityRef::Id(player) => PredefinedGroupEntity {
                player,
                volume: None,
            },
            GroupEntityRef::Detailed(entity) => entity,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sections_skip_queue_for_generic_card() {
        let config = CardConfig::from_yaml_str("type: custom:maxi-media-player").unwrap();
        assert!(!config.available_sections().contains(&Section::Queue));
        assert_eq!(config.initial_section(), Section::Player);

        let sonos = CardConfig::from_yaml_str("type: custom:sonos-card").unwrap();
        assert!(sonos.available_sections().contains(&Section::Queue));
        assert_eq!(sonos.entity_platform.as_deref(), Some("sonos"));
    }

    #[test]
    fn show_non_sonos_players_clears_platform() {
        let config = CardConfig::from_yaml_str(
            "type: custom:sonos-card\nshowNonSonosPlayers: true\nentityPlatform: sonos",
        )
        .unwrap();
        assert_eq!(config.entity_platform, None);
    }

    #[test]
    fn start_section_must_be_configured() {
        let config = CardConfig::from_yaml_str(
            "sections: [grouping, volumes]\nstartSection: player",
        )
        .unwrap();
        assert_eq!(config.initial_section(), Section::Grouping);

        let config = CardConfig::from_yaml_str(
            "sections: [grouping, volumes]\nstartSection: volumes",
        )
        .unwrap();
        assert_eq!(config.initial_section(), Section::Volumes);
    }

    #[test]
    fn initial_section_falls_back_to_volumes() {
        let config = CardConfig::from_yaml_str("sections: [volumes, queue]").unwrap();
        assert_eq!(config.initial_section(), Section::Volumes);

        let config =
            CardConfig::from_yaml_str("type: custom:sonos-card\nsections: [volumes, queue]")
                .unwrap();
        assert_eq!(config.initial_section(), Section::Queue);
    }

    #[test]
    fn empty_sections_behave_as_absent() {
        let config = CardConfig::from_yaml_str("sections: []").unwrap();
        assert!(config.sections.is_none());
        assert!(config.allows_section(Section::Grouping));
        assert!(!config.lists_section(Section::Player));
        assert!(config.shows_footer());
    }

    #[test]
    fn auto_entities_objects_are_flattened() {
        let config = CardConfig::from_yaml_str(
            "entities:\n  - entity: media_player.kitchen\n  - media_player.den",
        )
        .unwrap();
        assert_eq!(config.entities, vec!["media_player.kitchen", "media_player.den"]);
    }

    #[test]
    fn deprecated_keys_are_migrated() {
        let config = CardConfig::from_yaml_str(
            "customSources:\n  media_player.den:\n    - title: Radio\nmediaBrowserItemsPerRow: 6",
        )
        .unwrap();
        assert!(config.custom_favorites.is_some());
        assert_eq!(config.favorites_items_per_row, Some(6));

        let config = CardConfig::from_yaml_str("customThumbnail: []").unwrap();
        assert!(config.custom_favorite_thumbnails.is_none());
        assert_eq!(config.favorites_items_per_row, Some(4));
    }

    #[test]
    fn dynamic_slider_values_are_clamped() {
        let config = CardConfig::from_yaml_str(
            "dynamicVolumeSliderThreshold: 150\ndynamicVolumeSliderMax: -3",
        )
        .unwrap();
        assert_eq!(config.dynamic_volume_slider_threshold(), 100.0);
        assert_eq!(config.dynamic_volume_slider_max(), 0.0);

        let defaults = CardConfig::default();
        assert_eq!(defaults.dynamic_volume_slider_threshold(), 20.0);
        assert_eq!(defaults.dynamic_volume_slider_max(), 30.0);
        assert_eq!(defaults.volume_step(), 1);
        assert_eq!(defaults.seek_step_seconds(), 15.0);
    }

    #[test]
    fn predefined_groups_accept_both_entity_forms() {
        let config = CardConfig::from_yaml_str(
            r#"
predefinedGroups:
  - name: Downstairs
    volume: 20
    media: Radio 1
    entities:
      - media_player.kitchen
      - player: media_player.den
        volume: 35
"#,
        )
        .unwrap();
        let group = &config.predefined_groups[0];
        assert_eq!(group.entities.len(), 2);
        assert_eq!(group.entities[0].volume, None);
        assert_eq!(group.entities[1].volume, Some(35));
        assert_eq!(group.media.as_deref(), Some("Radio 1"));
    }

    #[test]
    fn predefined_group_without_entities_is_rejected() {
        let err = CardConfig::from_yaml_str("predefinedGroups:\n  - name: Empty\n    entities: []")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_picks_parser_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("card.yaml");
        std::fs::write(&yaml, "title: Living room\nskipApplyButtonWhenGrouping: true").unwrap();
        let config = CardConfig::load(&yaml).unwrap();
        assert_eq!(config.title.as_deref(), Some("Living room"));
        assert!(config.skip_apply_button_when_grouping);

        let json = dir.path().join("card.json");
        std::fs::write(&json, r#"{"dontSwitchPlayerWhenGrouping": true}"#).unwrap();
        let config = CardConfig::load(&json).unwrap();
        assert!(config.dont_switch_player_when_grouping);

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(CardConfig::load(&missing), Err(ConfigError::Io(_))));
    }
}
