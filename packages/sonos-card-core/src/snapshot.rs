//! Host entity snapshot.
//!
//! The host pushes the state of every media player entity on each state
//! tick. [`EntitySnapshot::from_states`] turns that raw, Home-Assistant
//! shaped dump into the read-only roster the rest of the crate works on.
//!
//! # Membership
//!
//! The host reports `group_members` on every player of a group, leader
//! first. The roster keeps that information on the leader only: a player is
//! a leader iff its own id heads its `group_members` list and the list has
//! more than one entry. Non-leaders never carry members.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CardConfig;
use crate::utils::clamp_volume;

const MEDIA_PLAYER_DOMAIN: &str = "media_player.";

bitflags! {
    /// Feature bits a media player advertises through `supported_features`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MediaPlayerFeature: u32 {
        const PAUSE = 1;
        const SEEK = 2;
        const VOLUME_SET = 4;
        const VOLUME_MUTE = 8;
        const PREVIOUS_TRACK = 16;
        const NEXT_TRACK = 32;
        const TURN_ON = 128;
        const TURN_OFF = 256;
        const PLAY_MEDIA = 512;
        const VOLUME_STEP = 1024;
        const SELECT_SOURCE = 2048;
        const STOP = 4096;
        const CLEAR_PLAYLIST = 8192;
        const PLAY = 16384;
        const SHUFFLE_SET = 32768;
        const SELECT_SOUND_MODE = 65536;
        const BROWSE_MEDIA = 131072;
        const REPEAT_SET = 262144;
        const GROUPING = 524288;
    }
}

impl Serialize for MediaPlayerFeature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

/// Playback state reported in the entity `state` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Idle,
    On,
    Off,
    Buffering,
    Unavailable,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Attributes of a media player entity as reported by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityAttributes {
    pub friendly_name: Option<String>,
    /// Volume as a fraction (0.0-1.0).
    pub volume_level: Option<f64>,
    pub is_volume_muted: Option<bool>,
    /// All players of the group, leader first. Identical on every member.
    pub group_members: Vec<String>,
    pub supported_features: u32,
    pub media_duration: Option<f64>,
    pub media_position: Option<f64>,
    pub media_position_updated_at: Option<DateTime<Utc>>,
    pub media_title: Option<String>,
    pub media_artist: Option<String>,
    pub media_album_name: Option<String>,
    pub entity_picture: Option<String>,
}

/// Raw entity state as delivered by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    #[serde(default)]
    pub state: PlaybackState,
    #[serde(default)]
    pub attributes: EntityAttributes,
}

/// Now-playing information of a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Track duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Position in seconds at `position_updated_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_updated_at: Option<DateTime<Utc>>,
}

/// Read-only state of one controllable player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    /// Volume, 0-100.
    pub volume: u8,
    pub muted: bool,
    /// Members of the group this player leads, excluding itself.
    /// Empty for standalone players and for non-leaders.
    pub members: Vec<String>,
    pub state: PlaybackState,
    pub features: MediaPlayerFeature,
    /// Set for satellites (stereo pair, surround) whose volume must not be
    /// controlled independently.
    pub may_be_ignored_for_volume: bool,
    pub media: MediaInfo,
}

impl PlayerSnapshot {
    /// Creates a standalone, idle player supporting volume and grouping.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            volume: 0,
            muted: false,
            members: Vec::new(),
            state: PlaybackState::Idle,
            features: MediaPlayerFeature::VOLUME_SET
                | MediaPlayerFeature::VOLUME_MUTE
                | MediaPlayerFeature::GROUPING,
            may_be_ignored_for_volume: false,
            media: MediaInfo::default(),
        }
    }

    #[must_use]
    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume.min(100);
        self
    }

    #[must_use]
    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Makes this player the leader of a group with the given members.
    #[must_use]
    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = self.id.clone();
        self.members = members
            .into_iter()
            .map(Into::<String>::into)
            .filter(|m| *m != id)
            .collect();
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: PlaybackState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: MediaPlayerFeature) -> Self {
        self.features = features;
        self
    }

    #[must_use]
    pub fn with_ignored_volume(mut self, ignored: bool) -> Self {
        self.may_be_ignored_for_volume = ignored;
        self
    }

    #[must_use]
    pub fn with_media(mut self, media: MediaInfo) -> Self {
        self.media = media;
        self
    }

    pub fn supports_volume(&self) -> bool {
        self.features.contains(MediaPlayerFeature::VOLUME_SET)
    }

    pub fn supports_grouping(&self) -> bool {
        self.features.contains(MediaPlayerFeature::GROUPING)
    }

    /// Whether this player leads a group of at least two players.
    pub fn is_leader(&self) -> bool {
        !self.members.is_empty()
    }

    fn from_state(state: &EntityState, config: &CardConfig) -> Self {
        let attrs = &state.attributes;
        let id = state.entity_id.clone();

        let members = match attrs.group_members.split_first() {
            Some((leader, rest)) if *leader == id && !rest.is_empty() => {
                rest.iter().filter(|m| **m != id).cloned().collect()
            }
            _ => Vec::new(),
        };

        Self {
            name: attrs
                .friendly_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| id.clone()),
            volume: clamp_volume(attrs.volume_level.unwrap_or(0.0) * 100.0),
            muted: attrs.is_volume_muted.unwrap_or(false),
            members,
            state: state.state,
            features: MediaPlayerFeature::from_bits_truncate(attrs.supported_features),
            may_be_ignored_for_volume: config.ignores_volume_for(&id),
            media: MediaInfo {
                title: attrs.media_title.clone(),
                artist: attrs.media_artist.clone(),
                album: attrs.media_album_name.clone(),
                picture: attrs.entity_picture.clone(),
                duration: attrs.media_duration,
                position: attrs.media_position,
                position_updated_at: attrs.media_position_updated_at,
            },
            id,
        }
    }
}

/// The full roster of players for one render pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntitySnapshot {
    players: Vec<PlayerSnapshot>,
}

impl EntitySnapshot {
    /// Wraps an already-built roster.
    pub fn new(players: Vec<PlayerSnapshot>) -> Self {
        Self { players }
    }

    /// Builds the roster from raw host states.
    ///
    /// Only `media_player.*` entities are kept. When the config lists
    /// `entities`, the roster is restricted to them and keeps their order;
    /// listed ids the host does not report are skipped.
    pub fn from_states(states: &[EntityState], config: &CardConfig) -> Self {
        let is_player = |s: &&EntityState| s.entity_id.starts_with(MEDIA_PLAYER_DOMAIN);

        let players: Vec<PlayerSnapshot> = if config.entities.is_empty() {
            states
                .iter()
                .filter(is_player)
                .map(|s| PlayerSnapshot::from_state(s, config))
                .collect()
        } else {
            config
                .entities
                .iter()
                .filter_map(|id| {
                    let found = states.iter().find(|s| s.entity_id == *id);
                    if found.is_none() {
                        log::debug!("[Snapshot] Configured entity {} not reported by host", id);
                    }
                    found
                })
                .filter(is_player)
                .map(|s| PlayerSnapshot::from_state(s, config))
                .collect()
        };

        log::trace!("[Snapshot] Built roster with {} players", players.len());
        Self { players }
    }

    pub fn players(&self) -> &[PlayerSnapshot] {
        &self.players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn get(&self, id: &str) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// The leader whose member set contains `id`, if any.
    pub fn leader_of(&self, id: &str) -> Option<&PlayerSnapshot> {
        self.players
            .iter()
            .find(|p| p.id != id && p.members.iter().any(|m| m == id))
    }
}
