//! Per-pass session context.
//!
//! A [`Store`] bundles everything a section needs for one render pass: the
//! roster, the resolved active player, the predefined groups and a command
//! service bound to the current section. It is rebuilt whenever the host
//! reports new state or the active player changes, and never mutated.

use std::sync::Arc;

use crate::config::{CardConfig, Section};
use crate::dispatch::{MediaCommands, MediaControlService};
use crate::error::{CardError, CardResult};
use crate::events::EventEmitter;
use crate::grouping::{resolve_predefined_groups, PredefinedGroup};
use crate::player::Player;
use crate::snapshot::EntitySnapshot;

/// Immutable per-pass view of the card's world.
pub struct Store {
    snapshot: Arc<EntitySnapshot>,
    config: Arc<CardConfig>,
    section: Section,
    active_index: usize,
    predefined_groups: Vec<PredefinedGroup>,
    media_control: MediaControlService,
}

impl Store {
    /// Builds a store.
    ///
    /// With `active_player_id` set, that player must exist in the roster.
    /// Without it the default player is picked: the configured `entityId`
    /// if present, else the first grouping-capable player that does not
    /// follow another, else the first player.
    pub fn new(
        snapshot: Arc<EntitySnapshot>,
        config: Arc<CardConfig>,
        section: Section,
        active_player_id: Option<&str>,
        commands: Arc<dyn MediaCommands>,
        emitter: Arc<dyn EventEmitter>,
    ) -> CardResult<Self> {
        let active_index = match active_player_id {
            Some(id) => snapshot
                .position(id)
                .ok_or_else(|| CardError::ActivePlayerNotFound(id.to_string()))?,
            None => default_active_index(&snapshot, &config).ok_or(CardError::NoPlayers)?,
        };

        let predefined_groups = resolve_predefined_groups(&config.predefined_groups, &snapshot);
        let media_control = MediaControlService::new(commands, emitter, &config, section);

        log::trace!(
            "[Store] Built for section {} with active player {}",
            section,
            snapshot.players()[active_index].id
        );

        Ok(Self {
            snapshot,
            config,
            section,
            active_index,
            predefined_groups,
            media_control,
        })
    }

    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Every player in roster order.
    pub fn all_players(&self) -> Vec<Player<'_>> {
        self.snapshot
            .players()
            .iter()
            .map(|p| Player::new(p, &self.snapshot))
            .collect()
    }

    pub fn active_player(&self) -> Player<'_> {
        Player::new(&self.snapshot.players()[self.active_index], &self.snapshot)
    }

    pub fn find_player(&self, id: &str) -> Option<Player<'_>> {
        self.snapshot.get(id).map(|p| Player::new(p, &self.snapshot))
    }

    /// Like [`Store::find_player`], failing with [`CardError::PlayerNotFound`].
    pub fn require_player(&self, id: &str) -> CardResult<Player<'_>> {
        self.find_player(id)
            .ok_or_else(|| CardError::PlayerNotFound(id.to_string()))
    }

    /// Ids grouped with the active player, active first.
    pub fn joined_ids(&self) -> Vec<String> {
        self.active_player()
            .group_ids()
            .into_iter()
            .filter(|id| self.snapshot.get(id).is_some())
            .map(str::to_string)
            .collect()
    }

    pub fn predefined_groups(&self) -> &[PredefinedGroup] {
        &self.predefined_groups
    }

    pub fn find_predefined_group(&self, name: &str) -> Option<&PredefinedGroup> {
        self.predefined_groups.iter().find(|g| g.name == name)
    }

    pub fn media_control(&self) -> &MediaControlService {
        &self.media_control
    }
}

fn default_active_index(snapshot: &EntitySnapshot, config: &CardConfig) -> Option<usize> {
    if let Some(index) = config.entity_id.as_deref().and_then(|id| snapshot.position(id)) {
        return Some(index);
    }
    snapshot
        .players()
        .iter()
        .position(|p| p.supports_grouping() && snapshot.leader_of(&p.id).is_none())
        .or_else(|| (!snapshot.is_empty()).then_some(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RecordingCommands;
    use crate::events::NoopEventEmitter;
    use crate::snapshot::{MediaPlayerFeature, PlayerSnapshot};

    fn roster() -> Arc<EntitySnapshot> {
        Arc::new(EntitySnapshot::new(vec![
            PlayerSnapshot::new("tv", "TV").with_features(MediaPlayerFeature::VOLUME_SET),
            PlayerSnapshot::new("b", "Bravo"),
            PlayerSnapshot::new("a", "Alpha").with_members(["b", "gone"]),
        ]))
    }

    fn store(config: CardConfig, active: Option<&str>) -> CardResult<Store> {
        Store::new(
            roster(),
            Arc::new(config),
            Section::Grouping,
            active,
            Arc::new(RecordingCommands::new()),
            Arc::new(NoopEventEmitter),
        )
    }

    #[test]
    fn default_active_player_is_first_capable_leader() {
        let store = store(CardConfig::default(), None).unwrap();
        assert_eq!(store.active_player().id(), "a");
        assert_eq!(store.joined_ids(), vec!["a", "b"]);
        assert_eq!(store.all_players().len(), 3);
    }

    #[test]
    fn configured_entity_id_wins() {
        let config = CardConfig {
            entity_id: Some("tv".into()),
            ..Default::default()
        };
        let store = store(config, None).unwrap();
        assert_eq!(store.active_player().id(), "tv");
    }

    #[test]
    fn explicit_active_player_must_exist() {
        let err = store(CardConfig::default(), Some("media_player.gone")).err().unwrap();
        assert_eq!(err.code(), "active_player_not_found");

        let store = store(CardConfig::default(), Some("b")).unwrap();
        assert_eq!(store.active_player().name(), "Bravo");
        assert!(store.require_player("x").is_err());
    }

    #[test]
    fn empty_roster_has_no_players() {
        let result = Store::new(
            Arc::new(EntitySnapshot::default()),
            Arc::new(CardConfig::default()),
            Section::Player,
            None,
            Arc::new(RecordingCommands::new()),
            Arc::new(NoopEventEmitter),
        );
        assert!(matches!(result, Err(CardError::NoPlayers)));
    }

    #[test]
    fn predefined_groups_are_resolved() {
        let config = CardConfig::from_yaml_str(
            "predefinedGroups:\n  - name: Pair\n    entities: [a, tv, ghost]",
        )
        .unwrap();
        let store = store(config, None).unwrap();
        let pair = store.find_predefined_group("Pair").unwrap();
        assert_eq!(pair.player_ids().collect::<Vec<_>>(), vec!["a", "tv"]);
    }
}
