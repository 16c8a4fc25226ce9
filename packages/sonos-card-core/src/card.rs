//! Top-level card coordinator.
//!
//! [`Card`] is the single owner of mutable card state: the visible section,
//! the active player, the pending grouping edits, the loading indicator and
//! an in-progress volume drag. Everything else is derived from a fresh
//! [`Store`] that is rebuilt whenever one of its inputs changes.
//!
//! The coordinator is synchronous. Time is passed in explicitly, and host
//! work is handed back as [`CardCommand`]s for the caller to run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::action::{CardAction, CardCommand, UserAction};
use crate::config::{CardConfig, Section};
use crate::dispatch::{MediaCommands, TransportControl};
use crate::error::{CardError, CardResult};
use crate::events::{CardEvent, CommandEvent, EventEmitter};
use crate::loader::LoadingIndicator;
use crate::progress::{fast_forward_target, rewind_target, seek_position};
use crate::sections::{
    render_section, updates_member_volumes, volume_player, GroupingSection, RenderContext,
    SectionView,
};
use crate::snapshot::{EntitySnapshot, EntityState};
use crate::store::Store;
use crate::utils::now_millis;
use crate::volume::{SliderInput, SliderOutcome, VolumeSlider};

/// Delay between picking a media item and switching to the player section.
pub const MEDIA_SELECTION_SWITCH_DELAY: Duration = Duration::from_secs(1);

const NO_SONOS_PLAYERS_TEXT: &str = "No supported players found";
const NO_PLAYERS_TEXT: &str = "No players found. Make sure you have configured entities in the \
card's configuration, or configured `entityPlatform`.";

/// Full rendered card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub section: Section,
    /// Footer entries, absent when the footer is hidden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<Vec<Section>>,
    pub loader_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_player: Option<String>,
    pub content: CardContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CardContent {
    Section(SectionView),
    NoPlayers { message: String },
}

#[derive(Debug, Clone)]
struct VolumeDrag {
    player: String,
    slider: VolumeSlider,
}

/// The card coordinator.
pub struct Card {
    config: Arc<CardConfig>,
    section: Section,
    active_player_id: Option<String>,
    snapshot: Arc<EntitySnapshot>,
    store: Option<Arc<Store>>,
    grouping: GroupingSection,
    loader: LoadingIndicator,
    section_switch_at: Option<Instant>,
    volume_drag: Option<VolumeDrag>,
    commands: Arc<dyn MediaCommands>,
    emitter: Arc<dyn EventEmitter>,
}

impl Card {
    /// Creates a card with an empty roster. `config` is expected normalized.
    pub fn new(
        config: CardConfig,
        commands: Arc<dyn MediaCommands>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        let section = config.initial_section();
        log::info!("[Card] Starting on section {}", section);
        Self {
            config: Arc::new(config),
            section,
            active_player_id: None,
            snapshot: Arc::new(EntitySnapshot::default()),
            store: None,
            grouping: GroupingSection::default(),
            loader: LoadingIndicator::new(),
            section_switch_at: None,
            volume_drag: None,
            commands,
            emitter,
        }
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn active_player_id(&self) -> Option<&str> {
        self.active_player_id.as_deref()
    }

    /// The store of the current pass, `None` while there are no players.
    pub fn store(&self) -> Option<&Arc<Store>> {
        self.store.as_ref()
    }

    pub fn grouping(&self) -> &GroupingSection {
        &self.grouping
    }

    pub fn is_loader_visible(&self) -> bool {
        self.loader.is_visible()
    }

    /// Replaces the roster with the latest host truth.
    pub fn update_snapshot(&mut self, snapshot: EntitySnapshot) {
        self.snapshot = Arc::new(snapshot);
        self.rebuild_store();
    }

    /// Replaces the roster from raw host states.
    pub fn update_states(&mut self, states: &[EntityState]) {
        let snapshot = EntitySnapshot::from_states(states, &self.config);
        self.update_snapshot(snapshot);
    }

    /// Navigates to `section` if the configuration allows it.
    pub fn show_section(&mut self, section: Section) -> bool {
        if !self.config.allows_section(section) {
            log::debug!("[Card] Section {} is not configured", section);
            return false;
        }
        self.set_section(section);
        true
    }

    /// Makes `entity_id` the active player.
    ///
    /// Pending grouping edits belong to the previous player and are
    /// dropped. Returns whether anything changed.
    pub fn set_active_player(&mut self, entity_id: &str) -> CardResult<bool> {
        if self.active_player_id.as_deref() == Some(entity_id) {
            return Ok(false);
        }
        if self.snapshot.get(entity_id).is_none() {
            return Err(CardError::PlayerNotFound(entity_id.to_string()));
        }

        log::info!("[Card] Active player changed to {}", entity_id);
        self.active_player_id = Some(entity_id.to_string());
        self.grouping.cancel();
        self.volume_drag = None;
        if self.config.lists_section(Section::Player) && self.section != Section::Player {
            self.section = Section::Player;
            self.emit_section();
        }
        self.rebuild_store();
        self.emit(CardEvent::ActivePlayerChanged {
            entity_id: entity_id.to_string(),
            timestamp: now_millis(),
        });
        Ok(true)
    }

    /// Forgets the chosen player and falls back to the default one.
    pub fn reset_active_player(&mut self) {
        self.active_player_id = None;
        self.grouping.cancel();
        self.volume_drag = None;
        self.rebuild_store();
    }

    /// Schedules the switch to the player section after a media pick.
    pub fn on_media_item_selected(&mut self, now: Instant) {
        if self.config.lists_section(Section::Player) {
            self.section_switch_at = Some(now + MEDIA_SELECTION_SWITCH_DELAY);
        }
    }

    /// Feeds a command lifecycle event to the loading indicator.
    ///
    /// With an explicit section list, only commands issued from the
    /// visible section count.
    pub fn on_command_event(&mut self, event: &CommandEvent, now: Instant) {
        let change = match event {
            CommandEvent::Started {
                command_id,
                section,
                ..
            } => {
                if self.config.sections.is_some() && *section != self.section {
                    log::trace!("[Card] Ignoring command from section {}", section);
                    return;
                }
                self.loader.command_started(command_id, now)
            }
            CommandEvent::Finished { command_id, .. } => {
                self.loader.command_finished(command_id, now)
            }
        };
        self.emit_loader(change);
    }

    /// Runs every timed transition that is due at `now`.
    pub fn advance(&mut self, now: Instant) {
        let change = self.loader.advance(now);
        self.emit_loader(change);

        if self.section_switch_at.is_some_and(|at| now >= at) {
            self.section_switch_at = None;
            self.set_section(Section::Player);
        }
    }

    /// The earliest instant at which [`Card::advance`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.loader.next_deadline(), self.section_switch_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Whether the visible content changes with wall-clock time.
    pub fn tracks_progress(&self) -> bool {
        self.section == Section::Player
            && self.store.as_ref().is_some_and(|store| {
                let active = store.active_player();
                active.is_playing() && active.snapshot().media.duration.is_some_and(|d| d > 0.0)
            })
    }

    /// Applies a user action, returning host work to run, if any.
    pub fn handle_action(
        &mut self,
        action: UserAction,
        now: Instant,
    ) -> CardResult<Option<CardCommand>> {
        log::debug!("[Card] Handling {:?}", action);
        match &action {
            UserAction::ShowSection { section } => {
                self.show_section(*section);
                return Ok(None);
            }
            UserAction::SelectActivePlayer { entity_id } => {
                self.set_active_player(entity_id)?;
                return Ok(None);
            }
            _ => {}
        }

        let store = self.store.clone().ok_or(CardError::NoPlayers)?;
        let is_grouping_edit = action.is_grouping_edit();
        let card_action = self.decide(&store, action, now)?;

        if is_grouping_edit && self.grouping.needs_auto_apply(&self.config) {
            return self.apply_grouping(&store);
        }
        Ok(match card_action {
            Decision::None => None,
            Decision::Action(action) => Some(CardCommand::new(store, action)),
            Decision::Command(command) => Some(command),
        })
    }

    /// Renders the whole card.
    pub fn render(&self, now: DateTime<Utc>) -> CardView {
        let content = match &self.store {
            Some(store) => {
                let target = volume_player(store);
                let context = RenderContext {
                    grouping: &self.grouping,
                    volume_drag: self
                        .volume_drag
                        .as_ref()
                        .filter(|drag| drag.player == target.id())
                        .map(|drag| &drag.slider),
                    now,
                };
                CardContent::Section(render_section(store, &context))
            }
            None => CardContent::NoPlayers {
                message: if self.config.is_sonos_card() {
                    NO_SONOS_PLAYERS_TEXT
                } else {
                    NO_PLAYERS_TEXT
                }
                .to_string(),
            },
        };

        CardView {
            title: self.config.title.clone(),
            section: self.section,
            footer: self
                .config
                .shows_footer()
                .then(|| self.config.available_sections()),
            loader_visible: self.loader.is_visible(),
            active_player: self.active_player_id.clone(),
            content,
        }
    }

    fn decide(&mut self, store: &Arc<Store>, action: UserAction, now: Instant) -> CardResult<Decision> {
        let active = store.active_player();
        let config = store.config();

        let decision = match action {
            UserAction::ShowSection { .. } | UserAction::SelectActivePlayer { .. } => {
                Decision::None
            }
            UserAction::ToggleGroupingItem { player } => {
                self.grouping.toggle(store, &player)?;
                Decision::None
            }
            UserAction::SelectPredefinedGroup { name } => {
                self.grouping.select_predefined_group(store, &name)?;
                Decision::None
            }
            UserAction::SelectAll => {
                self.grouping.select_all(store);
                Decision::None
            }
            UserAction::DeselectAll => {
                self.grouping.deselect_all(store);
                Decision::None
            }
            UserAction::CancelGrouping => {
                self.grouping.cancel();
                Decision::None
            }
            UserAction::ApplyGrouping => match self.apply_grouping(store)? {
                Some(command) => Decision::Command(command),
                None => Decision::None,
            },
            UserAction::MutePlayer { player } => self
                .grouping
                .mute_player(store, &player)?
                .map_or(Decision::None, Decision::Action),
            UserAction::SetVolume {
                player,
                volume,
                apply_to_members,
            } => {
                store.require_player(&player)?;
                Decision::Action(CardAction::SetVolume {
                    player,
                    volume,
                    apply_to_members,
                })
            }
            UserAction::ToggleMute {
                player,
                apply_to_members,
            } => {
                store.require_player(&player)?;
                Decision::Action(CardAction::ToggleMute {
                    player,
                    apply_to_members,
                })
            }
            UserAction::VolumeUp => Decision::Action(CardAction::VolumeUp {
                player: volume_player(store).id().to_string(),
                apply_to_members: updates_member_volumes(config),
            }),
            UserAction::VolumeDown => Decision::Action(CardAction::VolumeDown {
                player: volume_player(store).id().to_string(),
                apply_to_members: updates_member_volumes(config),
            }),
            UserAction::VolumeSlider { input } => self
                .handle_volume_slider(store, input)
                .map_or(Decision::None, Decision::Action),
            UserAction::PlayPause => {
                let control = if !active.is_playing() {
                    TransportControl::Play
                } else if config.stop_instead_of_pause {
                    TransportControl::Stop
                } else {
                    TransportControl::Pause
                };
                Decision::Action(CardAction::Transport {
                    player: active.id().to_string(),
                    control,
                })
            }
            UserAction::Transport { control } => Decision::Action(CardAction::Transport {
                player: active.id().to_string(),
                control,
            }),
            UserAction::Rewind => Decision::Action(CardAction::Seek {
                player: active.id().to_string(),
                position: rewind_target(&active.snapshot().media, config.seek_step_seconds()),
            }),
            UserAction::FastForward => Decision::Action(CardAction::Seek {
                player: active.id().to_string(),
                position: fast_forward_target(&active.snapshot().media, config.seek_step_seconds()),
            }),
            UserAction::Seek { offset_x, width } => {
                let duration = active.snapshot().media.duration.unwrap_or(0.0);
                seek_position(duration, offset_x, width).map_or(Decision::None, |position| {
                    Decision::Action(CardAction::Seek {
                        player: active.id().to_string(),
                        position,
                    })
                })
            }
            UserAction::PlayMedia { media } => {
                self.on_media_item_selected(now);
                Decision::Action(CardAction::PlayMedia {
                    player: active.id().to_string(),
                    media,
                })
            }
        };
        Ok(decision)
    }

    fn apply_grouping(&mut self, store: &Arc<Store>) -> CardResult<Option<CardCommand>> {
        let apply = self.grouping.plan(store)?;
        if apply.plan.is_empty() && apply.follow_active_player.is_none() {
            log::debug!("[Card] Nothing to apply");
            return Ok(None);
        }
        let command = CardCommand::new(
            Arc::clone(store),
            CardAction::ApplyGrouping { plan: apply.plan },
        )
        .with_follow_active_player(apply.follow_active_player);
        Ok(Some(command))
    }

    fn handle_volume_slider(&mut self, store: &Store, input: SliderInput) -> Option<CardAction> {
        let target = volume_player(store);
        let mut drag = match self.volume_drag.take() {
            Some(drag) if drag.player == target.id() => drag,
            _ => VolumeDrag {
                player: target.id().to_string(),
                slider: VolumeSlider::for_player(target, store.config()),
            },
        };

        match drag.slider.handle(input) {
            SliderOutcome::Commit(volume) => Some(CardAction::SetVolume {
                player: drag.player,
                volume,
                apply_to_members: updates_member_volumes(store.config()),
            }),
            SliderOutcome::Aborted => {
                log::debug!("[Card] Volume drag aborted");
                None
            }
            SliderOutcome::Preview(_) | SliderOutcome::Ignored => {
                if drag.slider.is_dragging() {
                    self.volume_drag = Some(drag);
                }
                None
            }
        }
    }

    fn set_section(&mut self, section: Section) {
        if self.section == section {
            return;
        }
        self.section = section;
        self.emit_section();
        self.rebuild_store();
    }

    fn build_store(&self, active_player_id: Option<&str>) -> CardResult<Store> {
        Store::new(
            Arc::clone(&self.snapshot),
            Arc::clone(&self.config),
            self.section,
            active_player_id,
            Arc::clone(&self.commands),
            Arc::clone(&self.emitter),
        )
    }

    fn rebuild_store(&mut self) {
        let mut result = self.build_store(self.active_player_id.as_deref());
        let mut fell_back = false;
        if let Err(CardError::ActivePlayerNotFound(id)) = &result {
            log::warn!("[Card] Active player {} disappeared, using default", id);
            self.active_player_id = None;
            self.grouping.cancel();
            self.volume_drag = None;
            fell_back = true;
            result = self.build_store(None);
        }

        match result {
            Ok(store) => {
                if self.active_player_id.is_none() {
                    let id = store.active_player().id().to_string();
                    self.active_player_id = Some(id.clone());
                    // The first assignment on an empty card stays silent
                    if fell_back {
                        self.emit(CardEvent::ActivePlayerChanged {
                            entity_id: id,
                            timestamp: now_millis(),
                        });
                    }
                }
                self.store = Some(Arc::new(store));
            }
            Err(e) => {
                log::debug!("[Card] No store: {}", e);
                self.store = None;
                self.active_player_id = None;
            }
        }
    }

    fn emit(&self, event: CardEvent) {
        self.emitter.emit_card(event);
    }

    fn emit_section(&self) {
        self.emit(CardEvent::SectionChanged {
            section: self.section,
            timestamp: now_millis(),
        });
    }

    fn emit_loader(&self, change: Option<bool>) {
        if let Some(visible) = change {
            self.emit(CardEvent::LoaderVisibilityChanged {
                visible,
                timestamp: now_millis(),
            });
        }
    }
}

enum Decision {
    None,
    Action(CardAction),
    Command(CardCommand),
}
