//! Grouping section.
//!
//! Owns the pending change set and turns user edits into a
//! [`GroupingPlan`]. Items are re-derived from the store on every call, so
//! a host update between two clicks is always honored.

use serde::Serialize;

use crate::action::CardAction;
use crate::config::CardConfig;
use crate::error::{CardError, CardResult};
use crate::grouping::{
    build_grouping_items, compute_diff, deselect_all, select_all, select_predefined_group,
    toggle_item, GroupingItem, GroupingPlan, PendingChangeSet,
};
use crate::store::Store;

use super::VolumeControlView;

/// Tick count of the per-row sliders.
const ROW_SLIDER_TICK_COUNT: usize = 12;

/// A computed grouping apply, ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingApply {
    pub plan: GroupingPlan,
    /// Player to make active once the plan has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_active_player: Option<String>,
}

/// One row of the grouping section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingItemView {
    pub id: String,
    pub name: String,
    pub is_main: bool,
    pub is_selected: bool,
    pub is_disabled: bool,
    pub volume: VolumeControlView,
}

impl From<&GroupingItem<'_>> for GroupingItemView {
    fn from(item: &GroupingItem<'_>) -> Self {
        Self {
            id: item.id().to_string(),
            name: item.name().to_string(),
            is_main: item.is_main,
            is_selected: item.is_selected,
            is_disabled: item.is_disabled,
            volume: VolumeControlView::fixed_range(
                item.player,
                item.is_disabled,
                ROW_SLIDER_TICK_COUNT,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedGroupView {
    pub name: String,
    pub selected: bool,
}

/// Rendered grouping section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingView {
    pub items: Vec<GroupingItemView>,
    pub predefined_groups: Vec<PredefinedGroupView>,
    pub show_group_all: bool,
    pub show_ungroup_all: bool,
    /// Apply and cancel are only offered when edits are not auto-applied.
    pub show_apply_buttons: bool,
}

/// Ids grouped with the active player, active included, in roster order.
pub fn joined_players(store: &Store) -> Vec<String> {
    let active = store.active_player();
    store
        .all_players()
        .into_iter()
        .filter(|p| *p == active || active.has_member(p.id()))
        .map(|p| p.id().to_string())
        .collect()
}

/// Ids not grouped with the active player, in roster order.
pub fn not_joined_players(store: &Store) -> Vec<String> {
    let active = store.active_player();
    store
        .all_players()
        .into_iter()
        .filter(|p| *p != active && !active.has_member(p.id()))
        .map(|p| p.id().to_string())
        .collect()
}

/// Pending grouping edits of the card.
#[derive(Debug, Clone, Default)]
pub struct GroupingSection {
    pending: PendingChangeSet,
}

impl GroupingSection {
    pub fn pending(&self) -> &PendingChangeSet {
        &self.pending
    }

    pub fn items<'a>(&self, store: &'a Store) -> Vec<GroupingItem<'a>> {
        build_grouping_items(store.snapshot(), store.active_player(), &self.pending)
    }

    /// Toggles the row of `player`. Disabled rows are left alone.
    pub fn toggle(&mut self, store: &Store, player: &str) -> CardResult<()> {
        let items = self.items(store);
        let item = items
            .iter()
            .find(|item| item.id() == player)
            .ok_or_else(|| CardError::PlayerNotFound(player.to_string()))?;
        toggle_item(&mut self.pending, item);
        Ok(())
    }

    pub fn select_predefined_group(&mut self, store: &Store, name: &str) -> CardResult<()> {
        let group = store
            .find_predefined_group(name)
            .ok_or_else(|| CardError::InvalidConfig(format!("unknown predefined group '{name}'")))?;
        let items = self.items(store);
        select_predefined_group(&mut self.pending, &items, group);
        Ok(())
    }

    pub fn select_all(&mut self, store: &Store) {
        let items = self.items(store);
        select_all(&mut self.pending, &items);
    }

    pub fn deselect_all(&mut self, store: &Store) {
        let items = self.items(store);
        deselect_all(&mut self.pending, &items);
    }

    pub fn cancel(&mut self) {
        self.pending.clear();
    }

    /// Whether pending edits should be applied without an apply click.
    pub fn needs_auto_apply(&self, config: &CardConfig) -> bool {
        config.skip_apply_button_when_grouping && self.pending.has_changes()
    }

    /// Computes the plan for the pending edits and clears them.
    ///
    /// The player to follow is the new leader when leadership moved, unless
    /// switching is disabled. With switching disabled, the configured
    /// `entityId` is followed instead if it was just unjoined.
    pub fn plan(&mut self, store: &Store) -> CardResult<GroupingApply> {
        let active = store.active_player();
        let items = self.items(store);
        let diff = compute_diff(&items, &store.joined_ids(), active.id())?;
        let selected: Vec<&str> = items
            .iter()
            .filter(|item| item.is_selected)
            .map(|item| item.id())
            .collect();

        let predefined_group = self.pending.take();
        let plan = GroupingPlan::new(diff, active.id(), &selected, predefined_group);

        let config = store.config();
        let follow_active_player = if plan.diff.new_main_player != active.id()
            && !config.dont_switch_player_when_grouping
        {
            Some(plan.diff.new_main_player.clone())
        } else {
            config
                .entity_id
                .as_ref()
                .filter(|id| {
                    config.dont_switch_player_when_grouping && plan.diff.un_join.contains(*id)
                })
                .cloned()
        };

        log::info!(
            "[Grouping] Planned join={:?} unjoin={:?} main={}",
            plan.diff.join,
            plan.diff.un_join,
            plan.diff.new_main_player
        );
        Ok(GroupingApply {
            plan,
            follow_active_player,
        })
    }

    /// The per-row mute of `player`, toggling that player alone.
    ///
    /// Disabled rows yield nothing.
    pub fn mute_player(&self, store: &Store, player: &str) -> CardResult<Option<CardAction>> {
        let items = self.items(store);
        let item = items
            .iter()
            .find(|item| item.id() == player)
            .ok_or_else(|| CardError::PlayerNotFound(player.to_string()))?;
        if item.is_disabled {
            log::debug!("[Grouping] Ignoring mute of disabled item {}", player);
            return Ok(None);
        }
        Ok(Some(CardAction::ToggleMute {
            player: player.to_string(),
            apply_to_members: false,
        }))
    }

    pub fn view(&self, store: &Store) -> GroupingView {
        let items = self.items(store);
        let selected_group = self.pending.selected_predefined_group();
        GroupingView {
            items: items.iter().map(GroupingItemView::from).collect(),
            predefined_groups: store
                .predefined_groups()
                .iter()
                .map(|group| PredefinedGroupView {
                    name: group.name.clone(),
                    selected: selected_group.is_some_and(|s| s.name == group.name),
                })
                .collect(),
            show_group_all: !not_joined_players(store).is_empty(),
            show_ungroup_all: !joined_players(store).is_empty(),
            show_apply_buttons: self.pending.has_changes()
                && !store.config().skip_apply_button_when_grouping,
        }
    }
}
