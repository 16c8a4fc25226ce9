//! Per-render grouping view-model.

use crate::player::Player;
use crate::snapshot::{EntitySnapshot, MediaPlayerFeature};
use crate::utils::name_key;

use super::pending::PendingChangeSet;

/// One player's row in the grouping section.
///
/// Built fresh on every pass from the roster, the active player and the
/// pending change set. Never stored.
#[derive(Debug, Clone, Copy)]
pub struct GroupingItem<'a> {
    pub player: Player<'a>,
    pub is_main: bool,
    pub is_selected: bool,
    pub is_disabled: bool,
}

impl<'a> GroupingItem<'a> {
    /// Derives an item. Selection is current membership XOR pending toggle.
    pub fn new(player: Player<'a>, active: Player<'a>, toggled: bool) -> Self {
        let is_main = player.id() == active.id();
        let currently_grouped = is_main || active.has_member(player.id());
        let capable = is_main || player.supports(MediaPlayerFeature::GROUPING);
        Self {
            player,
            is_main,
            is_selected: currently_grouped != toggled,
            is_disabled: !capable,
        }
    }

    pub fn id(&self) -> &'a str {
        self.player.id()
    }

    pub fn name(&self) -> &'a str {
        self.player.name()
    }
}

/// Builds the grouping items for the whole roster.
///
/// When exactly one item ends up selected it is disabled so a group can't
/// be edited down to nothing. Main and selected items sort first, then by
/// case-insensitive name, with the id as the final tie-break.
pub fn build_grouping_items<'a>(
    roster: &'a EntitySnapshot,
    active: Player<'a>,
    pending: &PendingChangeSet,
) -> Vec<GroupingItem<'a>> {
    let mut items: Vec<GroupingItem<'a>> = roster
        .players()
        .iter()
        .map(|snapshot| {
            let player = Player::new(snapshot, roster);
            GroupingItem::new(player, active, pending.is_toggled(player.id()))
        })
        .collect();

    let mut selected = items.iter_mut().filter(|item| item.is_selected);
    if let (Some(lone), None) = (selected.next(), selected.next()) {
        lone.is_disabled = true;
    }

    items.sort_by_cached_key(|item| {
        (
            !(item.is_main || item.is_selected),
            name_key(item.name()),
            item.id().to_string(),
        )
    });
    items
}
