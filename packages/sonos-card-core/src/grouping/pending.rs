//! Pending, not yet applied, grouping edits.
//!
//! Edits are stored as toggles against the current topology. Because a
//! toggle is an XOR, the resulting selection depends only on which ids
//! were toggled an odd number of times, never on the order.

use super::item::GroupingItem;
use super::preset::PredefinedGroup;

/// User-entered grouping selections waiting to be applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChangeSet {
    toggled: Vec<String>,
    selected_predefined_group: Option<PredefinedGroup>,
}

impl PendingChangeSet {
    /// Ids toggled away from the current topology, in toggle order.
    pub fn toggled(&self) -> &[String] {
        &self.toggled
    }

    pub fn is_toggled(&self, id: &str) -> bool {
        self.toggled.iter().any(|t| t == id)
    }

    pub fn selected_predefined_group(&self) -> Option<&PredefinedGroup> {
        self.selected_predefined_group.as_ref()
    }

    /// True when there is something to apply.
    pub fn has_changes(&self) -> bool {
        !self.toggled.is_empty() || self.selected_predefined_group.is_some()
    }

    /// Flips one id. Any ad-hoc edit invalidates the selected preset.
    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.toggled.iter().position(|t| t == id) {
            self.toggled.remove(pos);
        } else {
            self.toggled.push(id.to_string());
        }
        self.selected_predefined_group = None;
    }

    /// Drops every pending edit.
    pub fn clear(&mut self) {
        self.toggled.clear();
        self.selected_predefined_group = None;
    }

    /// Empties the set, handing back the preset that was selected.
    pub fn take(&mut self) -> Option<PredefinedGroup> {
        self.toggled.clear();
        self.selected_predefined_group.take()
    }
}

/// Toggles one item. Disabled items are left untouched.
pub fn toggle_item(pending: &mut PendingChangeSet, item: &GroupingItem<'_>) {
    if item.is_disabled {
        log::debug!("[Grouping] Ignoring toggle of disabled item {}", item.id());
        return;
    }
    pending.toggle(item.id());
}

/// Replays toggles so the selection matches the preset exactly, then
/// records the preset.
///
/// The disabled check is skipped here: a preset may legitimately leave the
/// current main player out.
pub fn select_predefined_group(
    pending: &mut PendingChangeSet,
    items: &[GroupingItem<'_>],
    group: &PredefinedGroup,
) {
    for item in items {
        if group.contains(item.id()) != item.is_selected {
            pending.toggle(item.id());
        }
    }
    pending.selected_predefined_group = Some(group.clone());
}

/// Selects every unselected, enabled item.
pub fn select_all(pending: &mut PendingChangeSet, items: &[GroupingItem<'_>]) {
    for item in items.iter().filter(|item| !item.is_selected) {
        toggle_item(pending, item);
    }
}

/// Deselects every selected non-main item and reselects the main item if
/// it was toggled out.
pub fn deselect_all(pending: &mut PendingChangeSet, items: &[GroupingItem<'_>]) {
    for item in items.iter().filter(|item| item.is_main != item.is_selected) {
        toggle_item(pending, item);
    }
}
