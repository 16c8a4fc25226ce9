//! Group-diff algorithm.
//!
//! Turns the selection state of the grouping items into the join and
//! unjoin operations that move the host topology to it. The computation is
//! a pure function of its inputs, so it can be re-run on every toggle.

use serde::Serialize;

use crate::error::{CardError, CardResult};
use crate::utils::name_key;

use super::item::GroupingItem;

/// Operations needed to reach the selected topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDiffResult {
    /// Players to remove from their group.
    pub un_join: Vec<String>,
    /// Players to add to the group led by `new_main_player`.
    pub join: Vec<String>,
    /// Leader of the group once the operations are applied.
    pub new_main_player: String,
}

impl GroupDiffResult {
    pub fn is_empty(&self) -> bool {
        self.un_join.is_empty() && self.join.is_empty()
    }
}

/// Computes the operations that move `joined` to the selection in `items`.
///
/// `joined` holds the ids currently grouped with `active`, usually
/// including `active` itself. The active player is never unjoined here.
/// If it was deselected while others stay selected, leadership goes to the
/// selected player that sorts first by case-insensitive name, then id.
///
/// Fails with [`CardError::ActivePlayerNotFound`] when `active` has no item.
pub fn compute_diff(
    items: &[GroupingItem<'_>],
    joined: &[String],
    active: &str,
) -> CardResult<GroupDiffResult> {
    let active_item = items
        .iter()
        .find(|item| item.id() == active)
        .ok_or_else(|| CardError::ActivePlayerNotFound(active.to_string()))?;

    let desired: Vec<&GroupingItem<'_>> = items
        .iter()
        .filter(|item| item.is_selected && item.id() != active)
        .collect();
    let is_desired = |id: &str| desired.iter().any(|item| item.id() == id);

    let un_join = joined
        .iter()
        .filter(|id| id.as_str() != active && !is_desired(id))
        .cloned()
        .collect();

    let join = desired
        .iter()
        .filter(|item| !joined.iter().any(|j| j == item.id()))
        .map(|item| item.id().to_string())
        .collect();

    let new_main_player = if active_item.is_selected {
        active.to_string()
    } else {
        desired
            .iter()
            .min_by_key(|item| (name_key(item.name()), item.id()))
            .map_or_else(|| active.to_string(), |item| item.id().to_string())
    };

    Ok(GroupDiffResult {
        un_join,
        join,
        new_main_player,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{build_grouping_items, toggle_item, PendingChangeSet};
    use crate::player::Player;
    use crate::snapshot::{EntitySnapshot, PlayerSnapshot};

    /// A leads B, C is standalone.
    fn roster() -> EntitySnapshot {
        EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "Alpha").with_members(["b"]),
            PlayerSnapshot::new("b", "Bravo"),
            PlayerSnapshot::new("c", "Charlie"),
        ])
    }

    fn joined(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn diff_after(roster: &EntitySnapshot, toggles: &[&str]) -> GroupDiffResult {
        let active = Player::new(roster.get("a").unwrap(), roster);
        let mut pending = PendingChangeSet::default();
        for id in toggles {
            pending.toggle(id);
        }
        let items = build_grouping_items(roster, active, &pending);
        compute_diff(&items, &joined(&["a", "b"]), "a").unwrap()
    }

    #[test]
    fn adding_standalone_player_joins_it() {
        let diff = diff_after(&roster(), &["c"]);
        assert_eq!(diff.join, vec!["c"]);
        assert!(diff.un_join.is_empty());
        assert_eq!(diff.new_main_player, "a");
    }

    #[test]
    fn removing_last_member_unjoins_it() {
        let diff = diff_after(&roster(), &["b"]);
        assert_eq!(diff.un_join, vec!["b"]);
        assert!(diff.join.is_empty());
        assert_eq!(diff.new_main_player, "a");
    }

    #[test]
    fn leader_is_preserved_while_selected() {
        let diff = diff_after(&roster(), &["b", "c"]);
        assert_eq!(diff.new_main_player, "a");
    }

    #[test]
    fn leader_handoff_picks_first_by_name() {
        let roster = EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "Alpha").with_members(["b", "c"]),
            PlayerSnapshot::new("c", "charlie"),
            PlayerSnapshot::new("b", "Bravo"),
        ]);
        let active = Player::new(roster.get("a").unwrap(), &roster);
        let mut pending = PendingChangeSet::default();
        pending.toggle("a");
        let items = build_grouping_items(&roster, active, &pending);

        let diff = compute_diff(&items, &joined(&["b", "c"]), "a").unwrap();
        assert!(diff.join.is_empty());
        assert!(diff.un_join.is_empty());
        assert_eq!(diff.new_main_player, "b");

        // Same outcome when the current group is reported with its leader
        let diff = compute_diff(&items, &joined(&["a", "b", "c"]), "a").unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.new_main_player, "b");
    }

    #[test]
    fn deselecting_everything_keeps_original_leader() {
        let roster = roster();
        let active = Player::new(roster.get("a").unwrap(), &roster);
        let mut pending = PendingChangeSet::default();
        pending.toggle("a");
        pending.toggle("b");
        let items = build_grouping_items(&roster, active, &pending);

        let diff = compute_diff(&items, &joined(&["a", "b"]), "a").unwrap();
        assert_eq!(diff.un_join, vec!["b"]);
        assert!(diff.join.is_empty());
        assert_eq!(diff.new_main_player, "a");
    }

    #[test]
    fn unknown_active_player_fails_fast() {
        let roster = roster();
        let active = Player::new(roster.get("a").unwrap(), &roster);
        let items = build_grouping_items(&roster, active, &PendingChangeSet::default());
        let err = compute_diff(&items, &joined(&["a"]), "media_player.gone").unwrap_err();
        assert!(matches!(err, CardError::ActivePlayerNotFound(id) if id == "media_player.gone"));
    }

    #[test]
    fn diff_is_pure_and_disjoint() {
        let roster = EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "Alpha").with_members(["b", "d"]),
            PlayerSnapshot::new("b", "Bravo"),
            PlayerSnapshot::new("c", "Charlie"),
            PlayerSnapshot::new("d", "Delta"),
            PlayerSnapshot::new("e", "Echo"),
        ]);
        let active = Player::new(roster.get("a").unwrap(), &roster);
        let current = joined(&["a", "b", "d"]);
        let ids = ["a", "b", "c", "d", "e"];

        // Every subset of toggles
        for mask in 0u32..(1 << ids.len()) {
            let mut pending = PendingChangeSet::default();
            for (bit, id) in ids.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    pending.toggle(id);
                }
            }
            let items = build_grouping_items(&roster, active, &pending);
            let first = compute_diff(&items, &current, "a").unwrap();
            let second = compute_diff(&items, &current, "a").unwrap();
            assert_eq!(first, second);
            assert!(first.join.iter().all(|id| !first.un_join.contains(id)));

            let selected: Vec<_> = items.iter().filter(|i| i.is_selected).map(|i| i.id()).collect();
            if selected.contains(&"a") {
                assert_eq!(first.new_main_player, "a");
            } else if let Some(first_selected) = selected.first() {
                assert_eq!(first.new_main_player, *first_selected);
            }
        }
    }

    #[test]
    fn lone_selection_is_disabled_and_toggle_is_noop() {
        let roster = roster();
        let active = Player::new(roster.get("a").unwrap(), &roster);
        let mut pending = PendingChangeSet::default();

        let items = build_grouping_items(&roster, active, &pending);
        let alpha = items.iter().find(|i| i.id() == "a").unwrap();
        toggle_item(&mut pending, alpha);

        // Only B is left selected
        let items = build_grouping_items(&roster, active, &pending);
        let disabled: Vec<_> = items.iter().filter(|i| i.is_disabled).map(|i| i.id()).collect();
        assert_eq!(disabled, vec!["b"]);

        let before = pending.clone();
        let bravo = items.iter().find(|i| i.id() == "b").unwrap();
        toggle_item(&mut pending, bravo);
        assert_eq!(pending, before);
    }
}
