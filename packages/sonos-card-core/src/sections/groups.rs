//! Groups section: one entry per group or standalone player.

use serde::Serialize;

use crate::store::Store;

use super::PlayerSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub leader: PlayerSummary,
    pub members: Vec<PlayerSummary>,
    /// Whether the active player is part of this group.
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsView {
    pub groups: Vec<GroupView>,
}

/// Lists every player that does not follow another, in roster order.
pub fn render_groups(store: &Store) -> GroupsView {
    let active = store.active_player();
    let groups = store
        .all_players()
        .into_iter()
        .filter(|player| player.leader().is_none())
        .map(|leader| GroupView {
            is_active: leader == active || leader.has_member(active.id()),
            members: leader.members().into_iter().map(Into::into).collect(),
            leader: leader.into(),
        })
        .collect();
    GroupsView { groups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CardConfig, Section};
    use crate::sections::test_support::store_for;
    use crate::snapshot::{EntitySnapshot, PlayerSnapshot};

    #[test]
    fn followers_are_listed_under_their_leader() {
        let roster = EntitySnapshot::new(vec![
            PlayerSnapshot::new("b", "Bravo"),
            PlayerSnapshot::new("a", "Alpha").with_members(["b"]),
            PlayerSnapshot::new("c", "Charlie"),
        ]);
        let store = store_for(roster, CardConfig::default(), Section::Groups, Some("b"));
        let view = render_groups(&store);

        let leaders: Vec<_> = view.groups.iter().map(|g| g.leader.id.as_str()).collect();
        assert_eq!(leaders, vec!["a", "c"]);
        assert_eq!(view.groups[0].members[0].id, "b");
        assert!(view.groups[0].is_active);
        assert!(!view.groups[1].is_active);
    }
}
