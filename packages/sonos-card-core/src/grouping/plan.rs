//! Ordered command plan for applying a grouping change.

use serde::Serialize;

use super::diff::GroupDiffResult;
use super::preset::PredefinedGroup;

/// One outbound step of a grouping apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GroupingCommand {
    Join { leader: String, members: Vec<String> },
    UnJoin { members: Vec<String> },
    ApplyPredefinedGroup { group: PredefinedGroup },
}

/// Commands derived from a [`GroupDiffResult`], in execution order.
///
/// Join runs before unjoin so a handed-off group never goes through an
/// empty state. On handoff the previous leader is released last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingPlan {
    pub diff: GroupDiffResult,
    pub previous_main_player: String,
    pub commands: Vec<GroupingCommand>,
}

impl GroupingPlan {
    /// Builds the plan.
    ///
    /// `selected` are the ids of every selected item, in item order.
    pub fn new(
        diff: GroupDiffResult,
        active: &str,
        selected: &[&str],
        predefined_group: Option<PredefinedGroup>,
    ) -> Self {
        let handoff = diff.new_main_player != active;
        let mut commands = Vec::new();

        // A new leader also has to pull in the members that were already
        // grouped with the old one, even when nobody new joins.
        let members: Vec<String> = if handoff {
            selected
                .iter()
                .filter(|id| **id != diff.new_main_player && **id != active)
                .map(|id| id.to_string())
                .collect()
        } else {
            diff.join.clone()
        };
        if !members.is_empty() {
            commands.push(GroupingCommand::Join {
                leader: diff.new_main_player.clone(),
                members,
            });
        }

        let mut un_join = diff.un_join.clone();
        if handoff && !un_join.iter().any(|id| id == active) {
            un_join.push(active.to_string());
        }
        if !un_join.is_empty() {
            commands.push(GroupingCommand::UnJoin { members: un_join });
        }

        if let Some(group) = predefined_group {
            commands.push(GroupingCommand::ApplyPredefinedGroup { group });
        }

        Self {
            diff,
            previous_main_player: active.to_string(),
            commands,
        }
    }

    pub fn is_handoff(&self) -> bool {
        self.diff.new_main_player != self.previous_main_player
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The group the active player's topology converges to, sorted.
    ///
    /// `joined` is the current group of the previous main player.
    pub fn resulting_group(&self, joined: &[String]) -> Vec<String> {
        let mut group: Vec<String> = joined.to_vec();
        if !group.contains(&self.previous_main_player) {
            group.push(self.previous_main_player.clone());
        }
        for command in &self.commands {
            match command {
                GroupingCommand::Join { leader, members } => {
                    for id in std::iter::once(leader).chain(members) {
                        if !group.contains(id) {
                            group.push(id.clone());
                        }
                    }
                }
                GroupingCommand::UnJoin { members } => {
                    group.retain(|id| !members.contains(id));
                }
                GroupingCommand::ApplyPredefinedGroup { .. } => {}
            }
        }
        if !group.contains(&self.diff.new_main_player) {
            group.push(self.diff.new_main_player.clone());
        }
        group.sort();
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::preset::PredefinedGroupPlayer;
    use crate::grouping::{
        build_grouping_items, compute_diff, select_predefined_group, toggle_item, PendingChangeSet,
    };
    use crate::player::Player;
    use crate::snapshot::{EntitySnapshot, PlayerSnapshot};

    fn roster() -> EntitySnapshot {
        EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "Alpha").with_members(["b"]),
            PlayerSnapshot::new("b", "Bravo"),
            PlayerSnapshot::new("c", "Charlie"),
            PlayerSnapshot::new("d", "Delta"),
        ])
    }

    fn preset(ids: &[&str]) -> PredefinedGroup {
        PredefinedGroup {
            name: ids.join("+"),
            entities: ids
                .iter()
                .map(|id| PredefinedGroupPlayer { id: id.to_string(), volume: Some(20) })
                .collect(),
            media: None,
        }
    }

    fn plan_for(roster: &EntitySnapshot, group: &PredefinedGroup) -> (GroupingPlan, Vec<String>) {
        let active = Player::new(roster.get("a").unwrap(), roster);
        let joined: Vec<String> = active.group_ids().iter().map(|id| id.to_string()).collect();
        let mut pending = PendingChangeSet::default();
        let items = build_grouping_items(roster, active, &pending);
        select_predefined_group(&mut pending, &items, group);

        let items = build_grouping_items(roster, active, &pending);
        let selected: Vec<&str> = items.iter().filter(|i| i.is_selected).map(|i| i.id()).collect();
        let diff = compute_diff(&items, &joined, "a").unwrap();
        let plan = GroupingPlan::new(diff, "a", &selected, pending.take());
        (plan, joined)
    }

    #[test]
    fn predefined_group_round_trip() {
        let roster = roster();
        for ids in [
            vec!["a", "c"],
            vec!["b", "c"],
            vec!["c", "d"],
            vec!["a", "b", "c", "d"],
            vec!["d"],
        ] {
            let group = preset(&ids);
            let (plan, joined) = plan_for(&roster, &group);
            assert_eq!(plan.resulting_group(&joined), ids, "preset {ids:?}");
            assert!(matches!(
                plan.commands.last(),
                Some(GroupingCommand::ApplyPredefinedGroup { .. })
            ));
        }
    }

    #[test]
    fn join_precedes_unjoin() {
        let (plan, _) = plan_for(&roster(), &preset(&["a", "c"]));
        assert_eq!(
            plan.commands[..2],
            [
                GroupingCommand::Join {
                    leader: "a".into(),
                    members: vec!["c".into()]
                },
                GroupingCommand::UnJoin {
                    members: vec!["b".into()]
                },
            ]
        );
        assert!(!plan.is_handoff());
    }

    #[test]
    fn handoff_releases_previous_leader() {
        let (plan, _) = plan_for(&roster(), &preset(&["b", "c"]));
        assert!(plan.is_handoff());
        assert_eq!(plan.diff.new_main_player, "b");
        assert_eq!(
            plan.commands[..2],
            [
                GroupingCommand::Join {
                    leader: "b".into(),
                    members: vec!["c".into()]
                },
                GroupingCommand::UnJoin {
                    members: vec!["a".into()]
                },
            ]
        );
    }

    #[test]
    fn handoff_to_existing_member_makes_it_lead() {
        let roster = EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "Alpha").with_members(["b", "c"]),
            PlayerSnapshot::new("b", "Bravo"),
            PlayerSnapshot::new("c", "Charlie"),
        ]);
        let active = Player::new(roster.get("a").unwrap(), &roster);
        let joined: Vec<String> = active.group_ids().iter().map(|id| id.to_string()).collect();
        let mut pending = PendingChangeSet::default();
        let items = build_grouping_items(&roster, active, &pending);
        let main = items.iter().find(|i| i.id() == "a").unwrap();
        toggle_item(&mut pending, main);

        let items = build_grouping_items(&roster, active, &pending);
        let selected: Vec<&str> = items.iter().filter(|i| i.is_selected).map(|i| i.id()).collect();
        let diff = compute_diff(&items, &joined, "a").unwrap();
        assert!(diff.join.is_empty());
        let plan = GroupingPlan::new(diff, "a", &selected, None);

        assert_eq!(plan.diff.new_main_player, "b");
        assert_eq!(
            plan.commands,
            vec![
                GroupingCommand::Join {
                    leader: "b".into(),
                    members: vec!["c".into()]
                },
                GroupingCommand::UnJoin {
                    members: vec!["a".into()]
                },
            ]
        );
        assert_eq!(plan.resulting_group(&joined), vec!["b", "c"]);
    }

    #[test]
    fn empty_diff_yields_empty_plan() {
        let diff = GroupDiffResult {
            un_join: vec![],
            join: vec![],
            new_main_player: "a".into(),
        };
        let plan = GroupingPlan::new(diff, "a", &["a"], None);
        assert!(plan.is_empty());
    }
}
