//! Player abstraction over one roster entry.
//!
//! [`Player`] pairs a [`PlayerSnapshot`] with the roster it came from so that
//! membership questions (who leads, who follows) can be answered without the
//! caller walking the snapshot itself. All queries are pure.

use crate::snapshot::{EntitySnapshot, MediaPlayerFeature, PlaybackState, PlayerSnapshot};

/// Which mute flag a caller is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteScope {
    /// The player's own mute flag.
    Player,
    /// The mute state of the group the player belongs to. For a follower
    /// this is answered by its leader.
    Group,
}

/// A borrowed view of one player inside a roster.
#[derive(Debug, Clone, Copy)]
pub struct Player<'a> {
    snapshot: &'a PlayerSnapshot,
    roster: &'a EntitySnapshot,
}

impl<'a> Player<'a> {
    pub fn new(snapshot: &'a PlayerSnapshot, roster: &'a EntitySnapshot) -> Self {
        Self { snapshot, roster }
    }

    pub fn id(&self) -> &'a str {
        &self.snapshot.id
    }

    pub fn name(&self) -> &'a str {
        &self.snapshot.name
    }

    pub fn snapshot(&self) -> &'a PlayerSnapshot {
        self.snapshot
    }

    pub fn get_volume(&self) -> u8 {
        self.snapshot.volume
    }

    /// True when this player's volume must not be surfaced on its own.
    pub fn ignore_volume(&self) -> bool {
        self.snapshot.may_be_ignored_for_volume
    }

    pub fn is_muted(&self, scope: MuteScope) -> bool {
        match scope {
            MuteScope::Player => self.snapshot.muted,
            MuteScope::Group => {
                if let Some(leader) = self.leader() {
                    return leader.is_muted(MuteScope::Group);
                }
                self.snapshot.muted
                    && self
                        .members()
                        .iter()
                        .filter(|m| !m.ignore_volume())
                        .all(|m| m.is_muted(MuteScope::Player))
            }
        }
    }

    pub fn has_member(&self, id: &str) -> bool {
        self.snapshot.members.iter().any(|m| m == id)
    }

    /// Resolves a member of this player's group.
    ///
    /// Returns `None` when `id` is not a member, or when it is listed but
    /// no longer present in the roster. Callers skip the operation.
    pub fn get_member(&self, id: &str) -> Option<Player<'a>> {
        if !self.has_member(id) {
            return None;
        }
        self.roster.get(id).map(|s| Player::new(s, self.roster))
    }

    /// Resolved members, excluding this player. Missing ids are skipped.
    pub fn members(&self) -> Vec<Player<'a>> {
        self.snapshot
            .members
            .iter()
            .filter_map(|id| self.roster.get(id))
            .map(|s| Player::new(s, self.roster))
            .collect()
    }

    /// This player followed by its resolved members.
    pub fn group(&self) -> Vec<Player<'a>> {
        let mut group = vec![*self];
        group.extend(self.members());
        group
    }

    /// Ids of this player and its members, leader first.
    pub fn group_ids(&self) -> Vec<&'a str> {
        std::iter::once(self.id())
            .chain(self.snapshot.members.iter().map(String::as_str))
            .collect()
    }

    /// The leader of the group this player follows, if any.
    pub fn leader(&self) -> Option<Player<'a>> {
        self.roster
            .leader_of(self.id())
            .map(|s| Player::new(s, self.roster))
    }

    pub fn is_leader(&self) -> bool {
        self.snapshot.is_leader()
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.state == PlaybackState::Playing
    }

    pub fn supports(&self, feature: MediaPlayerFeature) -> bool {
        self.snapshot.features.contains(feature)
    }
}

impl PartialEq for Player<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot.id == other.snapshot.id
    }
}

impl Eq for Player<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> EntitySnapshot {
        EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "Alpha")
                .with_volume(40)
                .with_muted(true)
                .with_members(["b", "gone", "sat"]),
            PlayerSnapshot::new("b", "Bravo").with_volume(10).with_muted(true),
            PlayerSnapshot::new("sat", "Sub")
                .with_volume(90)
                .with_ignored_volume(true),
            PlayerSnapshot::new("c", "Charlie").with_volume(70),
        ])
    }

    fn player<'a>(roster: &'a EntitySnapshot, id: &str) -> Player<'a> {
        Player::new(roster.get(id).unwrap(), roster)
    }

    #[test]
    fn get_member_skips_missing_players() {
        let roster = roster();
        let a = player(&roster, "a");
        assert!(a.has_member("gone"));
        assert!(a.get_member("gone").is_none());
        assert!(a.get_member("c").is_none());
        assert_eq!(a.get_member("b").map(|p| p.name()), Some("Bravo"));
        assert_eq!(a.members().len(), 2);
        assert_eq!(a.group_ids(), vec!["a", "b", "gone", "sat"]);
    }

    #[test]
    fn group_mute_is_answered_by_leader() {
        let roster = roster();
        let a = player(&roster, "a");
        let b = player(&roster, "b");
        let c = player(&roster, "c");

        // Satellite is ignored for volume so its unmuted flag does not count
        assert!(a.is_muted(MuteScope::Group));
        assert!(b.is_muted(MuteScope::Group));
        assert!(b.is_muted(MuteScope::Player));
        assert!(!c.is_muted(MuteScope::Group));
        assert_eq!(b.leader().map(|l| l.id()), Some("a"));
        assert!(a.leader().is_none());
    }

    #[test]
    fn group_mute_requires_all_members() {
        let roster = EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "Alpha").with_muted(true).with_members(["b"]),
            PlayerSnapshot::new("b", "Bravo").with_muted(false),
        ]);
        let a = player(&roster, "a");
        let b = player(&roster, "b");
        assert!(a.is_muted(MuteScope::Player));
        assert!(!a.is_muted(MuteScope::Group));
        assert!(!b.is_muted(MuteScope::Group));
    }

    #[test]
    fn ignore_volume_reflects_snapshot_flag() {
        let roster = roster();
        assert!(player(&roster, "sat").ignore_volume());
        assert!(!player(&roster, "a").ignore_volume());
        assert_eq!(player(&roster, "c").get_volume(), 70);
    }
}
