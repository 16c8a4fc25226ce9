//! Debounced loading indicator.
//!
//! The indicator appears only when a command runs longer than
//! [`LOADER_GRACE`], and once shown stays up for at least
//! [`LOADER_MIN_VISIBLE`]:
//!
//! ```text
//! Idle -> PendingShow -> Visible -> PendingHide -> Idle
//! ```
//!
//! Transitions are driven explicitly through [`LoadingIndicator::advance`]
//! with the deadline reported by [`LoadingIndicator::next_deadline`], so the
//! machine has no timers of its own.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

/// Delay before a running command shows the indicator.
pub const LOADER_GRACE: Duration = Duration::from_millis(300);

/// Minimum time the indicator stays visible once shown.
pub const LOADER_MIN_VISIBLE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoaderState {
    Idle,
    PendingShow { show_at: Instant },
    Visible { since: Instant },
    PendingHide { hide_at: Instant },
}

/// Loading indicator state machine.
///
/// Tracks in-flight commands by id. Each transition method returns
/// `Some(visible)` when the visibility flipped.
#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    state: LoaderState,
    in_flight: HashSet<String>,
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self {
            state: LoaderState::Idle,
            in_flight: HashSet::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(
            self.state,
            LoaderState::Visible { .. } | LoaderState::PendingHide { .. }
        )
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn command_started(&mut self, command_id: &str, now: Instant) -> Option<bool> {
        self.in_flight.insert(command_id.to_string());
        match self.state {
            LoaderState::Idle => {
                self.state = LoaderState::PendingShow {
                    show_at: now + LOADER_GRACE,
                };
            }
            LoaderState::PendingHide { hide_at } => {
                // Keep the original minimum-visible window
                self.state = LoaderState::Visible {
                    since: hide_at - LOADER_MIN_VISIBLE,
                };
            }
            LoaderState::PendingShow { .. } | LoaderState::Visible { .. } => {}
        }
        None
    }

    /// Marks a command done. Unknown ids are ignored.
    pub fn command_finished(&mut self, command_id: &str, now: Instant) -> Option<bool> {
        if !self.in_flight.remove(command_id) || !self.in_flight.is_empty() {
            return None;
        }
        match self.state {
            LoaderState::PendingShow { .. } => {
                self.state = LoaderState::Idle;
                None
            }
            LoaderState::Visible { since } => {
                let hide_at = since + LOADER_MIN_VISIBLE;
                if now >= hide_at {
                    self.state = LoaderState::Idle;
                    Some(false)
                } else {
                    self.state = LoaderState::PendingHide { hide_at };
                    None
                }
            }
            LoaderState::Idle | LoaderState::PendingHide { .. } => None,
        }
    }

    /// The next instant at which [`LoadingIndicator::advance`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            LoaderState::PendingShow { show_at } => Some(show_at),
            LoaderState::PendingHide { hide_at } => Some(hide_at),
            LoaderState::Idle | LoaderState::Visible { .. } => None,
        }
    }

    /// Applies any transition whose deadline has passed.
    pub fn advance(&mut self, now: Instant) -> Option<bool> {
        match self.state {
            LoaderState::PendingShow { show_at } if now >= show_at => {
                self.state = LoaderState::Visible { since: now };
                Some(true)
            }
            LoaderState::PendingHide { hide_at } if now >= hide_at => {
                self.state = LoaderState::Idle;
                Some(false)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn fast_command_never_shows() {
        let t0 = Instant::now();
        let mut loader = LoadingIndicator::new();
        loader.command_started("1", t0);
        assert_eq!(loader.next_deadline(), Some(t0 + LOADER_GRACE));
        assert_eq!(loader.command_finished("1", t0 + ms(100)), None);
        assert_eq!(loader.advance(t0 + ms(400)), None);
        assert!(!loader.is_visible());
        assert_eq!(loader.next_deadline(), None);
    }

    #[test]
    fn slow_command_is_held_for_minimum_duration() {
        let t0 = Instant::now();
        let mut loader = LoadingIndicator::new();
        loader.command_started("1", t0);
        assert_eq!(loader.advance(t0 + ms(299)), None);
        assert_eq!(loader.advance(t0 + ms(300)), Some(true));

        assert_eq!(loader.command_finished("1", t0 + ms(500)), None);
        assert!(loader.is_visible());
        assert_eq!(loader.next_deadline(), Some(t0 + ms(1300)));
        assert_eq!(loader.advance(t0 + ms(1299)), None);
        assert_eq!(loader.advance(t0 + ms(1300)), Some(false));
        assert!(!loader.is_visible());
    }

    #[test]
    fn long_command_hides_immediately_after_finishing() {
        let t0 = Instant::now();
        let mut loader = LoadingIndicator::new();
        loader.command_started("1", t0);
        loader.advance(t0 + ms(300));
        assert_eq!(loader.command_finished("1", t0 + ms(2000)), Some(false));
    }

    #[test]
    fn overlapping_commands_keep_it_up() {
        let t0 = Instant::now();
        let mut loader = LoadingIndicator::new();
        loader.command_started("1", t0);
        loader.command_started("2", t0 + ms(100));
        loader.advance(t0 + ms(300));
        assert_eq!(loader.command_finished("1", t0 + ms(400)), None);
        assert_eq!(loader.in_flight(), 1);
        assert_eq!(loader.next_deadline(), None);

        loader.command_finished("2", t0 + ms(600));
        assert_eq!(loader.next_deadline(), Some(t0 + ms(1300)));

        // A new command while pending hide returns to visible
        loader.command_started("3", t0 + ms(700));
        assert_eq!(loader.next_deadline(), None);
        assert!(loader.is_visible());
        assert_eq!(loader.command_finished("3", t0 + ms(1500)), Some(false));
    }

    #[test]
    fn unknown_finish_is_ignored() {
        let t0 = Instant::now();
        let mut loader = LoadingIndicator::new();
        loader.command_started("1", t0);
        assert_eq!(loader.command_finished("other", t0), None);
        assert_eq!(loader.in_flight(), 1);
    }
}
