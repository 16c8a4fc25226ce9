//! Grouping model.
//!
//! This module provides:
//! - [`GroupingItem`] rows derived per pass from the roster and pending edits
//! - [`PendingChangeSet`] and the edit operations (toggle, presets, all/none)
//! - [`compute_diff`], the pure join/unjoin computation
//! - [`GroupingPlan`], the ordered commands that apply a diff

mod diff;
mod item;
mod pending;
mod plan;
mod preset;

pub use diff::{compute_diff, GroupDiffResult};
pub use item::{build_grouping_items, GroupingItem};
pub use pending::{deselect_all, select_all, select_predefined_group, toggle_item, PendingChangeSet};
pub use plan::{GroupingCommand, GroupingPlan};
pub use preset::{resolve_predefined_groups, PredefinedGroup, PredefinedGroupPlayer};
