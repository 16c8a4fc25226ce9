//! Predefined groups resolved against the current roster.

use serde::Serialize;

use crate::config::PredefinedGroupConfig;
use crate::snapshot::EntitySnapshot;

/// One resolved member of a predefined group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedGroupPlayer {
    pub id: String,
    /// Volume to restore, from the entry itself or the group default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
}

/// A named grouping preset whose members all exist in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedGroup {
    pub name: String,
    pub entities: Vec<PredefinedGroupPlayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

impl PredefinedGroup {
    pub fn contains(&self, id: &str) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.id.as_str())
    }
}

/// Resolves configured presets against the roster.
///
/// Entries naming players the host no longer reports are dropped, and a
/// preset left without any member is skipped entirely.
pub fn resolve_predefined_groups(
    configs: &[PredefinedGroupConfig],
    roster: &EntitySnapshot,
) -> Vec<PredefinedGroup> {
    configs
        .iter()
        .filter_map(|config| {
            let entities: Vec<PredefinedGroupPlayer> = config
                .entities
                .iter()
                .filter(|entity| {
                    let known = roster.get(&entity.player).is_some();
                    if !known {
                        log::warn!(
                            "[Grouping] Predefined group '{}' references unknown player {}",
                            config.name,
                            entity.player
                        );
                    }
                    known
                })
                .map(|entity| PredefinedGroupPlayer {
                    id: entity.player.clone(),
                    volume: entity.volume.or(config.volume).map(|v| v.min(100)),
                })
                .collect();

            if entities.is_empty() {
                log::warn!(
                    "[Grouping] Skipping predefined group '{}': no known players",
                    config.name
                );
                return None;
            }

            Some(PredefinedGroup {
                name: config.name.clone(),
                entities,
                media: config.media.clone(),
            })
        })
        .collect()
}
