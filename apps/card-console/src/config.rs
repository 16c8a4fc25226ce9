//! Console configuration.
//!
//! Loads the card configuration and the host state dump, with environment
//! variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use sonos_card_core::{CardConfig, EntityState};

/// Overrides the configured `entityId`.
const ENTITY_ID_ENV: &str = "SONOS_CARD_ENTITY_ID";

/// Loads a card configuration file, or the defaults without one.
pub fn load_card_config(path: Option<&Path>) -> Result<CardConfig> {
    let mut config = match path {
        Some(path) => CardConfig::load(path)
            .with_context(|| format!("Failed to load card config: {}", path.display()))?,
        None => CardConfig::from_yaml_str("{}").context("Failed to build default card config")?,
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut CardConfig) {
    if let Ok(val) = std::env::var(ENTITY_ID_ENV) {
        if !val.is_empty() {
            config.entity_id = Some(val);
        }
    }
}

/// Reads a JSON list of entity states as the host reports them.
pub fn load_states(path: &Path) -> Result<Vec<EntityState>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read states file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse states file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.json");
        std::fs::write(
            &path,
            r#"[
                {"entity_id": "media_player.kitchen", "state": "playing",
                 "attributes": {"friendly_name": "Kitchen", "volume_level": 0.25}},
                {"entity_id": "light.hall", "state": "on", "attributes": {}}
            ]"#,
        )
        .unwrap();

        let states = load_states(&path).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].entity_id, "media_player.kitchen");
    }

    #[test]
    fn missing_files_report_their_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yaml");

        let err = load_card_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("nope.yaml"));
        let err = load_states(&path).unwrap_err();
        assert!(err.to_string().contains("nope.yaml"));
    }

    #[test]
    fn card_config_file_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.yaml");
        std::fs::write(&path, "type: custom:sonos-card\nsections: [grouping]\n").unwrap();

        let config = load_card_config(Some(&path)).unwrap();
        assert_eq!(config.entity_platform.as_deref(), Some("sonos"));
    }
}
