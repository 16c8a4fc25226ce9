//! Sonos Card Console - headless driver for the card's grouping model.
//!
//! Loads a card configuration and a dump of host entity states, replays the
//! requested grouping edits, and prints the resulting views. With `--apply`
//! the grouping plan runs against a recording command sink and the calls it
//! would send to the host are printed as well.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use sonos_card_core::{
    Card, CardCommand, CardView, LoggingEventEmitter, MediaCall, RecordingCommands, Section,
    UserAction,
};
use tokio::time::Instant;

use crate::config::{load_card_config, load_states};

/// Sonos Card Console - replay grouping edits against a host state dump.
#[derive(Parser, Debug)]
#[command(name = "sonos-card-console")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Card configuration file (YAML, or JSON with a `.json` extension).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host entity states (JSON list).
    #[arg(short, long, value_name = "FILE")]
    states: PathBuf,

    /// Active player entity id.
    #[arg(short, long)]
    active: Option<String>,

    /// Section to show before applying edits.
    #[arg(long, value_parser = parse_section)]
    section: Option<Section>,

    /// Toggle a player in the grouping section. Repeatable.
    #[arg(short, long, value_name = "ENTITY_ID")]
    toggle: Vec<String>,

    /// Select a predefined group by name.
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// Select every player.
    #[arg(long, conflicts_with = "ungroup_all")]
    group_all: bool,

    /// Deselect every player except the active one.
    #[arg(long)]
    ungroup_all: bool,

    /// Apply the pending grouping and run the resulting commands.
    #[arg(long)]
    apply: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "warn", env = "SONOS_CARD_LOG_LEVEL")]
    log_level: log::LevelFilter,
}

/// What the console prints once all edits are replayed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    view: CardView,
    calls: Vec<MediaCall>,
}

fn parse_section(value: &str) -> Result<Section, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown section: {value}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Sonos Card Console v{}", env!("CARGO_PKG_VERSION"));

    let config = load_card_config(args.config.as_deref())?;
    let states = load_states(&args.states)?;

    let commands = Arc::new(RecordingCommands::new());
    let mut card = Card::new(config, commands.clone(), Arc::new(LoggingEventEmitter));
    card.update_states(&states);
    log::info!("Loaded {} entity states", states.len());

    if let Some(active) = &args.active {
        card.set_active_player(active)
            .with_context(|| format!("Cannot select active player {active}"))?;
    }
    if let Some(section) = args.section {
        if !card.show_section(section) {
            log::warn!("Section {} is not available with this config", section);
        }
    }

    let mut actions: Vec<UserAction> = args
        .toggle
        .iter()
        .map(|player| UserAction::ToggleGroupingItem {
            player: player.clone(),
        })
        .collect();
    if let Some(name) = args.preset {
        actions.push(UserAction::SelectPredefinedGroup { name });
    }
    if args.group_all {
        actions.push(UserAction::SelectAll);
    }
    if args.ungroup_all {
        actions.push(UserAction::DeselectAll);
    }
    if args.apply {
        actions.push(UserAction::ApplyGrouping);
    }

    let mut queued: Vec<CardCommand> = Vec::new();
    for action in actions {
        let label = format!("{action:?}");
        if let Some(command) = card
            .handle_action(action, Instant::now())
            .with_context(|| format!("Action failed: {label}"))?
        {
            queued.push(command);
        }
    }

    for command in queued {
        let follow = command
            .execute()
            .await
            .with_context(|| format!("Command failed: {:?}", command.action()))?;
        if let Some(entity_id) = follow {
            card.set_active_player(&entity_id)
                .with_context(|| format!("Cannot follow new leader {entity_id}"))?;
        }
    }

    let report = Report {
        view: card.render(Utc::now()),
        calls: commands.calls(),
    };
    let output = serde_json::to_string_pretty(&report).context("Failed to serialize view")?;
    println!("{output}");
    Ok(())
}
