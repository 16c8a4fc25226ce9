//! Event system for upward signaling out of the card.
//!
//! This module provides:
//! - [`EventEmitter`] trait for the coordinator and command dispatch to emit events
//! - [`BroadcastEventBridge`] for fan-out to any number of subscribers
//! - Event types for card state changes and command lifecycle
//!
//! Widgets never listen on a shared channel. Events flow upward to the
//! single coordinator, which is the only subscriber that mutates state.

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::config::Section;

/// Events broadcast to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// Card-level state changes.
    Card(CardEvent),

    /// Command lifecycle, used to drive the loading indicator.
    Command(CommandEvent),
}

/// Card state change notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CardEvent {
    /// The active player changed.
    ActivePlayerChanged {
        #[serde(rename = "entityId")]
        entity_id: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The visible section changed.
    SectionChanged {
        section: Section,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The loading indicator became visible or hidden.
    LoaderVisibilityChanged {
        visible: bool,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A grouping change was applied.
    GroupingApplied {
        /// Leader of the group after the change.
        #[serde(rename = "mainPlayer")]
        main_player: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Command lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandEvent {
    /// A command was sent to the host.
    Started {
        #[serde(rename = "commandId")]
        command_id: String,
        /// Section the command was issued from.
        section: Section,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A command completed, successfully or not.
    Finished {
        #[serde(rename = "commandId")]
        command_id: String,
        section: Section,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

impl CommandEvent {
    pub fn section(&self) -> Section {
        match self {
            Self::Started { section, .. } | Self::Finished { section, .. } => *section,
        }
    }
}

impl From<CardEvent> for BroadcastEvent {
    fn from(event: CardEvent) -> Self {
        BroadcastEvent::Card(event)
    }
}

impl From<CommandEvent> for BroadcastEvent {
    fn from(event: CommandEvent) -> Self {
        BroadcastEvent::Command(event)
    }
}
