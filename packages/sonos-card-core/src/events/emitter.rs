//! Event emitter abstraction for decoupling the card from its host.
//!
//! The coordinator and the command dispatch depend on the [`EventEmitter`]
//! trait rather than concrete channels, enabling testing and alternative
//! delivery mechanisms.

use super::{CardEvent, CommandEvent};

/// Receives every event the card and its command service produce.
///
/// Implementations must not block: events are emitted from inside
/// [`Card`](crate::card::Card) methods and command futures.
pub trait EventEmitter: Send + Sync {
    /// Emits a card state change event.
    fn emit_card(&self, event: CardEvent);

    /// Emits a command lifecycle event.
    fn emit_command(&self, event: CommandEvent);
}

/// No-op emitter for headless use or testing.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_card(&self, _event: CardEvent) {}

    fn emit_command(&self, _event: CommandEvent) {}
}

/// Writes every event to the debug log. Used by the console driver.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_card(&self, event: CardEvent) {
        tracing::debug!(?event, "card_event");
    }

    fn emit_command(&self, event: CommandEvent) {
        tracing::debug!(?event, "command_event");
    }
}
