//! Bridge implementation that maps card events to a broadcast channel.
//!
//! The [`BroadcastEventBridge`] lives at the boundary between the card and
//! whatever drives it, mapping typed events to a `tokio::sync::broadcast`
//! channel the runtime and host adapters subscribe to.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::emitter::EventEmitter;
use super::{BroadcastEvent, CardEvent, CommandEvent};

/// Fans card and command events out to broadcast subscribers.
///
/// The card runtime is one subscriber: it feeds command events back into the
/// loading indicator. An external emitter, when set, sees each event first.
#[derive(Clone)]
pub struct BroadcastEventBridge {
    tx: broadcast::Sender<BroadcastEvent>,
    /// Optional external emitter for host-specific event delivery
    external_emitter: Arc<RwLock<Option<Arc<dyn EventEmitter>>>>,
}

impl BroadcastEventBridge {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            external_emitter: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets an external emitter for host-specific event delivery.
    pub fn set_external_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        *self.external_emitter.write() = Some(emitter);
    }

    /// Receives events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }
}

/// One forwarding method per event family.
macro_rules! impl_emit {
    ($method:ident, $event_ty:ty, $variant:ident) => {
        fn $method(&self, event: $event_ty) {
            if let Some(ref emitter) = *self.external_emitter.read() {
                emitter.$method(event.clone());
            }
            if let Err(e) = self.tx.send(BroadcastEvent::$variant(event)) {
                log::trace!("[Events] Dropped, no subscribers: {}", e);
            }
        }
    };
}

impl EventEmitter for BroadcastEventBridge {
    impl_emit!(emit_card, CardEvent, Card);
    impl_emit!(emit_command, CommandEvent, Command);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Section;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CollectingEmitter {
        card: Mutex<Vec<CardEvent>>,
    }

    impl EventEmitter for CollectingEmitter {
        fn emit_card(&self, event: CardEvent) {
            self.card.lock().push(event);
        }

        fn emit_command(&self, _event: CommandEvent) {}
    }

    #[tokio::test]
    async fn forwards_to_subscribers_and_external_emitter() {
        let bridge = BroadcastEventBridge::new(8);
        let mut rx = bridge.subscribe();
        let external = Arc::new(CollectingEmitter::default());
        bridge.set_external_emitter(external.clone());

        let event = CardEvent::SectionChanged {
            section: Section::Grouping,
            timestamp: 1,
        };
        bridge.emit_card(event.clone());

        match rx.recv().await.unwrap() {
            BroadcastEvent::Card(received) => assert_eq!(received, event),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(external.card.lock().as_slice(), &[event]);
    }

    #[test]
    fn emitting_without_subscribers_is_harmless() {
        let bridge = BroadcastEventBridge::new(4);
        bridge.emit_command(CommandEvent::Started {
            command_id: "c".into(),
            section: Section::Player,
            timestamp: 0,
        });
    }
}
