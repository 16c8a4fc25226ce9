//! Async runtime around the card coordinator.
//!
//! This module provides:
//! - [`TaskSpawner`], the spawning abstraction the runtime and its commands
//!   run on, with the Tokio implementation [`TokioSpawner`]
//! - [`CardRuntime`], a task that owns a [`Card`] and serializes every
//!   input to it: host snapshots, user actions, command lifecycle events
//!   and timer deadlines
//!
//! Commands returned by the card run as separate tasks, so a slow host never
//! blocks input handling. Their completion only feeds back through events
//! and the occasional follow-up active player.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::action::{CardCommand, UserAction};
use crate::card::{Card, CardView};
use crate::config::CardConfig;
use crate::dispatch::MediaCommands;
use crate::events::{BroadcastEvent, BroadcastEventBridge, EventEmitter};
use crate::snapshot::{EntitySnapshot, EntityState};

/// Capacity of the input queue.
const INPUT_CHANNEL_CAPACITY: usize = 32;
/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 128;
/// How often a playing track's progress is re-rendered.
const PROGRESS_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Where the card loop and its commands run.
pub trait TaskSpawner: Send + Sync {
    /// Detaches `future`; nothing awaits its completion.
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// [`TaskSpawner`] over a Tokio runtime handle.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Spawner for the ambient runtime. Panics outside a Tokio context.
    #[must_use]
    pub fn current() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(future);
    }
}

/// Inputs accepted by a running card.
#[derive(Debug, Clone)]
pub enum CardInput {
    /// Raw entity states pushed by the host.
    HostStates(Vec<EntityState>),
    /// An already-built roster.
    Snapshot(EntitySnapshot),
    User(UserAction),
    /// Explicit active-player change.
    ActivePlayer(String),
}

/// Handle to a running card.
///
/// Dropping every handle stops the card once queued inputs are drained.
#[derive(Clone)]
pub struct CardHandle {
    inputs: mpsc::Sender<CardInput>,
    views: watch::Receiver<Option<CardView>>,
    events: BroadcastEventBridge,
    cancel_token: CancellationToken,
}

impl CardHandle {
    pub async fn send(&self, input: CardInput) -> Result<(), mpsc::error::SendError<CardInput>> {
        self.inputs.send(input).await
    }

    /// Latest rendered view. `None` until the first input is processed.
    pub fn views(&self) -> watch::Receiver<Option<CardView>> {
        self.views.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.events.subscribe()
    }

    /// Stops the card loop. Commands already running are left to finish.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

/// Builder for a card task.
pub struct CardRuntime {
    config: CardConfig,
    commands: Arc<dyn MediaCommands>,
    external_emitter: Option<Arc<dyn EventEmitter>>,
}

impl CardRuntime {
    pub fn new(config: CardConfig, commands: Arc<dyn MediaCommands>) -> Self {
        Self {
            config,
            commands,
            external_emitter: None,
        }
    }

    /// Also delivers every event to `emitter`, synchronously.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.external_emitter = Some(emitter);
        self
    }

    /// Spawns the card loop.
    pub fn spawn<S>(self, spawner: S) -> CardHandle
    where
        S: TaskSpawner + Clone + 'static,
    {
        let bridge = BroadcastEventBridge::new(EVENT_CHANNEL_CAPACITY);
        if let Some(emitter) = self.external_emitter {
            bridge.set_external_emitter(emitter);
        }
        // Subscribe before the card exists so no command event is missed
        let events = bridge.subscribe();

        let card = Card::new(self.config, self.commands, Arc::new(bridge.clone()));
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let (view_tx, view_rx) = watch::channel(None);
        let cancel_token = CancellationToken::new();

        let task = CardTask {
            card,
            inputs: input_rx,
            followups: input_tx.downgrade(),
            events,
            views: view_tx,
            cancel_token: cancel_token.clone(),
            spawner: spawner.clone(),
        };
        spawner.spawn(task.run());

        CardHandle {
            inputs: input_tx,
            views: view_rx,
            events: bridge,
            cancel_token,
        }
    }
}

struct CardTask<S> {
    card: Card,
    inputs: mpsc::Receiver<CardInput>,
    /// Weak so the task does not keep its own input channel open.
    followups: mpsc::WeakSender<CardInput>,
    events: broadcast::Receiver<BroadcastEvent>,
    views: watch::Sender<Option<CardView>>,
    cancel_token: CancellationToken,
    spawner: S,
}

impl<S> CardTask<S>
where
    S: TaskSpawner + Clone + 'static,
{
    async fn run(mut self) {
        log::info!("[Runtime] Card loop started");

        let mut progress = tokio::time::interval(PROGRESS_REFRESH_INTERVAL);
        progress.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.card.next_deadline();
            let tracks_progress = self.card.tracks_progress();

            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    log::info!("[Runtime] Card loop cancelled");
                    break;
                }
                input = self.inputs.recv() => match input {
                    Some(input) => self.handle_input(input),
                    None => {
                        log::info!("[Runtime] All handles dropped");
                        break;
                    }
                },
                event = self.events.recv() => match event {
                    Ok(BroadcastEvent::Command(event)) => {
                        self.card.on_command_event(&event, Instant::now());
                    }
                    Ok(BroadcastEvent::Card(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("[Runtime] Missed {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = sleep_until(deadline) => {
                    self.card.advance(Instant::now());
                }
                _ = progress.tick(), if tracks_progress => {}
            }

            self.views.send_replace(Some(self.card.render(Utc::now())));
        }
    }

    fn handle_input(&mut self, input: CardInput) {
        let now = Instant::now();
        match input {
            CardInput::HostStates(states) => self.card.update_states(&states),
            CardInput::Snapshot(snapshot) => self.card.update_snapshot(snapshot),
            CardInput::ActivePlayer(entity_id) => {
                if let Err(e) = self.card.set_active_player(&entity_id) {
                    log::warn!("[Runtime] Cannot switch active player: {}", e);
                }
            }
            CardInput::User(action) => match self.card.handle_action(action, now) {
                Ok(Some(command)) => self.spawn_command(command),
                Ok(None) => {}
                Err(e) => log::warn!("[Runtime] Action rejected: {}", e),
            },
        }
    }

    fn spawn_command(&self, command: CardCommand) {
        let followups = self.followups.clone();
        self.spawner.spawn(async move {
            match command.execute().await {
                Ok(Some(entity_id)) => {
                    if let Some(tx) = followups.upgrade() {
                        if tx.send(CardInput::ActivePlayer(entity_id)).await.is_err() {
                            log::debug!("[Runtime] Card stopped before follow-up");
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("[Runtime] Command failed: {}", e),
            }
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
