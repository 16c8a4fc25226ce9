//! Sonos Card Core - grouping and volume model for the Sonos dashboard card.
//!
//! This crate turns the host's media player entities into a per-pass roster,
//! lets the user edit groups, volumes and playback against it, and sends the
//! resulting commands back to the host. It carries no rendering toolkit: the
//! card produces serializable views that a front end draws.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`snapshot`]: Entity snapshots and the adapter from raw host states
//! - [`config`]: Card configuration and its normalization
//! - [`player`]: Read-only player view over a snapshot
//! - [`store`]: One immutable pass over roster, config and active player
//! - [`grouping`]: Grouping rows, pending edits, diff and command plan
//! - [`volume`]: Slider math and the drag state machine
//! - [`progress`]: Playback progress and seeking
//! - [`dispatch`]: Host command surface and the control service
//! - [`sections`]: Per-section view rendering
//! - [`loader`]: Debounced loading indicator
//! - [`action`]: User actions and the commands they produce
//! - [`card`]: The card coordinator
//! - [`runtime`]: Task spawning and the async card loop
//! - [`events`]: Event system for front ends and the loader
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`TaskSpawner`](runtime::TaskSpawner): Spawning background tasks
//! - [`EventEmitter`](events::EventEmitter): Emitting card and command events
//! - [`MediaCommands`](dispatch::MediaCommands): Host media service calls

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod card;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod grouping;
pub mod loader;
pub mod player;
pub mod progress;
pub mod runtime;
pub mod sections;
pub mod snapshot;
pub mod store;
pub mod utils;
pub mod volume;

// Re-export commonly used types at the crate root
pub use action::{CardAction, CardCommand, UserAction};
pub use card::{Card, CardContent, CardView};
pub use config::{CardConfig, ConfigError, Section};
pub use dispatch::{
    CommandError, CommandResult, MediaCall, MediaCommands, MediaControlService, RecordingCommands,
    TransportControl,
};
pub use error::{CardError, CardResult, ErrorCode};
pub use events::{
    BroadcastEvent, BroadcastEventBridge, CardEvent, CommandEvent, EventEmitter,
    LoggingEventEmitter, NoopEventEmitter,
};
pub use player::{MuteScope, Player};
pub use runtime::{CardHandle, CardInput, CardRuntime, TaskSpawner, TokioSpawner};
pub use snapshot::{EntitySnapshot, EntityState, MediaPlayerFeature, PlaybackState, PlayerSnapshot};
pub use store::Store;
pub use utils::now_millis;
pub use volume::{SliderInput, SliderOutcome, TrackGeometry, VolumeSlider};

// Re-export grouping types
pub use grouping::{compute_diff, GroupDiffResult, GroupingCommand, GroupingItem, GroupingPlan};
