//! Volume slider model.
//!
//! Covers the dynamic slider range and the press/move/release interaction.
//! A drag only produces a committed value when it ends with a release over
//! the slider; anything else is discarded.

use serde::{Deserialize, Serialize};

use crate::config::CardConfig;
use crate::player::Player;

/// Number of tick intervals drawn along a volume slider.
pub const SLIDER_TICK_COUNT: usize = 10;

/// Upper bound of the slider for a player at `volume`.
///
/// With the dynamic slider enabled, quiet players get a narrower range so
/// small adjustments are easier.
pub fn slider_max(volume: u8, config: &CardConfig) -> f64 {
    if config.dynamic_volume_slider && f64::from(volume) < config.dynamic_volume_slider_threshold() {
        config.dynamic_volume_slider_max()
    } else {
        100.0
    }
}

/// Vertical extent of the slider track, in the host's pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackGeometry {
    pub top: f64,
    pub height: f64,
}

impl TrackGeometry {
    /// Maps a pointer position to a volume. The top of the track is `max`.
    pub fn value_at(&self, y: f64, max: f64) -> u8 {
        if self.height <= 0.0 || !y.is_finite() {
            return 0;
        }
        let percent = (1.0 - (y - self.top) / self.height).clamp(0.0, 1.0);
        (percent * max).round().clamp(0.0, 100.0) as u8
    }
}

/// Pointer input delivered to a slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SliderInput {
    PressThumb,
    Move { y: f64, track: TrackGeometry },
    /// `y` is `None` when the release happened outside the slider.
    Release { y: Option<f64>, track: TrackGeometry },
    Cancel,
    ClickTrack { y: f64, track: TrackGeometry },
}

/// Result of feeding one input to a slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderOutcome {
    /// The input had no effect.
    Ignored,
    /// A drag is in progress at this value; nothing is sent.
    Preview(u8),
    /// The user settled on a value.
    Commit(u8),
    /// The drag ended without a valid release.
    Aborted,
}

/// Interaction state of one volume slider.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSlider {
    value: u8,
    max: f64,
    disabled: bool,
    drag: Option<u8>,
}

impl VolumeSlider {
    pub fn new(value: u8, max: f64, disabled: bool) -> Self {
        Self {
            value: value.min(100),
            max: max.clamp(0.0, 100.0),
            disabled,
            drag: None,
        }
    }

    /// Slider for a player, honoring the dynamic range and ignore flag.
    pub fn for_player(player: Player<'_>, config: &CardConfig) -> Self {
        let volume = player.get_volume();
        Self::new(volume, slider_max(volume, config), player.ignore_volume())
    }

    /// The value to draw: the drag preview while dragging.
    pub fn value(&self) -> u8 {
        self.drag.unwrap_or(self.value)
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle(&mut self, input: SliderInput) -> SliderOutcome {
        if self.disabled {
            return SliderOutcome::Ignored;
        }
        match input {
            SliderInput::PressThumb => {
                self.drag = Some(self.value);
                SliderOutcome::Preview(self.value)
            }
            SliderInput::Move { y, track } => match self.drag {
                Some(_) => {
                    let value = track.value_at(y, self.max);
                    self.drag = Some(value);
                    SliderOutcome::Preview(value)
                }
                None => SliderOutcome::Ignored,
            },
            SliderInput::Release { y, track } => match (self.drag.take(), y) {
                (Some(_), Some(y)) => self.commit(track.value_at(y, self.max)),
                (Some(_), None) => SliderOutcome::Aborted,
                (None, _) => SliderOutcome::Ignored,
            },
            SliderInput::Cancel => match self.drag.take() {
                Some(_) => SliderOutcome::Aborted,
                None => SliderOutcome::Ignored,
            },
            SliderInput::ClickTrack { y, track } => {
                if self.drag.is_some() {
                    return SliderOutcome::Ignored;
                }
                self.commit(track.value_at(y, self.max))
            }
        }
    }

    /// Lit state of each tick, bottom to top.
    pub fn ticks(&self) -> Vec<bool> {
        tick_states(f64::from(self.value()), self.max, SLIDER_TICK_COUNT)
    }

    fn commit(&mut self, value: u8) -> SliderOutcome {
        self.value = value;
        SliderOutcome::Commit(value)
    }
}

/// Lit state of `count + 1` evenly spaced ticks for `value` out of `max`.
pub(crate) fn tick_states(value: f64, max: f64, count: usize) -> Vec<bool> {
    let percent = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
    (0..=count)
        .map(|i| i as f64 / count as f64 <= percent)
        .collect()
}
