//! Playback progress interpolation and seek math.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::player::Player;
use crate::snapshot::MediaInfo;

/// Number of ticks drawn along the progress bar.
pub const PROGRESS_TICK_COUNT: usize = 10;

/// Position in seconds, extrapolated from the last host report while
/// playing. Clamped to `[0, duration]` when a duration is known.
pub fn playing_progress(media: &MediaInfo, playing: bool, now: DateTime<Utc>) -> f64 {
    let position = media.position.unwrap_or(0.0);
    let progress = match (playing, media.position_updated_at) {
        (true, Some(updated_at)) => {
            position + (now - updated_at).num_milliseconds() as f64 / 1000.0
        }
        _ => position,
    };
    match media.duration {
        Some(duration) if duration > 0.0 => progress.clamp(0.0, duration),
        _ => progress.max(0.0),
    }
}

/// Seek target for a click `offset_x` pixels into a bar `width` wide.
pub fn seek_position(duration: f64, offset_x: f64, width: f64) -> Option<f64> {
    if width <= 0.0 || duration <= 0.0 || !offset_x.is_finite() {
        return None;
    }
    Some(duration * (offset_x / width).clamp(0.0, 1.0))
}

/// Formats seconds as `HH:MM:SS`, dropping a zero hour (`03:07`).
pub fn format_progress(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64 % 86_400
    } else {
        0
    };
    let formatted = format!("{:02}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60);
    match formatted.strip_prefix("00:") {
        Some(rest) => rest.to_string(),
        None => formatted,
    }
}

/// Target for the rewind button.
pub fn rewind_target(media: &MediaInfo, step_seconds: f64) -> f64 {
    (media.position.unwrap_or(0.0) - step_seconds).max(0.0)
}

/// Target for the fast-forward button.
pub fn fast_forward_target(media: &MediaInfo, step_seconds: f64) -> f64 {
    media.position.unwrap_or(0.0) + step_seconds
}

/// Progress bar state for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub position: f64,
    pub duration: f64,
    pub elapsed: String,
    pub remaining: String,
    /// Filled share of the bar, 0-1.
    pub fraction: f64,
    pub ticks: Vec<bool>,
}

/// Builds the progress bar, or `None` when the media has no duration.
pub fn progress_view(player: Player<'_>, now: DateTime<Utc>) -> Option<ProgressView> {
    let media = &player.snapshot().media;
    let duration = media.duration.filter(|d| *d > 0.0)?;
    let position = playing_progress(media, player.is_playing(), now);
    let fraction = (position / duration).clamp(0.0, 1.0);

    Some(ProgressView {
        position,
        duration,
        elapsed: format_progress(position),
        remaining: format!("-{}", format_progress(duration - position)),
        fraction,
        ticks: (0..PROGRESS_TICK_COUNT)
            .map(|i| i as f64 / (PROGRESS_TICK_COUNT - 1) as f64 <= fraction)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{EntitySnapshot, PlaybackState, PlayerSnapshot};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn media(position: f64, duration: f64) -> MediaInfo {
        MediaInfo {
            duration: Some(duration),
            position: Some(position),
            position_updated_at: Some(at(0)),
            ..Default::default()
        }
    }

    #[test]
    fn progress_advances_only_while_playing() {
        let media = media(20.0, 200.0);
        assert_eq!(playing_progress(&media, true, at(15)), 35.0);
        assert_eq!(playing_progress(&media, false, at(15)), 20.0);
        assert_eq!(playing_progress(&media, true, at(900)), 200.0);
    }

    #[test]
    fn seek_maps_click_offset() {
        assert_eq!(seek_position(200.0, 50.0, 200.0), Some(50.0));
        assert_eq!(seek_position(200.0, 250.0, 200.0), Some(200.0));
        assert_eq!(seek_position(200.0, 50.0, 0.0), None);
    }

    #[test]
    fn format_drops_zero_hours() {
        assert_eq!(format_progress(0.0), "00:00");
        assert_eq!(format_progress(187.9), "03:07");
        assert_eq!(format_progress(3_725.0), "01:02:05");
        assert_eq!(format_progress(-4.0), "00:00");
    }

    #[test]
    fn rewind_never_goes_negative() {
        let media = media(10.0, 200.0);
        assert_eq!(rewind_target(&media, 15.0), 0.0);
        assert_eq!(fast_forward_target(&media, 15.0), 25.0);
    }

    #[test]
    fn view_requires_duration() {
        let roster = EntitySnapshot::new(vec![
            PlayerSnapshot::new("a", "A")
                .with_state(PlaybackState::Playing)
                .with_media(media(50.0, 100.0)),
            PlayerSnapshot::new("b", "B").with_media(MediaInfo::default()),
        ]);
        let a = Player::new(roster.get("a").unwrap(), &roster);
        let b = Player::new(roster.get("b").unwrap(), &roster);

        let view = progress_view(a, at(0)).unwrap();
        assert_eq!(view.elapsed, "00:50");
        assert_eq!(view.remaining, "-00:50");
        assert_eq!(view.fraction, 0.5);
        assert_eq!(view.ticks.iter().filter(|t| **t).count(), 5);
        assert!(progress_view(b, at(0)).is_none());
    }
}
