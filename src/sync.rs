//! Playback synchronization.
//!
//! A [`PlaybackSynchronizer`] pairs a cleaned caption track with its
//! translations and answers "which line is on screen at time `t`". The
//! lookup is a pure function of the track and the time, so it can be sampled
//! from any clock at any rate. [`PlaybackSynchronizer::run`] is the periodic
//! driver used when this process owns the clock.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::caption::{CaptionLine, CaptionTrack};
use crate::error::{LivecapError, Result};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// First line whose `[start, start + duration]` interval contains `current_time`
pub fn active_index(lines: &[CaptionLine], current_time: f64) -> Option<usize> {
    lines.iter().position(|line| line.contains(current_time))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub current_time: f64,
    pub active_index: Option<usize>,
}

/// The line on screen together with its translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveCaption<'a> {
    pub index: usize,
    pub line: &'a CaptionLine,
    pub translation: &'a str,
}

/// Source of the current playback position, in seconds
pub trait PlaybackClock: Send + Sync {
    fn current_time(&self) -> f64;
}

/// Clock that advances with wall time from a start offset at a fixed rate
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    origin: Instant,
    offset: f64,
    rate: f64,
}

impl SimulatedClock {
    /// Start at `offset` seconds; `rate` must be finite and positive
    pub fn new(offset: f64, rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(LivecapError::InvalidInput(format!(
                "Playback rate must be a positive number, got {}",
                rate
            )));
        }
        if !offset.is_finite() {
            return Err(LivecapError::InvalidInput(format!("Invalid start position: {}", offset)));
        }

        Ok(Self {
            origin: Instant::now(),
            offset: offset.max(0.0),
            rate,
        })
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            offset: 0.0,
            rate: 1.0,
        }
    }
}

impl PlaybackClock for SimulatedClock {
    fn current_time(&self) -> f64 {
        self.offset + self.origin.elapsed().as_secs_f64() * self.rate
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackSynchronizer {
    track: CaptionTrack,
    translations: Vec<String>,
}

impl PlaybackSynchronizer {
    /// Pair `track` with `translations`, which must have one entry per line
    pub fn new(track: CaptionTrack, translations: Vec<String>) -> Result<Self> {
        if track.len() != translations.len() {
            return Err(LivecapError::InvalidInput(format!(
                "{} caption lines but {} translations",
                track.len(),
                translations.len()
            )));
        }
        if !track.is_monotonic() {
            warn!(
                "Caption track for {} has out-of-order start times; earlier lines win on overlap",
                track.video_id
            );
        }

        Ok(Self { track, translations })
    }

    pub fn track(&self) -> &CaptionTrack {
        &self.track
    }

    pub fn translations(&self) -> &[String] {
        &self.translations
    }

    pub fn sync(&self, current_time: f64) -> SyncState {
        SyncState {
            current_time,
            active_index: active_index(&self.track.lines, current_time),
        }
    }

    pub fn active(&self, state: &SyncState) -> Option<ActiveCaption<'_>> {
        let index = state.active_index?;
        Some(ActiveCaption {
            index,
            line: self.track.lines.get(index)?,
            translation: self.translations.get(index)?.as_str(),
        })
    }

    /// Sample `clock` every `interval` until it passes the end of the track.
    ///
    /// `on_change` runs on the first sample and whenever the active line
    /// changes. Late ticks are skipped rather than replayed. Intervals below
    /// one millisecond are raised to one millisecond.
    pub async fn run<C, F>(&self, clock: &C, interval: Duration, mut on_change: F) -> SyncState
    where
        C: PlaybackClock + ?Sized,
        F: FnMut(&SyncState, Option<ActiveCaption<'_>>),
    {
        let end_time = self.track.end_time();
        let mut ticker = tokio::time::interval(interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last: Option<SyncState> = None;
        loop {
            ticker.tick().await;
            let state = self.sync(clock.current_time());

            if last.is_none_or(|prev| prev.active_index != state.active_index) {
                debug!("Active caption at {:.2}s: {:?}", state.current_time, state.active_index);
                on_change(&state, self.active(&state));
            }
            last = Some(state);

            if state.current_time > end_time {
                return state;
            }
        }
    }
}
