// SPDX-License-Identifier: MPL-2.0
//! Playback position clock.
//!
//! Tracks the current playback position for an engine whose decode worker
//! runs off-thread: while playing, the position is interpolated from wall
//! clock time since the last anchor; while paused it stays put.
//!
//! The clock is fully lock-free, using atomics for all fields.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Reference instant for converting `Instant` to/from atomic microseconds.
/// All time measurements are relative to this instant, allowing storage in
/// `AtomicU64`.
static REFERENCE_INSTANT: OnceLock<Instant> = OnceLock::new();

/// Converts an `Instant` to microseconds since the reference instant.
#[allow(clippy::cast_possible_truncation)] // u128 microseconds won't overflow u64 for reasonable durations
fn instant_to_us(instant: Instant) -> u64 {
    let reference = REFERENCE_INSTANT.get_or_init(Instant::now);
    instant.duration_since(*reference).as_micros() as u64
}

/// Converts microseconds since reference back to an `Instant`.
/// Returns `None` for the sentinel value 0.
fn us_to_instant(us: u64) -> Option<Instant> {
    if us == 0 {
        return None;
    }
    let reference = REFERENCE_INSTANT.get_or_init(Instant::now);
    Some(*reference + Duration::from_micros(us))
}

/// Lock-free playback position clock.
#[derive(Debug)]
pub struct PlaybackClock {
    /// Last anchored position in microseconds.
    anchor_pos_us: AtomicU64,

    /// Wall time of the anchor as microseconds since `REFERENCE_INSTANT`.
    /// 0 means no anchor is set.
    anchor_time_us: AtomicU64,

    /// Whether the clock is advancing.
    running: AtomicBool,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock {
    /// Creates a stopped clock at position zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor_pos_us: AtomicU64::new(0),
            anchor_time_us: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    /// Starts the clock advancing from its current position.
    pub fn play(&self) {
        let pos = self.position_us();
        self.anchor_pos_us.store(pos, Ordering::SeqCst);
        self.anchor_time_us
            .store(instant_to_us(Instant::now()), Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
    }

    /// Freezes the clock at its current position.
    pub fn pause(&self) {
        let pos = self.position_us();
        self.anchor_pos_us.store(pos, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Stops the clock and resets the position to zero.
    pub fn stop(&self) {
        self.anchor_pos_us.store(0, Ordering::SeqCst);
        self.anchor_time_us.store(0, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Jumps to the given position, keeping the running state.
    ///
    /// Always re-anchors wall time so a seek during playback does not
    /// inherit elapsed time from before the jump.
    pub fn seek_ms(&self, position_ms: u32) {
        self.anchor_pos_us
            .store(u64::from(position_ms) * 1_000, Ordering::SeqCst);
        self.anchor_time_us
            .store(instant_to_us(Instant::now()), Ordering::SeqCst);
    }

    /// Current position in microseconds.
    #[allow(clippy::cast_possible_truncation)]
    fn position_us(&self) -> u64 {
        let anchored = self.anchor_pos_us.load(Ordering::SeqCst);

        if self.running.load(Ordering::SeqCst) {
            if let Some(anchor) = us_to_instant(self.anchor_time_us.load(Ordering::SeqCst)) {
                let elapsed_us = anchor.elapsed().as_micros() as u64;
                return anchored + elapsed_us;
            }
        }

        anchored
    }

    /// Current position in milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn position_ms(&self) -> u32 {
        (self.position_us() / 1_000).min(u64::from(u32::MAX)) as u32
    }

    /// Whether the clock is advancing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clock_is_stopped_at_zero() {
        let clock = PlaybackClock::new();
        assert_eq!(clock.position_ms(), 0);
        assert!(!clock.is_running());
    }

    #[test]
    fn seek_sets_position() {
        let clock = PlaybackClock::new();
        clock.seek_ms(42_000);
        assert_eq!(clock.position_ms(), 42_000);
    }

    #[test]
    fn pause_freezes_position() {
        let clock = PlaybackClock::new();
        clock.seek_ms(5_000);
        clock.play();
        std::thread::sleep(Duration::from_millis(30));
        clock.pause();

        let frozen = clock.position_ms();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(clock.position_ms(), frozen);
        assert!(!clock.is_running());
    }

    #[test]
    fn play_advances_position() {
        let clock = PlaybackClock::new();
        clock.play();
        std::thread::sleep(Duration::from_millis(30));
        assert!(clock.position_ms() >= 20);
    }

    #[test]
    fn stop_resets_to_zero() {
        let clock = PlaybackClock::new();
        clock.seek_ms(30_000);
        clock.play();
        clock.stop();

        assert!(!clock.is_running());
        assert_eq!(clock.position_ms(), 0);
    }

    #[test]
    fn seek_while_running_does_not_inherit_elapsed_time() {
        let clock = PlaybackClock::new();
        clock.play();
        std::thread::sleep(Duration::from_millis(30));
        clock.seek_ms(10_000);

        let pos = clock.position_ms();
        assert!((10_000..10_100).contains(&pos), "position was {}", pos);
    }
}
