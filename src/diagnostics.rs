// SPDX-License-Identifier: MPL-2.0
//! Diagnostic event collection for playback activity.
//!
//! The player and the stage log meaningful lifecycle events (state
//! transitions, binding changes, engine errors, retries) through a cheap
//! cloneable [`DiagnosticsHandle`]. A [`DiagnosticsCollector`] owns the
//! receiving end and a bounded in-memory buffer; when the buffer is full,
//! the oldest events are dropped first.
//!
//! Collection is entirely passive: if no collector was attached, logging
//! is a no-op.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::time::Instant;

use crate::player::PlayerState;

/// Default capacity of the collector buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Capacity of the handle→collector channel.
const CHANNEL_CAPACITY: usize = 256;

/// Lifecycle events captured for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    /// The playback state machine transitioned.
    StateChanged {
        previous: PlayerState,
        current: PlayerState,
    },

    /// The current binding moved to another container (or was cleared).
    BindingChanged { container: Option<u64> },

    /// Asynchronous preparation was requested for a source.
    PrepareRequested { source: String },

    /// Preparation finished with the given stream properties.
    PrepareFinished {
        width: u32,
        height: u32,
        duration_ms: u32,
    },

    /// The engine rejected a data source.
    SourceRejected { source: String },

    /// The engine reported an asynchronous error.
    EngineError { code: i32, extra: i32 },

    /// A container scheduled an automatic re-preparation attempt.
    RetryScheduled { container: u64, attempt: u32 },

    /// A container gave up retrying and surfaced the error overlay.
    RetriesExhausted { container: u64 },

    /// A fullscreen transition started.
    FullscreenToggled { container: u64, entering: bool },

    /// An operation was requested in a state that cannot honor it.
    StateViolation {
        operation: &'static str,
        state: PlayerState,
    },
}

/// A captured event with its capture time.
#[derive(Debug, Clone)]
pub struct TimestampedEvent {
    pub at: Instant,
    pub event: DiagnosticEvent,
}

/// Cloneable logging handle. Dropped events (full channel, collector gone)
/// are silently discarded; diagnostics must never stall playback.
#[derive(Debug, Clone)]
pub struct DiagnosticsHandle {
    tx: SyncSender<TimestampedEvent>,
}

impl DiagnosticsHandle {
    /// Logs an event, discarding it if the collector cannot keep up.
    pub fn log(&self, event: DiagnosticEvent) {
        let stamped = TimestampedEvent {
            at: Instant::now(),
            event,
        };
        match self.tx.try_send(stamped) {
            Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Owns the event buffer and the receiving end of the handle channel.
#[derive(Debug)]
pub struct DiagnosticsCollector {
    rx: Receiver<TimestampedEvent>,
    buffer: VecDeque<TimestampedEvent>,
    capacity: usize,
    handle: DiagnosticsHandle,
}

impl Default for DiagnosticsCollector {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl DiagnosticsCollector {
    /// Creates a collector with the given buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::sync_channel(CHANNEL_CAPACITY);
        Self {
            rx,
            buffer: VecDeque::with_capacity(capacity.min(DEFAULT_BUFFER_CAPACITY)),
            capacity: capacity.max(1),
            handle: DiagnosticsHandle { tx },
        }
    }

    /// Returns a logging handle for this collector.
    #[must_use]
    pub fn handle(&self) -> DiagnosticsHandle {
        self.handle.clone()
    }

    /// Moves pending events from the channel into the buffer.
    pub fn process_pending(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            if self.buffer.len() == self.capacity {
                self.buffer.pop_front();
            }
            self.buffer.push_back(event);
        }
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Iterates buffered events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TimestampedEvent> {
        self.buffer.iter()
    }

    /// Drops all buffered events.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_events_arrive_after_processing() {
        let mut collector = DiagnosticsCollector::new(16);
        let handle = collector.handle();

        handle.log(DiagnosticEvent::EngineError { code: 1, extra: 0 });
        assert!(collector.is_empty());

        collector.process_pending();
        assert_eq!(collector.len(), 1);
        assert!(matches!(
            collector.iter().next().unwrap().event,
            DiagnosticEvent::EngineError { code: 1, extra: 0 }
        ));
    }

    #[test]
    fn buffer_drops_oldest_when_full() {
        let mut collector = DiagnosticsCollector::new(2);
        let handle = collector.handle();

        for attempt in 0..3 {
            handle.log(DiagnosticEvent::RetryScheduled {
                container: 0,
                attempt,
            });
        }
        collector.process_pending();

        assert_eq!(collector.len(), 2);
        let first = collector.iter().next().unwrap();
        assert!(matches!(
            first.event,
            DiagnosticEvent::RetryScheduled { attempt: 1, .. }
        ));
    }

    #[test]
    fn logging_without_collector_does_not_panic() {
        let handle = {
            let collector = DiagnosticsCollector::new(4);
            collector.handle()
        };
        // Collector dropped; logging must be a silent no-op.
        handle.log(DiagnosticEvent::BindingChanged { container: None });
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut collector = DiagnosticsCollector::new(4);
        collector.handle().log(DiagnosticEvent::EngineError {
            code: 7,
            extra: -2,
        });
        collector.process_pending();
        collector.clear();
        assert!(collector.is_empty());
    }
}
