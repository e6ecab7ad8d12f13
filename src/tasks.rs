// SPDX-License-Identifier: MPL-2.0
//! Deferred execution primitives.
//!
//! Two kinds of "run this later" exist in the binding protocol, and both are
//! expressed as *named task values* run through explicit queues rather than
//! nested closures:
//!
//! - [`DeferredQueue`]: operations requested before a container's root view
//!   exists. Buffered FIFO, replayed exactly once when the container reports
//!   ready; afterwards submissions run immediately.
//! - [`Waiters`]: one-shot continuations keyed by the event they wait for
//!   (prepared, laid out). Draining an event consumes its waiters; waiters
//!   for other events are untouched.

use std::collections::VecDeque;

/// Events a one-shot waiter can be keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitEvent {
    /// The engine finished asynchronous preparation.
    Prepared,
    /// The container reported a completed layout pass.
    LayoutReady,
}

/// One-shot continuations keyed by [`WaitEvent`].
#[derive(Debug)]
pub struct Waiters<T> {
    pending: Vec<(WaitEvent, T)>,
}

impl<T> Default for Waiters<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Waiters<T> {
    /// Creates an empty waiter set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queues a task to run once `event` fires.
    pub fn add(&mut self, event: WaitEvent, task: T) {
        self.pending.push((event, task));
    }

    /// Consumes and returns all tasks waiting on `event`, in queue order.
    pub fn drain(&mut self, event: WaitEvent) -> Vec<T> {
        let mut drained = Vec::new();
        let mut kept = Vec::with_capacity(self.pending.len());
        for (kind, task) in self.pending.drain(..) {
            if kind == event {
                drained.push(task);
            } else {
                kept.push((kind, task));
            }
        }
        self.pending = kept;
        drained
    }

    /// Returns whether any task is waiting on `event`.
    #[must_use]
    pub fn is_waiting(&self, event: WaitEvent) -> bool {
        self.pending.iter().any(|(kind, _)| *kind == event)
    }

    /// Drops every pending waiter.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Submission outcome for a [`DeferredQueue`].
#[derive(Debug, PartialEq, Eq)]
pub enum Submission<T> {
    /// The queue is live; the caller should run the task now.
    RunNow(T),
    /// The task was buffered until the queue is marked ready.
    Queued,
}

/// FIFO buffer for operations requested before their target is ready.
///
/// Replay happens exactly once: `mark_ready` returns the buffered tasks and
/// flips the queue live, so later submissions come back as
/// [`Submission::RunNow`].
#[derive(Debug)]
pub struct DeferredQueue<T> {
    ready: bool,
    queue: VecDeque<T>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    /// Creates a queue in the buffering state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: false,
            queue: VecDeque::new(),
        }
    }

    /// Submits a task: buffered while not ready, handed back otherwise.
    pub fn submit(&mut self, task: T) -> Submission<T> {
        if self.ready {
            Submission::RunNow(task)
        } else {
            self.queue.push_back(task);
            Submission::Queued
        }
    }

    /// Flips the queue live and returns the buffered tasks in FIFO order.
    ///
    /// Calling this again on a live queue returns an empty replay.
    pub fn mark_ready(&mut self) -> Vec<T> {
        self.ready = true;
        self.queue.drain(..).collect()
    }

    /// Returns whether submissions currently run immediately.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of buffered tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiters_drain_only_the_requested_event() {
        let mut waiters = Waiters::new();
        waiters.add(WaitEvent::Prepared, "a");
        waiters.add(WaitEvent::LayoutReady, "b");
        waiters.add(WaitEvent::Prepared, "c");

        assert_eq!(waiters.drain(WaitEvent::Prepared), vec!["a", "c"]);
        assert!(!waiters.is_waiting(WaitEvent::Prepared));
        assert!(waiters.is_waiting(WaitEvent::LayoutReady));
    }

    #[test]
    fn waiters_are_one_shot() {
        let mut waiters = Waiters::new();
        waiters.add(WaitEvent::Prepared, 1);

        assert_eq!(waiters.drain(WaitEvent::Prepared).len(), 1);
        assert!(waiters.drain(WaitEvent::Prepared).is_empty());
    }

    #[test]
    fn deferred_queue_buffers_until_ready() {
        let mut queue = DeferredQueue::new();
        assert_eq!(queue.submit(1), Submission::Queued);
        assert_eq!(queue.submit(2), Submission::Queued);
        assert_eq!(queue.pending(), 2);

        assert_eq!(queue.mark_ready(), vec![1, 2]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn deferred_queue_runs_immediately_after_replay() {
        let mut queue = DeferredQueue::new();
        queue.submit("early");
        queue.mark_ready();

        assert_eq!(queue.submit("late"), Submission::RunNow("late"));
    }

    #[test]
    fn replay_happens_exactly_once() {
        let mut queue = DeferredQueue::new();
        queue.submit(7);
        assert_eq!(queue.mark_ready(), vec![7]);
        assert!(queue.mark_ready().is_empty());
    }
}
