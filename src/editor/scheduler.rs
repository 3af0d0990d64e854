//! Debounce timers and the clock that drives them.
//!
//! The editor is single-threaded and event-driven: nothing fires on its own.
//! The host calls [`super::Editor::tick`] from its frame loop (or a timer
//! callback) and every timer whose quiet period has elapsed fires then.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Moves time forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Moves time forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }
}

/// A resettable one-shot timer.
///
/// Scheduling while already pending pushes the deadline back instead of
/// queueing a second fire, so a burst of mutations produces one fire.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
    generation: u64,
}

impl Debounce {
    /// Creates an idle timer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            generation: 0,
        }
    }

    /// (Re)starts the timer for the given document generation.
    pub fn schedule(&mut self, now: Instant, generation: u64) {
        self.deadline = Some(now + self.delay);
        self.generation = generation;
    }

    /// Stops the timer without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true if the timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fires the timer if its deadline has passed.
    ///
    /// # Returns
    ///
    /// The generation the timer was last scheduled for, once per schedule.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.take(),
            _ => None,
        }
    }

    /// Fires the timer immediately if it is pending.
    pub fn take(&mut self) -> Option<u64> {
        self.deadline.take().map(|_| self.generation)
    }
}
