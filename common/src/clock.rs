use std::{cell::Cell, rc::Rc, sync::Arc, time::Instant};

use chrono::Utc;

/// Source of the current time, in seconds.
///
/// Readings must never decrease for the lifetime of a control loop. Components hold a
/// shared handle (`&C`, `Rc<C>` or `Arc<C>`) so a test can keep its own handle and move
/// time forward between iterations.
pub trait Clock {
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Epoch seconds that only ever move forward.
///
/// The wall clock is sampled once at construction; later readings add the elapsed
/// monotonic time, so NTP corrections cannot push a reading backward.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch_at_start: f64,
    started: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch_at_start: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
            started: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.epoch_at_start + self.started.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }

    pub fn advance_minutes(&self, minutes: f64) {
        self.advance(minutes * 60.0);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
