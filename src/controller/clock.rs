//! Millisecond clocks and the cool-down window used by the controllers.
//!
//! Controllers never read time themselves; the session samples a [`Clock`]
//! and passes `now_ms` down. Tests use [`ManualClock`] and advance it by hand.

use std::cell::Cell;
use std::time::Instant;

pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Wall clock, counted from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Virtual time that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { now: Cell::new(start_ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    /// Jump to `ms`. Going backwards is ignored.
    pub fn set(&self, ms: u64) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Admits an event only if at least `window_ms` passed since the last
/// admitted one.
#[derive(Debug, Clone)]
pub struct Cooldown {
    window_ms: u64,
    last: Option<u64>,
}

impl Cooldown {
    pub fn new(window_ms: u64) -> Self {
        Self { window_ms, last: None }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Would an event at `now` be admitted?
    pub fn is_open(&self, now: u64) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.window_ms,
        }
    }

    /// Admit and record an event at `now`, or refuse it.
    pub fn admit(&mut self, now: u64) -> bool {
        if self.is_open(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
