// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time sources.
//!
//! Both state machines read "now" through the [`Clock`] trait so that tests
//! and simulated drivers can control time exactly. [`ManualClock`] is stepped
//! by hand; [`SystemClock`] reads the host's monotonic clock.

use std::cell::Cell;
use std::time::Instant;

use crate::time::{Duration, HostTime};

/// A source of monotonic [`HostTime`] readings.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> HostTime;
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    #[inline]
    fn now(&self) -> HostTime {
        (**self).now()
    }
}

/// A clock that only moves when told to.
///
/// Interior mutability lets a fixture hold an `Rc<ManualClock>` and advance
/// it while the code under test holds another handle to the same clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<HostTime>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    /// Sets the clock to `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is earlier than the current reading.
    pub fn set(&self, t: HostTime) {
        assert!(
            t >= self.now.get(),
            "ManualClock must not go backwards ({:?} -> {t:?})",
            self.now.get()
        );
        self.now.set(t);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> HostTime {
        self.now.get()
    }
}

/// Monotonic wall clock, measured from the moment it was created.
///
/// The first reading is offset by one microsecond so that a fresh clock never
/// returns the null instant.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u64 microseconds covers ~584k years of uptime"
    )]
    fn now(&self) -> HostTime {
        let micros = self.origin.elapsed().as_micros() as u64;
        HostTime(micros.saturating_add(1))
    }
}
