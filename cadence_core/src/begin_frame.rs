// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Begin-frame ticks and the sources that deliver them.
//!
//! A begin-frame tick ([`BeginFrameArgs`]) announces that a display interval
//! has started: it carries the frame time, the latest instant by which the
//! frame should be produced, and the nominal interval. A
//! [`BeginFrameSource`] is what consumers subscribe to in order to receive
//! ticks; consumers report back when they are done with each one.

use core::fmt;

use crate::time::{Duration, HostTime};

/// Nominal display interval used when nothing better is known (60 Hz).
pub const DEFAULT_INTERVAL: Duration = Duration::from_micros(16_666);

/// Default estimate of how long the parent compositor needs to draw after a
/// child swaps.
///
/// One third of [`DEFAULT_INTERVAL`]. The display scheduler subtracts this
/// from incoming deadlines, and subtracts it a second time while waiting on
/// expected root damage.
pub const DEFAULT_ESTIMATED_PARENT_DRAW_TIME: Duration =
    Duration::from_micros(DEFAULT_INTERVAL.micros() / 3);

/// Whether a tick is fresh or a catch-up for a missed interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BeginFrameArgsKind {
    /// A regular tick delivered on time.
    #[default]
    Normal,
    /// A tick re-sent to an observer that missed the most recent one.
    Missed,
}

/// One begin-frame tick.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeginFrameArgs {
    /// When the frame started.
    pub frame_time: HostTime,
    /// Latest instant by which the frame should be produced.
    pub deadline: HostTime,
    /// Nominal interval between ticks.
    pub interval: Duration,
    /// Fresh or catch-up.
    pub kind: BeginFrameArgsKind,
}

impl BeginFrameArgs {
    /// Creates tick arguments from their parts.
    #[inline]
    #[must_use]
    pub const fn new(
        frame_time: HostTime,
        deadline: HostTime,
        interval: Duration,
        kind: BeginFrameArgsKind,
    ) -> Self {
        Self {
            frame_time,
            deadline,
            interval,
            kind,
        }
    }

    /// Creates a normal tick whose deadline is one interval after
    /// `frame_time`.
    #[inline]
    #[must_use]
    pub fn normal(frame_time: HostTime, interval: Duration) -> Self {
        Self::new(
            frame_time,
            frame_time + interval,
            interval,
            BeginFrameArgsKind::Normal,
        )
    }

    /// Returns the start of the next interval (`frame_time + interval`).
    #[inline]
    #[must_use]
    pub fn next_frame_time(&self) -> HostTime {
        self.frame_time + self.interval
    }

    /// Returns a copy with the deadline moved earlier by `by`.
    #[inline]
    #[must_use]
    pub fn with_deadline_earlier_by(mut self, by: Duration) -> Self {
        self.deadline = self.deadline - by;
        self
    }
}

impl fmt::Debug for BeginFrameArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeginFrameArgs")
            .field("frame_time", &self.frame_time.0)
            .field("deadline", &self.deadline.0)
            .field("interval", &self.interval.0)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Something that delivers begin-frame ticks to subscribed observers.
///
/// The observer relationship is expressed by the subscriber calling
/// [`add_observer`](Self::add_observer) and
/// [`remove_observer`](Self::remove_observer); the ticks themselves are
/// delivered by whoever drives the source.
pub trait BeginFrameSource {
    /// Registers an observer.
    fn add_observer(&mut self);

    /// Unregisters an observer.
    fn remove_observer(&mut self);

    /// Reports that an observer finished with the current tick.
    fn did_finish_frame(&mut self);
}

/// A begin-frame source whose ticks are pushed in from outside.
///
/// Counts observers and finished frames so drivers and tests can see what
/// the subscriber did.
#[derive(Clone, Debug, Default)]
pub struct ExternalBeginFrameSource {
    observers: u32,
    frames_finished: u64,
}

impl ExternalBeginFrameSource {
    /// Creates a source with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn num_observers(&self) -> u32 {
        self.observers
    }

    /// Returns how many times an observer reported a finished frame.
    #[must_use]
    pub fn frames_finished(&self) -> u64 {
        self.frames_finished
    }
}

impl BeginFrameSource for ExternalBeginFrameSource {
    fn add_observer(&mut self) {
        self.observers += 1;
    }

    fn remove_observer(&mut self) {
        assert!(self.observers > 0, "remove_observer without add_observer");
        self.observers -= 1;
    }

    fn did_finish_frame(&mut self) {
        self.frames_finished += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_args_deadline_is_one_interval_out() {
        let args = BeginFrameArgs::normal(HostTime(10_000), DEFAULT_INTERVAL);
        assert_eq!(args.deadline, HostTime(26_666));
        assert_eq!(args.next_frame_time(), HostTime(26_666));
        assert_eq!(args.kind, BeginFrameArgsKind::Normal);
    }

    #[test]
    fn deadline_adjustment_leaves_frame_time() {
        let args = BeginFrameArgs::normal(HostTime(10_000), DEFAULT_INTERVAL)
            .with_deadline_earlier_by(DEFAULT_ESTIMATED_PARENT_DRAW_TIME);
        assert_eq!(args.frame_time, HostTime(10_000));
        assert_eq!(args.deadline, HostTime(26_666 - 5_555));
    }

    #[test]
    fn external_source_counts_observers() {
        let mut source = ExternalBeginFrameSource::new();
        source.add_observer();
        assert_eq!(source.num_observers(), 1);
        source.did_finish_frame();
        source.remove_observer();
        assert_eq!(source.num_observers(), 0);
        assert_eq!(source.frames_finished(), 1);
    }

    #[test]
    #[should_panic(expected = "remove_observer without add_observer")]
    fn removing_unknown_observer_panics() {
        ExternalBeginFrameSource::new().remove_observer();
    }
}
