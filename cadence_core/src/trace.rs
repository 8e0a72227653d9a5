// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the scheduler and the pipeline.
//!
//! This module provides a [`TraceSink`] trait with one method per event. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] owns an optional boxed [`TraceSink`]. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing and the sink passed
//! to [`Tracer::new`] is dropped. When **on**, each method performs a single
//! `Option` branch before dispatching.
//!
//! Scheduler events carry the frame time of the begin-frame interval they
//! belong to; pipeline events carry the pipeline clock's reading.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use crate::begin_frame::BeginFrameArgs;
use crate::display_scheduler::DeadlineReason;
use crate::pipeline::{PipelineId, PipelineStage};
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happened when the display scheduler attempted a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawOutcome {
    /// The client drew and swapped.
    Swapped,
    /// The client was asked to draw and reported failure.
    Failed,
    /// Too many swaps in flight; damage carries over.
    SwapThrottled,
    /// Root surface resources are locked; damage carries over.
    ResourcesLocked,
    /// Nothing to draw (or not allowed to); the scheduler went idle.
    Idle,
}

/// How a main-frame cycle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitOutcome {
    /// A commit payload was handed to the bridge.
    Sent,
    /// Nothing needed committing; swap promises were broken.
    NoUpdate,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the display scheduler accepts a begin-frame tick.
#[derive(Clone, Copy, Debug)]
pub struct BeginFrameEvent {
    /// The tick as delivered by the source.
    pub args: BeginFrameArgs,
    /// The deadline after subtracting the estimated parent draw time.
    pub adjusted_deadline: HostTime,
}

/// Emitted when the display scheduler arms its deadline timer.
#[derive(Clone, Copy, Debug)]
pub struct DeadlineEvent {
    /// Frame time of the current interval.
    pub frame_time: HostTime,
    /// Instant the timer was armed for. The null instant means immediately.
    pub deadline: HostTime,
    /// Why this deadline was chosen.
    pub reason: DeadlineReason,
}

/// Emitted each time the display scheduler attempts a draw.
#[derive(Clone, Copy, Debug)]
pub struct DrawAndSwapEvent {
    /// Frame time of the interval the attempt belongs to.
    pub frame_time: HostTime,
    /// Result of the attempt.
    pub outcome: DrawOutcome,
}

/// Emitted when the number of in-flight swaps changes.
#[derive(Clone, Copy, Debug)]
pub struct PendingSwapsEvent {
    /// Frame time of the most recent interval.
    pub frame_time: HostTime,
    /// Swaps issued but not yet acknowledged.
    pub pending_swaps: u32,
    /// Throttle limit.
    pub max_pending_swaps: u32,
}

/// Emitted when a pipeline enters a stage of its main-frame cycle.
#[derive(Clone, Copy, Debug)]
pub struct StageEvent {
    /// Which pipeline.
    pub pipeline: PipelineId,
    /// Frame number of the cycle (before completion increments it).
    pub source_frame_number: u64,
    /// Stage being entered. [`PipelineStage::None`] marks completion.
    pub stage: PipelineStage,
    /// Clock reading at entry.
    pub timestamp: HostTime,
}

/// Emitted at the end of a pipeline's commit stage.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Which pipeline.
    pub pipeline: PipelineId,
    /// Frame number of the cycle.
    pub source_frame_number: u64,
    /// Clock reading at the end of the commit stage.
    pub timestamp: HostTime,
    /// Whether a payload was sent.
    pub outcome: CommitOutcome,
    /// Number of layers whose properties were shipped.
    pub layer_updates: usize,
    /// Number of swap promises handed over (or broken).
    pub swap_promises: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a begin-frame tick is accepted.
    fn on_begin_frame(&mut self, e: &BeginFrameEvent) {
        _ = e;
    }

    /// Called when a deadline is armed.
    fn on_deadline(&mut self, e: &DeadlineEvent) {
        _ = e;
    }

    /// Called after each draw attempt.
    fn on_draw_and_swap(&mut self, e: &DrawAndSwapEvent) {
        _ = e;
    }

    /// Called when the in-flight swap count changes.
    fn on_pending_swaps(&mut self, e: &PendingSwapsEvent) {
        _ = e;
    }

    /// Called when a pipeline enters a stage.
    fn on_stage(&mut self, e: &StageEvent) {
        _ = e;
    }

    /// Called at the end of a commit stage.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::none()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            drop(sink);
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {}
        }
    }

    /// Returns whether events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`BeginFrameEvent`].
    #[inline]
    pub fn begin_frame(&mut self, e: &BeginFrameEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_begin_frame(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DeadlineEvent`].
    #[inline]
    pub fn deadline(&mut self, e: &DeadlineEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_deadline(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DrawAndSwapEvent`].
    #[inline]
    pub fn draw_and_swap(&mut self, e: &DrawAndSwapEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_draw_and_swap(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PendingSwapsEvent`].
    #[inline]
    pub fn pending_swaps(&mut self, e: &PendingSwapsEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pending_swaps(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StageEvent`].
    #[inline]
    pub fn stage(&mut self, e: &StageEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_stage(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}
