// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events as
//! fixed-size little-endian records into a [`Recording`]. Sinks are boxed
//! and moved into the component they observe, so the recording is shared:
//! keep a [`Recording`] handle (or clone the sink to record several
//! components into one buffer) and read it back with [`decode`].

use std::cell::RefCell;
use std::rc::Rc;

use cadence_core::begin_frame::{BeginFrameArgs, BeginFrameArgsKind};
use cadence_core::display_scheduler::DeadlineReason;
use cadence_core::pipeline::{PipelineId, PipelineStage};
use cadence_core::time::{Duration, HostTime};
use cadence_core::trace::{
    BeginFrameEvent, CommitEvent, CommitOutcome, DeadlineEvent, DrawAndSwapEvent, DrawOutcome,
    PendingSwapsEvent, StageEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_BEGIN_FRAME: u8 = 1;
const TAG_DEADLINE: u8 = 2;
const TAG_DRAW_AND_SWAP: u8 = 3;
const TAG_PENDING_SWAPS: u8 = 4;
const TAG_STAGE: u8 = 5;
const TAG_COMMIT: u8 = 6;

const DEADLINE_REASONS: [DeadlineReason; 8] = [
    DeadlineReason::OutputSurfaceLost,
    DeadlineReason::SwapThrottled,
    DeadlineReason::NoDamage,
    DeadlineReason::RootResourcesLocked,
    DeadlineReason::AllSurfacesReady,
    DeadlineReason::ResizePending,
    DeadlineReason::WaitingForRootDamage,
    DeadlineReason::Regular,
];

const DRAW_OUTCOMES: [DrawOutcome; 5] = [
    DrawOutcome::Swapped,
    DrawOutcome::Failed,
    DrawOutcome::SwapThrottled,
    DrawOutcome::ResourcesLocked,
    DrawOutcome::Idle,
];

const STAGES: [PipelineStage; 4] = [
    PipelineStage::None,
    PipelineStage::Animate,
    PipelineStage::UpdateLayers,
    PipelineStage::Commit,
];

fn index_of<T: PartialEq>(table: &[T], value: &T) -> u8 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "lookup tables have fewer than 256 entries"
    )]
    let idx = table.iter().position(|v| v == value).unwrap_or(0) as u8;
    idx
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// A shared buffer of encoded events.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl Recording {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buf.borrow().clone()
    }

    /// Returns the number of recorded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.borrow().len()
    }

    /// Returns whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.borrow().is_empty()
    }

    /// Decodes everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        decode(&self.buf.borrow()).collect()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.buf.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a [`Recording`].
///
/// Clones write to the same recording.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    recording: Recording,
}

impl RecorderSink {
    /// Creates a recorder with a fresh recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that appends to `recording`.
    #[must_use]
    pub fn with_recording(recording: Recording) -> Self {
        Self { recording }
    }

    /// Returns a handle to the recording.
    #[must_use]
    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&self, v: u8) {
        self.recording.buf.borrow_mut().push(v);
    }

    fn write_u32(&self, v: u32) {
        self.recording
            .buf
            .borrow_mut()
            .extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&self, v: u64) {
        self.recording
            .buf
            .borrow_mut()
            .extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&self, n: usize) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "counts capped at u32::MAX for recording"
        )]
        self.write_u32(n.min(u32::MAX as usize) as u32);
    }

    fn write_args(&self, args: &BeginFrameArgs) {
        self.write_u64(args.frame_time.0);
        self.write_u64(args.deadline.0);
        self.write_u64(args.interval.0);
        self.write_u8(match args.kind {
            BeginFrameArgsKind::Normal => 0,
            BeginFrameArgsKind::Missed => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_begin_frame(&mut self, e: &BeginFrameEvent) {
        self.write_u8(TAG_BEGIN_FRAME);
        self.write_args(&e.args);
        self.write_u64(e.adjusted_deadline.0);
    }

    fn on_deadline(&mut self, e: &DeadlineEvent) {
        self.write_u8(TAG_DEADLINE);
        self.write_u64(e.frame_time.0);
        self.write_u64(e.deadline.0);
        self.write_u8(index_of(&DEADLINE_REASONS, &e.reason));
    }

    fn on_draw_and_swap(&mut self, e: &DrawAndSwapEvent) {
        self.write_u8(TAG_DRAW_AND_SWAP);
        self.write_u64(e.frame_time.0);
        self.write_u8(index_of(&DRAW_OUTCOMES, &e.outcome));
    }

    fn on_pending_swaps(&mut self, e: &PendingSwapsEvent) {
        self.write_u8(TAG_PENDING_SWAPS);
        self.write_u64(e.frame_time.0);
        self.write_u32(e.pending_swaps);
        self.write_u32(e.max_pending_swaps);
    }

    fn on_stage(&mut self, e: &StageEvent) {
        self.write_u8(TAG_STAGE);
        self.write_u32(e.pipeline.get());
        self.write_u64(e.source_frame_number);
        self.write_u8(index_of(&STAGES, &e.stage));
        self.write_u64(e.timestamp.0);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u32(e.pipeline.get());
        self.write_u64(e.source_frame_number);
        self.write_u64(e.timestamp.0);
        self.write_u8(match e.outcome {
            CommitOutcome::Sent => 0,
            CommitOutcome::NoUpdate => 1,
        });
        self.write_count(e.layer_updates);
        self.write_count(e.swap_promises);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`BeginFrameEvent`].
    BeginFrame(BeginFrameEvent),
    /// A [`DeadlineEvent`].
    Deadline(DeadlineEvent),
    /// A [`DrawAndSwapEvent`].
    DrawAndSwap(DrawAndSwapEvent),
    /// A [`PendingSwapsEvent`].
    PendingSwaps(PendingSwapsEvent),
    /// A [`StageEvent`].
    Stage(StageEvent),
    /// A [`CommitEvent`].
    Commit(CommitEvent),
}

impl RecordedEvent {
    /// Delivers the event to `sink` as if it had just happened.
    pub fn replay(&self, sink: &mut dyn TraceSink) {
        match self {
            Self::BeginFrame(e) => sink.on_begin_frame(e),
            Self::Deadline(e) => sink.on_deadline(e),
            Self::DrawAndSwap(e) => sink.on_draw_and_swap(e),
            Self::PendingSwaps(e) => sink.on_pending_swaps(e),
            Self::Stage(e) => sink.on_stage(e),
            Self::Commit(e) => sink.on_commit(e),
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Stops at the first truncated record or unknown tag.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_from<T: Copy>(&mut self, table: &[T]) -> Option<T> {
        table.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_args(&mut self) -> Option<BeginFrameArgs> {
        let frame_time = self.read_time()?;
        let deadline = self.read_time()?;
        let interval = Duration(self.read_u64()?);
        let kind = match self.read_u8()? {
            0 => BeginFrameArgsKind::Normal,
            _ => BeginFrameArgsKind::Missed,
        };
        Some(BeginFrameArgs::new(frame_time, deadline, interval, kind))
    }

    fn decode_begin_frame(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BeginFrame(BeginFrameEvent {
            args: self.read_args()?,
            adjusted_deadline: self.read_time()?,
        }))
    }

    fn decode_deadline(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Deadline(DeadlineEvent {
            frame_time: self.read_time()?,
            deadline: self.read_time()?,
            reason: self.read_from(&DEADLINE_REASONS)?,
        }))
    }

    fn decode_draw_and_swap(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DrawAndSwap(DrawAndSwapEvent {
            frame_time: self.read_time()?,
            outcome: self.read_from(&DRAW_OUTCOMES)?,
        }))
    }

    fn decode_pending_swaps(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PendingSwaps(PendingSwapsEvent {
            frame_time: self.read_time()?,
            pending_swaps: self.read_u32()?,
            max_pending_swaps: self.read_u32()?,
        }))
    }

    fn decode_stage(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Stage(StageEvent {
            pipeline: PipelineId::new(self.read_u32()?),
            source_frame_number: self.read_u64()?,
            stage: self.read_from(&STAGES)?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            pipeline: PipelineId::new(self.read_u32()?),
            source_frame_number: self.read_u64()?,
            timestamp: self.read_time()?,
            outcome: match self.read_u8()? {
                0 => CommitOutcome::Sent,
                _ => CommitOutcome::NoUpdate,
            },
            layer_updates: self.read_u32()? as usize,
            swap_promises: self.read_u32()? as usize,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_BEGIN_FRAME => self.decode_begin_frame(),
            TAG_DEADLINE => self.decode_deadline(),
            TAG_DRAW_AND_SWAP => self.decode_draw_and_swap(),
            TAG_PENDING_SWAPS => self.decode_pending_swaps(),
            TAG_STAGE => self.decode_stage(),
            TAG_COMMIT => self.decode_commit(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin_frame() -> BeginFrameEvent {
        BeginFrameEvent {
            args: BeginFrameArgs::new(
                HostTime(1_000_000),
                HostTime(1_016_666),
                Duration(16_666),
                BeginFrameArgsKind::Missed,
            ),
            adjusted_deadline: HostTime(1_011_111),
        }
    }

    #[test]
    fn begin_frame_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_begin_frame();
        rec.on_begin_frame(&orig);

        let events = rec.recording().events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::BeginFrame(e) => {
                assert_eq!(e.args, orig.args);
                assert_eq!(e.adjusted_deadline, orig.adjusted_deadline);
            }
            other => panic!("expected BeginFrame, got {other:?}"),
        }
    }

    #[test]
    fn scheduler_and_pipeline_events_interleave() {
        let mut rec = RecorderSink::new();
        rec.on_deadline(&DeadlineEvent {
            frame_time: HostTime(10),
            deadline: HostTime(20),
            reason: DeadlineReason::WaitingForRootDamage,
        });
        rec.on_stage(&StageEvent {
            pipeline: PipelineId::new(2),
            source_frame_number: 5,
            stage: PipelineStage::UpdateLayers,
            timestamp: HostTime(30),
        });
        rec.on_commit(&CommitEvent {
            pipeline: PipelineId::new(2),
            source_frame_number: 5,
            timestamp: HostTime(40),
            outcome: CommitOutcome::NoUpdate,
            layer_updates: 0,
            swap_promises: 3,
        });
        rec.on_draw_and_swap(&DrawAndSwapEvent {
            frame_time: HostTime(10),
            outcome: DrawOutcome::SwapThrottled,
        });

        let events = rec.recording().events();
        assert_eq!(events.len(), 4);
        match &events[0] {
            RecordedEvent::Deadline(e) => {
                assert_eq!(e.reason, DeadlineReason::WaitingForRootDamage);
                assert_eq!(e.deadline, HostTime(20));
            }
            other => panic!("expected Deadline, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Stage(e) => {
                assert_eq!(e.pipeline, PipelineId::new(2));
                assert_eq!(e.stage, PipelineStage::UpdateLayers);
            }
            other => panic!("expected Stage, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::Commit(e) => {
                assert_eq!(e.outcome, CommitOutcome::NoUpdate);
                assert_eq!(e.swap_promises, 3);
            }
            other => panic!("expected Commit, got {other:?}"),
        }
        assert!(matches!(
            events[3],
            RecordedEvent::DrawAndSwap(DrawAndSwapEvent {
                outcome: DrawOutcome::SwapThrottled,
                ..
            })
        ));
    }

    #[test]
    fn clones_share_one_recording() {
        let mut a = RecorderSink::new();
        let mut b = a.clone();
        let recording = a.recording();
        a.on_pending_swaps(&PendingSwapsEvent {
            frame_time: HostTime(1),
            pending_swaps: 1,
            max_pending_swaps: 1,
        });
        b.on_draw_and_swap(&DrawAndSwapEvent {
            frame_time: HostTime(1),
            outcome: DrawOutcome::Idle,
        });
        assert_eq!(recording.events().len(), 2);

        recording.clear();
        assert!(recording.is_empty());
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_begin_frame(&sample_begin_frame());
        rec.on_begin_frame(&sample_begin_frame());
        let mut bytes = rec.recording().to_bytes();
        bytes.pop();

        assert_eq!(decode(&bytes).count(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn replay_feeds_another_sink() {
        let mut rec = RecorderSink::new();
        rec.on_begin_frame(&sample_begin_frame());

        let copy = RecorderSink::new();
        let mut target = copy.clone();
        for event in rec.recording().events() {
            event.replay(&mut target);
        }
        assert_eq!(copy.recording().to_bytes(), rec.recording().to_bytes());
    }
}
