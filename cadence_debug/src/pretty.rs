// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to milliseconds using a [`Timebase`].

use std::io::Write;

use cadence_core::begin_frame::BeginFrameArgsKind;
use cadence_core::time::{HostTime, Timebase};
use cadence_core::trace::{
    BeginFrameEvent, CommitEvent, CommitOutcome, DeadlineEvent, DrawAndSwapEvent, DrawOutcome,
    PendingSwapsEvent, StageEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ms(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.micros()) as f64 / 1_000_000.0
    }
}

fn outcome_name(outcome: DrawOutcome) -> &'static str {
    match outcome {
        DrawOutcome::Swapped => "swapped",
        DrawOutcome::Failed => "FAILED",
        DrawOutcome::SwapThrottled => "throttled",
        DrawOutcome::ResourcesLocked => "locked",
        DrawOutcome::Idle => "idle",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_begin_frame(&mut self, e: &BeginFrameEvent) {
        let missed = match e.args.kind {
            BeginFrameArgsKind::Normal => "",
            BeginFrameArgsKind::Missed => " (missed)",
        };
        let _ = writeln!(
            self.writer,
            "[begin_frame] t={:.3}ms deadline={:.3}ms adjusted={:.3}ms{missed}",
            self.ms(e.args.frame_time),
            self.ms(e.args.deadline),
            self.ms(e.adjusted_deadline),
        );
    }

    fn on_deadline(&mut self, e: &DeadlineEvent) {
        let _ = writeln!(
            self.writer,
            "[deadline] t={:.3}ms at={:.3}ms reason={}",
            self.ms(e.frame_time),
            self.ms(e.deadline),
            e.reason.as_str(),
        );
    }

    fn on_draw_and_swap(&mut self, e: &DrawAndSwapEvent) {
        let _ = writeln!(
            self.writer,
            "[draw] t={:.3}ms {}",
            self.ms(e.frame_time),
            outcome_name(e.outcome),
        );
    }

    fn on_pending_swaps(&mut self, e: &PendingSwapsEvent) {
        let _ = writeln!(
            self.writer,
            "[swaps] t={:.3}ms pending={}/{}",
            self.ms(e.frame_time),
            e.pending_swaps,
            e.max_pending_swaps,
        );
    }

    fn on_stage(&mut self, e: &StageEvent) {
        let _ = writeln!(
            self.writer,
            "[stage] pipeline={} frame={} {} at {:.3}ms",
            e.pipeline.get(),
            e.source_frame_number,
            e.stage,
            self.ms(e.timestamp),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        match e.outcome {
            CommitOutcome::Sent => {
                let _ = writeln!(
                    self.writer,
                    "[commit] pipeline={} frame={} sent layers={} promises={}",
                    e.pipeline.get(),
                    e.source_frame_number,
                    e.layer_updates,
                    e.swap_promises,
                );
            }
            CommitOutcome::NoUpdate => {
                let _ = writeln!(
                    self.writer,
                    "[commit] pipeline={} frame={} no update, broke {} promises",
                    e.pipeline.get(),
                    e.source_frame_number,
                    e.swap_promises,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cadence_core::display_scheduler::DeadlineReason;
    use cadence_core::pipeline::{PipelineId, PipelineStage};

    use super::*;

    fn sink() -> PrettyPrintSink<Vec<u8>> {
        PrettyPrintSink::with_writer(Vec::new(), Timebase::MICROS)
    }

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn deadline_line_names_reason() {
        let mut sink = sink();
        sink.on_deadline(&DeadlineEvent {
            frame_time: HostTime(16_000),
            deadline: HostTime(26_500),
            reason: DeadlineReason::ResizePending,
        });
        let output = output(sink);
        assert!(output.contains("[deadline]"), "got: {output}");
        assert!(output.contains("at=26.500ms"), "got: {output}");
        assert!(output.contains("reason=resize_pending"), "got: {output}");
    }

    #[test]
    fn pipeline_lines() {
        let mut sink = sink();
        sink.on_stage(&StageEvent {
            pipeline: PipelineId::new(1),
            source_frame_number: 4,
            stage: PipelineStage::Commit,
            timestamp: HostTime(1_000),
        });
        sink.on_commit(&CommitEvent {
            pipeline: PipelineId::new(1),
            source_frame_number: 4,
            timestamp: HostTime(1_000),
            outcome: CommitOutcome::NoUpdate,
            layer_updates: 0,
            swap_promises: 2,
        });
        let output = output(sink);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[stage] pipeline=1 frame=4 commit at 1.000ms");
        assert!(lines[1].contains("broke 2 promises"), "got: {output}");
    }
}
