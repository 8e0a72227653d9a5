// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Display scheduler events land in process 0. Each pipeline gets the
//! process matching its id, with its stages drawn as consecutive duration
//! slices.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde_json::{Value, json};

use cadence_core::pipeline::PipelineStage;
use cadence_core::time::{HostTime, Timebase};
use cadence_core::trace::CommitOutcome;

use crate::recorder::{RecordedEvent, decode};

const DISPLAY_PID: u32 = 0;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Stage slice currently open per pipeline.
    let mut open: BTreeMap<u32, (PipelineStage, HostTime)> = BTreeMap::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::BeginFrame(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "BeginFrame",
                    "cat": "Display",
                    "ts": to_us(e.args.frame_time, timebase),
                    "pid": DISPLAY_PID,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "deadline_us": to_us(e.args.deadline, timebase),
                        "adjusted_deadline_us": to_us(e.adjusted_deadline, timebase),
                        "kind": format!("{:?}", e.args.kind),
                    }
                }));
            }
            RecordedEvent::Deadline(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "ScheduleDeadline",
                    "cat": "Display",
                    "ts": to_us(e.frame_time, timebase),
                    "pid": DISPLAY_PID,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "deadline_us": to_us(e.deadline, timebase),
                        "reason": e.reason.as_str(),
                    }
                }));
            }
            RecordedEvent::DrawAndSwap(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DrawAndSwap",
                    "cat": "Display",
                    "ts": to_us(e.frame_time, timebase),
                    "pid": DISPLAY_PID,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "outcome": format!("{:?}", e.outcome),
                    }
                }));
            }
            RecordedEvent::PendingSwaps(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "PendingSwaps",
                    "cat": "Display",
                    "ts": to_us(e.frame_time, timebase),
                    "pid": DISPLAY_PID,
                    "tid": 0,
                    "args": {
                        "pending": e.pending_swaps,
                    }
                }));
            }
            RecordedEvent::Stage(e) => {
                let pid = e.pipeline.get();
                if let Some((stage, _)) = open.remove(&pid) {
                    events.push(stage_slice(
                        "E",
                        pid,
                        stage,
                        e.timestamp,
                        timebase,
                        e.source_frame_number,
                    ));
                }
                if e.stage != PipelineStage::None {
                    events.push(stage_slice(
                        "B",
                        pid,
                        e.stage,
                        e.timestamp,
                        timebase,
                        e.source_frame_number,
                    ));
                    open.insert(pid, (e.stage, e.timestamp));
                }
            }
            RecordedEvent::Commit(e) => {
                let name = match e.outcome {
                    CommitOutcome::Sent => "Commit",
                    CommitOutcome::NoUpdate => "CommitNoUpdate",
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Pipeline",
                    "ts": to_us(e.timestamp, timebase),
                    "pid": e.pipeline.get(),
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "source_frame_number": e.source_frame_number,
                        "layer_updates": e.layer_updates,
                        "swap_promises": e.swap_promises,
                    }
                }));
            }
        }
    }

    // Close slices left open by a truncated recording.
    for (pid, (stage, started)) in open {
        events.push(stage_slice("E", pid, stage, started, timebase, 0));
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn stage_slice(
    ph: &str,
    pid: u32,
    stage: PipelineStage,
    at: HostTime,
    timebase: Timebase,
    source_frame_number: u64,
) -> Value {
    json!({
        "ph": ph,
        "name": stage.as_str(),
        "cat": "Pipeline",
        "ts": to_us(at, timebase),
        "pid": pid,
        "tid": 0,
        "args": {
            "source_frame_number": source_frame_number,
        }
    })
}

fn to_us(t: HostTime, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(t.micros()) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use cadence_core::display_scheduler::DeadlineReason;
    use cadence_core::pipeline::PipelineId;
    use cadence_core::trace::{DeadlineEvent, StageEvent, TraceSink};

    use super::*;
    use crate::recorder::RecorderSink;

    fn stage(stage: PipelineStage, at: u64) -> StageEvent {
        StageEvent {
            pipeline: PipelineId::new(1),
            source_frame_number: 0,
            stage,
            timestamp: HostTime(at),
        }
    }

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_deadline(&DeadlineEvent {
            frame_time: HostTime(1_000),
            deadline: HostTime(1_016),
            reason: DeadlineReason::Regular,
        });
        rec.on_stage(&stage(PipelineStage::Animate, 2_000));
        rec.on_stage(&stage(PipelineStage::Commit, 2_500));
        rec.on_stage(&stage(PipelineStage::None, 3_000));

        let mut out = Vec::new();
        export(&rec.recording().to_bytes(), Timebase::MICROS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();

        let phases: Vec<&str> = parsed.iter().map(|e| e["ph"].as_str().unwrap()).collect();
        assert_eq!(phases, ["i", "B", "E", "B", "E"]);
        assert_eq!(parsed[0]["args"]["reason"], "regular");
        assert_eq!(parsed[1]["name"], "animate");
        assert_eq!(parsed[1]["ts"], 2_000.0);
        assert_eq!(parsed[3]["name"], "commit");
        assert_eq!(parsed[4]["pid"], 1);
    }

    #[test]
    fn unterminated_stage_is_closed() {
        let mut rec = RecorderSink::new();
        rec.on_stage(&stage(PipelineStage::UpdateLayers, 5));

        let mut out = Vec::new();
        export(&rec.recording().to_bytes(), Timebase::MICROS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["ph"], "E");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::MICROS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
