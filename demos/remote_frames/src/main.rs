// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated display loop driving a remote frame pipeline.
//!
//! A [`RemoteFramePipeline`] animates a small layer tree and commits to a
//! bridge that stands in for the remote compositor. Each commit damages a
//! child surface on a [`DisplayScheduler`], which also receives root damage
//! every frame. Both record into one shared
//! [`Recording`](cadence_debug::recorder::Recording), which is printed with a
//! [`PrettyPrintSink`] and exported as a Chrome trace.
//!
//! Library diagnostics go through `env_logger`; run with
//! `RUST_LOG=cadence_core=debug` to see them.

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::{Affine, Size};

use cadence_core::begin_frame::{BeginFrameArgs, DEFAULT_INTERVAL, ExternalBeginFrameSource};
use cadence_core::clock::{Clock, ManualClock};
use cadence_core::commit::{CommitMessage, CommitPayload};
use cadence_core::display_scheduler::{
    DisplayScheduler, DisplaySchedulerClient, DisplaySchedulerConfig,
};
use cadence_core::layer::{ContentId, LayerId};
use cadence_core::pipeline::{
    PipelineClient, PipelineConfig, PipelineHost, PipelineIdAllocator, RemoteCompositorBridge,
    RemoteFramePipeline,
};
use cadence_core::surface::{FrameSinkId, LocalFrameId, SurfaceId};
use cadence_core::swap_promise::{DidNotSwapReason, SwapPromise};
use cadence_core::time::{HostTime, Timebase};

use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 60;
/// Repaint the spinner's content every this many main frames.
const REPAINT_EVERY: u64 = 15;

const ROOT_SURFACE: SurfaceId =
    SurfaceId::new(FrameSinkId::new(1, 1), LocalFrameId::new(1, 0x5eed));
const REMOTE_SURFACE: SurfaceId =
    SurfaceId::new(FrameSinkId::new(2, 1), LocalFrameId::new(1, 0xbeef));

// -- display side ------------------------------------------------------------

#[derive(Debug, Default)]
struct Display {
    frames_drawn: u64,
}

impl DisplaySchedulerClient for Display {
    fn draw_and_swap(&mut self) -> bool {
        self.frames_drawn += 1;
        true
    }
}

// -- producer side -----------------------------------------------------------

#[derive(Debug, Default)]
struct Spinner {
    layer: Option<LayerId>,
    main_frames: u64,
}

impl PipelineClient for Spinner {
    fn begin_main_frame(&mut self, host: &mut PipelineHost, args: &BeginFrameArgs) {
        let Some(layer) = self.layer else {
            return;
        };
        self.main_frames += 1;
        let angle = args.frame_time.micros() as f64 * 1e-6 * core::f64::consts::TAU;
        let repaint = self.main_frames % REPAINT_EVERY == 0;
        host.mutate_layers(|tree| {
            tree.set_transform(layer, Affine::rotate_about(angle, (32.0, 32.0)));
            if repaint {
                tree.set_needs_display(layer);
            }
        });
        // Keep spinning.
        host.set_needs_animate();
    }
}

#[derive(Debug, Default)]
struct Bridge {
    scheduled: Rc<Cell<bool>>,
    inbox: Rc<RefCell<Vec<CommitPayload>>>,
}

impl RemoteCompositorBridge for Bridge {
    fn schedule_main_frame(&mut self) {
        self.scheduled.set(true);
    }

    fn process_compositor_state_update(&mut self, payload: CommitPayload) {
        self.inbox.borrow_mut().push(payload);
    }
}

struct FrameAck {
    id: u64,
    acked: Rc<RefCell<Vec<u64>>>,
}

impl SwapPromise for FrameAck {
    fn did_not_swap(self: Box<Self>, reason: DidNotSwapReason) {
        println!("promise {} broken: {reason:?}", self.id);
    }

    fn did_swap(self: Box<Self>) {
        self.acked.borrow_mut().push(self.id);
    }

    fn trace_id(&self) -> u64 {
        self.id
    }
}

fn main() {
    env_logger::init();

    let timebase = Timebase::MICROS;
    let clock = Rc::new(ManualClock::new(HostTime(1_000_000)));
    let recorder = RecorderSink::new();
    let recording = recorder.recording();

    // -- display -----------------------------------------------------------
    let mut display = DisplayScheduler::new(
        DisplaySchedulerConfig::default(),
        ExternalBeginFrameSource::new(),
        Display::default(),
    );
    display.set_trace_sink(Box::new(recorder.clone()));
    display.set_visible(true);
    display.set_root_surface_resources_locked(false);
    display.set_new_root_surface(ROOT_SURFACE);

    // -- pipeline ----------------------------------------------------------
    let ids = PipelineIdAllocator::new();
    let bridge = Bridge::default();
    let scheduled = Rc::clone(&bridge.scheduled);
    let inbox = Rc::clone(&bridge.inbox);
    let mut pipeline = RemoteFramePipeline::new(
        ids.allocate(),
        PipelineConfig::default(),
        Spinner::default(),
        bridge,
        Rc::clone(&clock),
    );
    pipeline.set_trace_sink(Box::new(recorder));
    pipeline.set_visible(true);

    let spinner = pipeline.mutate_layers(|tree| {
        let root = tree.create_layer();
        let spinner = tree.create_layer();
        tree.set_root(Some(root));
        tree.add_child(root, spinner);
        tree.set_viewport_size(Size::new(640.0, 480.0));
        tree.set_bounds(spinner, Size::new(64.0, 64.0));
        tree.set_content(spinner, Some(ContentId(1)));
        spinner
    });
    pipeline.client_mut().layer = Some(spinner);

    let acked = Rc::new(RefCell::new(Vec::new()));
    let mut commit_bytes = 0;

    // -- simulated loop ----------------------------------------------------
    for frame in 0..FRAME_COUNT {
        let now = clock.now();

        // Producer.
        if scheduled.replace(false) {
            if frame % 10 == 0 {
                pipeline.queue_swap_promise(Box::new(FrameAck {
                    id: frame,
                    acked: Rc::clone(&acked),
                }));
            }
            pipeline.begin_main_frame();
        }
        let _ = pipeline.run_pending_tasks();

        // The remote compositor takes the commit and produces a frame.
        for payload in inbox.borrow_mut().drain(..) {
            let json = payload.message.to_json().expect("commit encodes");
            commit_bytes += json.len();
            let received = CommitMessage::from_json(&json).expect("commit decodes");
            debug_assert_eq!(&received, &payload.message, "wire round trip is lossless");
            let _ = payload.did_swap();
            display.surface_damaged(REMOTE_SURFACE);
        }

        // Browser UI damages the root every frame.
        display.surface_damaged(ROOT_SURFACE);

        // Display.
        if display.pending_swaps() > 0 {
            display.did_swap_buffers_complete();
        }
        let _ = display.on_begin_frame(BeginFrameArgs::normal(now, DEFAULT_INTERVAL));
        if let Some(deadline) = display.scheduled_deadline() {
            clock.set(deadline.max(now));
            let drawn = display.client().frames_drawn;
            if display.poll(clock.now()) && display.client().frames_drawn > drawn {
                display.did_swap_buffers();
            }
        }

        clock.set(now + DEFAULT_INTERVAL);
    }

    // -- report ------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()), timebase);
    for event in recording.events() {
        event.replay(&mut pretty);
    }

    let path = "remote_frames_trace.json";
    let file = File::create(path).expect("failed to create trace file");
    let mut writer = BufWriter::new(file);
    cadence_debug::chrome::export(&recording.to_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!(
        "{FRAME_COUNT} vsyncs: {} main frames, {} draws, {} promises swapped, {commit_bytes} commit bytes",
        pipeline.source_frame_number(),
        display.client().frames_drawn,
        acked.borrow().len(),
    );
    println!("Wrote {path}");
}
