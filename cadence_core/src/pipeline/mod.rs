// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Main-frame pipeline for a producer whose compositor lives elsewhere.
//!
//! A [`RemoteFramePipeline`] owns a [`LayerTree`] and runs *main frames*
//! over it. There is no local drawing: the last stage ships the changed
//! inputs of the tree to a [`RemoteCompositorBridge`].
//!
//! ```text
//!  set_needs_*() ──► requested stage ──► bridge.schedule_main_frame()
//!                                                   │
//!                           begin_main_frame() ◄────┘
//!                                   │
//!        Animate ──► UpdateLayers ──► Commit ──► complete
//!        client       repaint         capture     did_commit
//!        callbacks    invalidated     delta,      did_begin_main_frame
//!                     content         hand off    (then queued draw/swap
//!                                                  notifications)
//! ```
//!
//! Requests coalesce: any number of them between two main frames produce
//! one `schedule_main_frame` and one main frame that runs through the
//! highest requested stage. A request made *during* a main frame for a
//! stage the frame has not reached yet extends the running frame instead.
//!
//! # Driving
//!
//! The bridge decides when [`begin_main_frame`](RemoteFramePipeline::begin_main_frame)
//! runs. After a commit, the owner calls
//! [`run_pending_tasks`](RemoteFramePipeline::run_pending_tasks) on its
//! next turn to deliver the draw/swap notifications.

mod client;
mod host;
mod id;
mod stage;

pub use client::{PipelineClient, RemoteCompositorBridge};
pub use host::PipelineHost;
pub use id::{PipelineId, PipelineIdAllocator};
pub use stage::PipelineStage;

use core::fmt;

use kurbo::Rect;

use crate::begin_frame::{BeginFrameArgs, BeginFrameArgsKind};
use crate::clock::Clock;
use crate::commit::{CommitMessage, CommitPayload};
use crate::layer::LayerTree;
use crate::swap_promise::{DidNotSwapReason, SwapPromise};
use crate::task_queue::TaskQueue;
use crate::time::Duration;
use crate::trace::{CommitEvent, CommitOutcome, StageEvent, TraceSink, Tracer};

/// Pipeline settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Interval of the synthetic begin-frame arguments handed to the
    /// client. Remote producers have no display to follow.
    pub frame_interval: Duration,
}

impl PipelineConfig {
    /// 16 ms frames.
    pub const DEFAULT: Self = Self {
        frame_interval: Duration::from_millis(16),
    };

    /// Returns a copy with a different frame interval.
    #[must_use]
    pub const fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runs coalesced main frames and hands commits to a remote compositor.
///
/// Single-threaded: the client, bridge, and clock are plain owned values,
/// and every entry point takes `&mut self`.
pub struct RemoteFramePipeline<C, B, K> {
    host: PipelineHost,
    client: C,
    bridge: B,
    clock: K,
    config: PipelineConfig,
    tasks: TaskQueue<C>,
    tracer: Tracer,
}

impl<C, B, K> fmt::Debug for RemoteFramePipeline<C, B, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFramePipeline")
            .field("host", &self.host)
            .field("config", &self.config)
            .field("pending_tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl<C, B, K> RemoteFramePipeline<C, B, K>
where
    C: PipelineClient + 'static,
    B: RemoteCompositorBridge,
    K: Clock,
{
    /// Creates an idle, invisible pipeline with an empty layer tree.
    #[must_use]
    pub fn new(id: PipelineId, config: PipelineConfig, client: C, bridge: B, clock: K) -> Self {
        Self {
            host: PipelineHost::new(id),
            client,
            bridge,
            clock,
            config,
            tasks: TaskQueue::new(),
            tracer: Tracer::none(),
        }
    }

    /// Routes trace events to `sink`.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    // -- Requests --

    /// Requests a main frame that runs at least the animate stage.
    pub fn set_needs_animate(&mut self) {
        self.request_stage(PipelineStage::Animate);
    }

    /// Requests a main frame that runs at least the update-layers stage.
    pub fn set_needs_update_layers(&mut self) {
        self.request_stage(PipelineStage::UpdateLayers);
    }

    /// Requests a main frame that commits.
    pub fn set_needs_commit(&mut self) {
        self.request_stage(PipelineStage::Commit);
    }

    /// See [`PipelineHost::request_stage`].
    pub fn request_stage(&mut self, stage: PipelineStage) {
        self.host.request_stage(stage);
        self.schedule_main_frame_if_necessary();
    }

    /// Edits the layer tree; see [`PipelineHost::mutate_layers`].
    pub fn mutate_layers<R>(&mut self, f: impl FnOnce(&mut LayerTree) -> R) -> R {
        let result = self.host.mutate_layers(f);
        self.schedule_main_frame_if_necessary();
        result
    }

    /// Runs `f` against the host, then schedules whatever it requested.
    pub fn with_host<R>(&mut self, f: impl FnOnce(&mut PipelineHost) -> R) -> R {
        let result = f(&mut self.host);
        self.schedule_main_frame_if_necessary();
        result
    }

    /// Ties `promise` to the next commit.
    pub fn queue_swap_promise(&mut self, promise: Box<dyn SwapPromise>) {
        self.host.queue_swap_promise(promise);
    }

    /// Suspends or resumes main frames.
    ///
    /// While deferred, requests accumulate but the bridge is not asked for
    /// a main frame, and a main frame the bridge already scheduled returns
    /// without running.
    pub fn set_defer_commits(&mut self, defer_commits: bool) {
        self.host.stages.defer_commits = defer_commits;
        self.schedule_main_frame_if_necessary();
    }

    /// Records visibility. Kept locally; the remote side knows better.
    pub fn set_visible(&mut self, visible: bool) {
        self.host.set_visible(visible);
    }

    // -- Unsupported requests --

    /// Ignored: the remote compositor owns damage.
    pub fn set_needs_redraw_rect(&mut self, damage: Rect) {
        log::warn!(
            "pipeline {}: set_needs_redraw_rect({damage:?}) is not supported remotely",
            self.host.id.get()
        );
    }

    /// Ignored: input is never throttled on the producer side.
    pub fn notify_input_throttled_until_commit(&mut self) {
        log::warn!(
            "pipeline {}: notify_input_throttled_until_commit is not supported remotely",
            self.host.id.get()
        );
    }

    /// Ignored: flings are handled by the remote compositor.
    pub fn did_stop_flinging(&mut self) {
        log::warn!(
            "pipeline {}: did_stop_flinging is not supported remotely",
            self.host.id.get()
        );
    }

    /// Ignored: there is no local activation.
    pub fn set_next_commit_waits_for_activation(&mut self) {
        log::warn!(
            "pipeline {}: set_next_commit_waits_for_activation is not supported remotely",
            self.host.id.get()
        );
    }

    /// Ignored: raster scales are the remote compositor's concern.
    pub fn set_needs_recalculate_raster_scales(&mut self) {
        log::debug!(
            "pipeline {}: ignoring set_needs_recalculate_raster_scales",
            self.host.id.get()
        );
    }

    // -- Main frame --

    /// Runs one main frame. Called by the bridge's owner once for every
    /// [`RemoteCompositorBridge::schedule_main_frame`].
    ///
    /// # Panics
    ///
    /// Panics if no main frame was scheduled with the bridge, or if called
    /// re-entrantly.
    pub fn begin_main_frame(&mut self) {
        assert!(
            self.host.stages.main_frame_requested_from_bridge,
            "begin_main_frame without a scheduled main frame"
        );
        self.host.stages.main_frame_requested_from_bridge = false;

        if self.host.stages.defer_commits {
            log::debug!("pipeline {}: main frame deferred", self.host.id.get());
            return;
        }

        self.host.stages.start_frame();

        self.client.will_begin_main_frame();
        self.enter_stage(PipelineStage::Animate);
        let now = self.clock.now();
        let interval = self.config.frame_interval;
        let args = BeginFrameArgs::new(now, now + interval, interval, BeginFrameArgsKind::Normal);
        self.client.begin_main_frame(&mut self.host, &args);
        self.client.update_layer_tree_host(&mut self.host);
        self.schedule_main_frame_if_necessary();

        self.enter_stage(PipelineStage::UpdateLayers);
        if self.host.stages.max_stage_for_current_frame >= PipelineStage::UpdateLayers
            && self.host.tree.update_layers(self.host.source_frame_number)
        {
            // Repainted content has to reach the compositor.
            self.host.stages.max_stage_for_current_frame = PipelineStage::Commit;
        }

        self.enter_stage(PipelineStage::Commit);
        self.client.will_commit();

        if self.host.stages.max_stage_for_current_frame < PipelineStage::Commit {
            let broken = self.host.swap_promises.len();
            self.host
                .swap_promises
                .break_swap_promises(DidNotSwapReason::CommitNoUpdate);
            self.tracer.commit(&CommitEvent {
                pipeline: self.host.id,
                source_frame_number: self.host.source_frame_number,
                timestamp: self.clock.now(),
                outcome: CommitOutcome::NoUpdate,
                layer_updates: 0,
                swap_promises: broken,
            });
            self.main_frame_complete();
            return;
        }

        let swap_promises = self.host.swap_promises.take_swap_promises();
        let message = CommitMessage::capture(
            self.host.id,
            self.host.source_frame_number,
            &mut self.host.tree,
        );
        self.tracer.commit(&CommitEvent {
            pipeline: self.host.id,
            source_frame_number: self.host.source_frame_number,
            timestamp: self.clock.now(),
            outcome: CommitOutcome::Sent,
            layer_updates: message.layer_updates.len(),
            swap_promises: swap_promises.len(),
        });
        self.bridge.process_compositor_state_update(CommitPayload {
            message,
            swap_promises,
        });

        self.main_frame_complete();

        // Nothing reports back from the remote side, so a sent commit counts
        // as drawn and swapped once the caller's turn ends.
        self.tasks.post(|client: &mut C| {
            client.did_commit_and_draw_frame();
            client.did_complete_swap_buffers();
        });
    }

    /// Delivers queued notifications. Returns how many tasks ran.
    pub fn run_pending_tasks(&mut self) -> usize {
        self.tasks.run_all(&mut self.client)
    }

    fn main_frame_complete(&mut self) {
        self.host.stages.finish_frame();
        self.trace_stage(PipelineStage::None);
        self.host.source_frame_number += 1;

        self.client.did_commit();
        self.client.did_begin_main_frame();
    }

    fn schedule_main_frame_if_necessary(&mut self) {
        if !self.host.stages.should_schedule() {
            return;
        }
        self.bridge.schedule_main_frame();
        self.host.stages.main_frame_requested_from_bridge = true;
    }

    fn enter_stage(&mut self, stage: PipelineStage) {
        self.host.stages.current_stage = stage;
        self.trace_stage(stage);
    }

    fn trace_stage(&mut self, stage: PipelineStage) {
        self.tracer.stage(&StageEvent {
            pipeline: self.host.id,
            source_frame_number: self.host.source_frame_number,
            stage,
            timestamp: self.clock.now(),
        });
    }
}

impl<C, B, K> RemoteFramePipeline<C, B, K> {
    /// Returns the pipeline's id.
    #[must_use]
    pub fn id(&self) -> PipelineId {
        self.host.id
    }

    /// Number of main frames completed so far.
    #[must_use]
    pub fn source_frame_number(&self) -> u64 {
        self.host.source_frame_number
    }

    /// Stage the running main frame is in.
    #[must_use]
    pub fn current_stage(&self) -> PipelineStage {
        self.host.stages.current_stage
    }

    /// Whether a main frame has been requested and not yet run.
    #[must_use]
    pub fn begin_main_frame_requested(&self) -> bool {
        self.host.stages.requested_stage_for_next_frame != PipelineStage::None
    }

    /// Whether the next main frame will commit.
    #[must_use]
    pub fn commit_requested(&self) -> bool {
        self.host.stages.requested_stage_for_next_frame == PipelineStage::Commit
    }

    /// Whether commits are deferred.
    #[must_use]
    pub fn defer_commits(&self) -> bool {
        self.host.stages.defer_commits
    }

    /// Whether the embedder is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.host.visible
    }

    /// Read access to the layer tree.
    #[must_use]
    pub fn layer_tree(&self) -> &LayerTree {
        &self.host.tree
    }

    /// Read access to the host.
    #[must_use]
    pub fn host(&self) -> &PipelineHost {
        &self.host
    }

    /// Number of queued notification tasks.
    #[must_use]
    pub fn pending_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the client mutably.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Returns the bridge.
    #[must_use]
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Returns the bridge mutably.
    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use kurbo::Affine;

    use super::*;
    use crate::clock::ManualClock;
    use crate::layer::LayerId;
    use crate::time::HostTime;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Call {
        WillBeginMainFrame,
        BeginMainFrame(HostTime, HostTime),
        UpdateLayerTreeHost,
        WillCommit,
        DidCommit,
        DidBeginMainFrame,
        DidCommitAndDrawFrame,
        DidCompleteSwapBuffers,
        ScheduleMainFrame,
        ProcessUpdate(u64),
    }

    type Log = Rc<RefCell<Vec<Call>>>;
    type Edit = Box<dyn FnMut(&mut PipelineHost)>;

    struct FakeClient {
        log: Log,
        on_update: Option<Edit>,
    }

    impl PipelineClient for FakeClient {
        fn will_begin_main_frame(&mut self) {
            self.log.borrow_mut().push(Call::WillBeginMainFrame);
        }
        fn begin_main_frame(&mut self, host: &mut PipelineHost, args: &BeginFrameArgs) {
            assert_eq!(host.current_stage(), PipelineStage::Animate);
            self.log
                .borrow_mut()
                .push(Call::BeginMainFrame(args.frame_time, args.deadline));
        }
        fn update_layer_tree_host(&mut self, host: &mut PipelineHost) {
            self.log.borrow_mut().push(Call::UpdateLayerTreeHost);
            if let Some(edit) = &mut self.on_update {
                edit(host);
            }
        }
        fn will_commit(&mut self) {
            self.log.borrow_mut().push(Call::WillCommit);
        }
        fn did_commit(&mut self) {
            self.log.borrow_mut().push(Call::DidCommit);
        }
        fn did_begin_main_frame(&mut self) {
            self.log.borrow_mut().push(Call::DidBeginMainFrame);
        }
        fn did_commit_and_draw_frame(&mut self) {
            self.log.borrow_mut().push(Call::DidCommitAndDrawFrame);
        }
        fn did_complete_swap_buffers(&mut self) {
            self.log.borrow_mut().push(Call::DidCompleteSwapBuffers);
        }
    }

    struct FakeBridge {
        log: Log,
        payloads: Vec<CommitPayload>,
    }

    impl RemoteCompositorBridge for FakeBridge {
        fn schedule_main_frame(&mut self) {
            self.log.borrow_mut().push(Call::ScheduleMainFrame);
        }
        fn process_compositor_state_update(&mut self, payload: CommitPayload) {
            self.log
                .borrow_mut()
                .push(Call::ProcessUpdate(payload.message.source_frame_number));
            self.payloads.push(payload);
        }
    }

    struct RecordingPromise {
        id: u64,
        results: Rc<RefCell<Vec<(u64, Option<DidNotSwapReason>)>>>,
    }

    impl SwapPromise for RecordingPromise {
        fn did_not_swap(self: Box<Self>, reason: DidNotSwapReason) {
            self.results.borrow_mut().push((self.id, Some(reason)));
        }
        fn did_swap(self: Box<Self>) {
            self.results.borrow_mut().push((self.id, None));
        }
        fn trace_id(&self) -> u64 {
            self.id
        }
    }

    type TestPipeline = RemoteFramePipeline<FakeClient, FakeBridge, Rc<ManualClock>>;

    struct Fixture {
        log: Log,
        clock: Rc<ManualClock>,
        pipeline: TestPipeline,
    }

    impl Fixture {
        fn new() -> Self {
            let log = Log::default();
            let clock = Rc::new(ManualClock::new(HostTime(1_000)));
            let pipeline = RemoteFramePipeline::new(
                PipelineId::new(3),
                PipelineConfig::default(),
                FakeClient {
                    log: log.clone(),
                    on_update: None,
                },
                FakeBridge {
                    log: log.clone(),
                    payloads: Vec::new(),
                },
                clock.clone(),
            );
            Self {
                log,
                clock,
                pipeline,
            }
        }

        fn take_log(&self) -> Vec<Call> {
            core::mem::take(&mut *self.log.borrow_mut())
        }

        fn schedule_count(&self) -> usize {
            self.log
                .borrow()
                .iter()
                .filter(|call| **call == Call::ScheduleMainFrame)
                .count()
        }

        fn with_root(mut self) -> (Self, LayerId) {
            let root = self.pipeline.mutate_layers(|tree| {
                let root = tree.create_layer();
                tree.set_root(Some(root));
                root
            });
            self.pipeline.begin_main_frame();
            let _ = self.pipeline.run_pending_tasks();
            self.pipeline.bridge_mut().payloads.clear();
            let _ = self.take_log();
            (self, root)
        }
    }

    #[test]
    fn owner_requests_next_frame_after_draw_notification() {
        let (mut f, root) = Fixture::new().with_root();
        f.pipeline.mutate_layers(|tree| tree.set_opacity(root, 0.5));
        f.pipeline.begin_main_frame();
        let _ = f.take_log();
        assert!(!f.pipeline.begin_main_frame_requested());

        let _ = f.pipeline.run_pending_tasks();
        let drawn = f.take_log().contains(&Call::DidCommitAndDrawFrame);
        assert!(drawn);
        f.pipeline.with_host(|host| host.set_needs_animate());

        assert_eq!(f.take_log(), [Call::ScheduleMainFrame]);
        assert!(f.pipeline.begin_main_frame_requested());
        assert!(!f.pipeline.commit_requested());
    }

    #[test]
    fn requests_coalesce_into_one_schedule() {
        let mut f = Fixture::new();
        assert!(!f.pipeline.begin_main_frame_requested());

        f.pipeline.set_needs_animate();
        f.pipeline.set_needs_update_layers();
        f.pipeline.set_needs_commit();
        f.pipeline.set_needs_animate();

        assert_eq!(f.schedule_count(), 1, "one outstanding bridge request");
        assert!(f.pipeline.begin_main_frame_requested());
        assert!(f.pipeline.commit_requested(), "highest stage wins");
    }

    #[test]
    fn full_frame_runs_stages_in_order() {
        let mut f = Fixture::new();
        f.pipeline.set_needs_commit();
        let _ = f.take_log();

        f.pipeline.begin_main_frame();
        let now = f.clock.now();
        assert_eq!(
            f.take_log(),
            [
                Call::WillBeginMainFrame,
                Call::BeginMainFrame(now, now + Duration::from_millis(16)),
                Call::UpdateLayerTreeHost,
                Call::WillCommit,
                Call::ProcessUpdate(0),
                Call::DidCommit,
                Call::DidBeginMainFrame,
            ]
        );
        assert_eq!(f.pipeline.source_frame_number(), 1);
        assert_eq!(f.pipeline.current_stage(), PipelineStage::None);
        assert!(!f.pipeline.begin_main_frame_requested());

        assert_eq!(f.pipeline.pending_task_count(), 1);
        assert_eq!(f.pipeline.run_pending_tasks(), 1);
        assert_eq!(
            f.take_log(),
            [Call::DidCommitAndDrawFrame, Call::DidCompleteSwapBuffers]
        );
    }

    #[test]
    fn animate_only_frame_breaks_promises_without_commit() {
        let mut f = Fixture::new();
        let results = Rc::new(RefCell::new(Vec::new()));
        f.pipeline.queue_swap_promise(Box::new(RecordingPromise {
            id: 9,
            results: results.clone(),
        }));
        f.pipeline.set_needs_animate();
        let _ = f.take_log();

        f.pipeline.begin_main_frame();
        let log = f.take_log();
        assert!(!log.contains(&Call::ProcessUpdate(0)), "nothing sent");
        assert!(log.contains(&Call::DidCommit), "still completes for the client");
        assert_eq!(
            *results.borrow(),
            [(9, Some(DidNotSwapReason::CommitNoUpdate))]
        );
        assert_eq!(f.pipeline.source_frame_number(), 1);
        assert_eq!(f.pipeline.pending_task_count(), 0);
    }

    #[test]
    fn commit_hands_promises_and_delta_to_bridge() {
        let (mut f, root) = Fixture::new().with_root();
        let results = Rc::new(RefCell::new(Vec::new()));
        f.pipeline.queue_swap_promise(Box::new(RecordingPromise {
            id: 4,
            results: results.clone(),
        }));
        f.pipeline
            .mutate_layers(|tree| tree.set_transform(root, Affine::translate((1.0, 2.0))));
        assert!(f.pipeline.commit_requested());

        f.pipeline.begin_main_frame();
        let payload = f.pipeline.bridge_mut().payloads.remove(0);
        assert_eq!(payload.message.pipeline_id, PipelineId::new(3));
        assert_eq!(payload.message.source_frame_number, 1);
        assert_eq!(payload.message.layer_updates.len(), 1);
        assert_eq!(payload.message.layer_updates[0].layer, root);
        assert_eq!(payload.swap_promises.len(), 1);
        assert!(results.borrow().is_empty(), "bridge owns the promise now");

        let _ = payload.did_swap();
        assert_eq!(*results.borrow(), [(4, None)]);
    }

    #[test]
    fn content_update_forces_commit() {
        let (mut f, root) = Fixture::new().with_root();
        f.pipeline.mutate_layers(|tree| tree.set_needs_display(root));
        assert!(f.pipeline.begin_main_frame_requested());
        assert!(!f.pipeline.commit_requested(), "only an update was asked for");

        f.pipeline.begin_main_frame();
        assert!(f.take_log().contains(&Call::ProcessUpdate(1)));
        assert_eq!(f.pipeline.layer_tree().content_version(root), 1);
        assert_eq!(f.pipeline.layer_tree().last_update_frame(root), Some(1));
    }

    #[test]
    fn update_without_invalidation_does_not_commit() {
        let mut f = Fixture::new();
        f.pipeline.set_needs_update_layers();
        let _ = f.take_log();

        f.pipeline.begin_main_frame();
        assert!(!f.take_log().iter().any(|c| matches!(c, Call::ProcessUpdate(_))));
    }

    #[test]
    fn edit_during_frame_extends_it() {
        let (mut f, root) = Fixture::new().with_root();
        f.pipeline.client_mut().on_update = Some(Box::new(move |host: &mut PipelineHost| {
            host.mutate_layers(|tree| tree.set_opacity(root, 0.25));
        }));
        f.pipeline.set_needs_animate();
        let _ = f.take_log();

        f.pipeline.begin_main_frame();
        let log = f.take_log();
        assert!(log.contains(&Call::ProcessUpdate(1)), "ceiling raised to commit");
        assert!(
            !log.contains(&Call::ScheduleMainFrame),
            "no second frame needed"
        );
        assert!(!f.pipeline.begin_main_frame_requested());
    }

    #[test]
    fn same_stage_request_during_frame_schedules_next_frame() {
        let mut f = Fixture::new();
        f.pipeline.client_mut().on_update = Some(Box::new(PipelineHost::set_needs_animate));
        f.pipeline.set_needs_animate();
        let _ = f.take_log();

        f.pipeline.begin_main_frame();
        assert_eq!(f.schedule_count(), 1, "scheduled again right away");
        assert!(f.pipeline.begin_main_frame_requested());
        assert!(!f.pipeline.commit_requested());
    }

    #[test]
    fn deferred_frame_returns_early_and_resumes() {
        let mut f = Fixture::new();
        f.pipeline.set_needs_commit();
        f.pipeline.set_defer_commits(true);
        let _ = f.take_log();

        f.pipeline.begin_main_frame();
        assert!(f.take_log().is_empty(), "no stage ran");
        assert!(f.pipeline.begin_main_frame_requested(), "request kept");

        f.pipeline.set_needs_commit();
        assert_eq!(f.schedule_count(), 0, "deferred");

        f.pipeline.set_defer_commits(false);
        assert_eq!(f.schedule_count(), 1);
        f.pipeline.begin_main_frame();
        assert!(f.take_log().contains(&Call::ProcessUpdate(0)));
    }

    #[test]
    fn frame_numbers_and_notifications_accumulate() {
        let mut f = Fixture::new();
        for _ in 0..3 {
            f.pipeline.set_needs_commit();
            f.pipeline.begin_main_frame();
            f.clock.advance(Duration::from_millis(16));
        }
        assert_eq!(f.pipeline.source_frame_number(), 3);
        assert_eq!(f.pipeline.run_pending_tasks(), 3);
        assert_eq!(f.pipeline.run_pending_tasks(), 0);
    }

    #[test]
    fn visibility_is_local_state() {
        let mut f = Fixture::new();
        assert!(!f.pipeline.is_visible());
        f.pipeline.set_visible(true);
        assert!(f.pipeline.is_visible());
        assert!(f.take_log().is_empty(), "nothing scheduled or sent");
    }

    #[test]
    fn unsupported_requests_are_ignored() {
        let mut f = Fixture::new();
        f.pipeline.set_needs_redraw_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        f.pipeline.notify_input_throttled_until_commit();
        f.pipeline.did_stop_flinging();
        f.pipeline.set_next_commit_waits_for_activation();
        f.pipeline.set_needs_recalculate_raster_scales();
        assert!(!f.pipeline.begin_main_frame_requested());
        assert!(f.take_log().is_empty());
    }

    #[test]
    #[should_panic(expected = "begin_main_frame without a scheduled main frame")]
    fn unscheduled_main_frame_panics() {
        Fixture::new().pipeline.begin_main_frame();
    }
}
