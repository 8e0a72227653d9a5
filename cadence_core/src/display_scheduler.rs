// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Begin-frame-driven draw scheduling for a display compositor.
//!
//! [`DisplayScheduler`] subscribes to a [`BeginFrameSource`] while there is
//! something to draw. For every tick it decides the latest safe instant to
//! draw-and-swap (the *deadline*) and calls
//! [`DisplaySchedulerClient::draw_and_swap`] when that deadline fires.
//!
//! # Deadline policy
//!
//! Within a begin-frame interval the deadline is re-evaluated after every
//! event that could change it. In order of precedence:
//!
//! | Condition | Deadline |
//! |---|---|
//! | output surface lost | immediately |
//! | too many swaps in flight | late (next frame time) |
//! | nothing damaged | late |
//! | root surface resources locked | late |
//! | every expected surface damaged | immediately |
//! | resize pending without a root frame | late |
//! | children ready, root frame expected | tick deadline minus the parent draw estimate |
//! | otherwise | tick deadline |
//!
//! Tick deadlines have the estimated parent draw time subtracted on arrival,
//! so the "waiting for the root" case backs off twice.
//!
//! # Driving
//!
//! The scheduler never blocks and owns no timer. The deadline is an armed
//! instant ([`scheduled_deadline`](DisplayScheduler::scheduled_deadline));
//! the driver calls [`poll`](DisplayScheduler::poll) with the current time,
//! or [`on_begin_frame_deadline`](DisplayScheduler::on_begin_frame_deadline)
//! directly, to fire it.

use core::fmt;

use crate::begin_frame::{
    BeginFrameArgs, BeginFrameArgsKind, BeginFrameSource, DEFAULT_ESTIMATED_PARENT_DRAW_TIME,
    DEFAULT_INTERVAL,
};
use crate::damage::DamageTracker;
use crate::surface::SurfaceId;
use crate::time::{Duration, HostTime};
use crate::trace::{
    BeginFrameEvent, DeadlineEvent, DrawAndSwapEvent, DrawOutcome, PendingSwapsEvent, TraceSink,
    Tracer,
};

/// The display-side component that actually draws.
pub trait DisplaySchedulerClient {
    /// Draws and swaps a frame. Returns whether it succeeded.
    ///
    /// On failure the damage from this cycle is kept, so the next deadline
    /// tries again with the same expectations.
    fn draw_and_swap(&mut self) -> bool;
}

/// Static parameters for a [`DisplayScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySchedulerConfig {
    /// Swaps allowed in flight before drawing is throttled. At least 1.
    pub max_pending_swaps: u32,
    /// Back-off subtracted from tick deadlines to leave the parent
    /// compositor time to draw.
    pub estimated_parent_draw_time: Duration,
}

impl DisplaySchedulerConfig {
    /// One swap in flight, one third of a 60 Hz interval for the parent.
    pub const DEFAULT: Self = Self {
        max_pending_swaps: 1,
        estimated_parent_draw_time: DEFAULT_ESTIMATED_PARENT_DRAW_TIME,
    };

    /// Returns a copy with a different swap throttle.
    #[must_use]
    pub const fn with_max_pending_swaps(mut self, max_pending_swaps: u32) -> Self {
        self.max_pending_swaps = max_pending_swaps;
        self
    }

    /// Returns a copy with a different parent draw estimate.
    #[must_use]
    pub const fn with_estimated_parent_draw_time(mut self, duration: Duration) -> Self {
        self.estimated_parent_draw_time = duration;
        self
    }
}

impl Default for DisplaySchedulerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Why the scheduler picked its current deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeadlineReason {
    /// The output surface is gone; flush out immediately.
    OutputSurfaceLost,
    /// Too many swaps in flight.
    SwapThrottled,
    /// Nothing has been damaged yet.
    NoDamage,
    /// The root surface's resources are locked.
    RootResourcesLocked,
    /// Every surface the scheduler waits for has been damaged.
    AllSurfacesReady,
    /// A resize is waiting for a new root frame.
    ResizePending,
    /// Children are ready; a root frame is expected shortly.
    WaitingForRootDamage,
    /// More damage is expected before the tick deadline.
    Regular,
}

impl DeadlineReason {
    /// Short label for logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutputSurfaceLost => "output_surface_lost",
            Self::SwapThrottled => "swap_throttled",
            Self::NoDamage => "no_damage",
            Self::RootResourcesLocked => "root_resources_locked",
            Self::AllSurfacesReady => "all_surfaces_ready",
            Self::ResizePending => "resize_pending",
            Self::WaitingForRootDamage => "waiting_for_root_damage",
            Self::Regular => "regular",
        }
    }
}

/// Placeholder args before the first tick arrives.
const NO_ARGS: BeginFrameArgs = BeginFrameArgs::new(
    HostTime::ZERO,
    HostTime::ZERO,
    DEFAULT_INTERVAL,
    BeginFrameArgsKind::Normal,
);

/// Schedules draw-and-swap for one display.
///
/// Owns its begin-frame source `S` and client `C`; both stay reachable
/// through accessors.
pub struct DisplayScheduler<S, C> {
    config: DisplaySchedulerConfig,
    source: S,
    client: C,
    damage: DamageTracker,

    visible: bool,
    output_surface_lost: bool,
    root_surface_resources_locked: bool,
    needs_draw: bool,
    pending_swaps: u32,

    observing_begin_frame_source: bool,
    inside_begin_frame_deadline_interval: bool,
    current_begin_frame_args: BeginFrameArgs,
    last_used_begin_frame_args: Option<BeginFrameArgs>,
    scheduled_deadline: Option<HostTime>,
    deadline_schedule_count: u64,

    tracer: Tracer,
}

impl<S, C> fmt::Debug for DisplayScheduler<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayScheduler")
            .field("config", &self.config)
            .field("damage", &self.damage)
            .field("visible", &self.visible)
            .field("output_surface_lost", &self.output_surface_lost)
            .field(
                "root_surface_resources_locked",
                &self.root_surface_resources_locked,
            )
            .field("needs_draw", &self.needs_draw)
            .field("pending_swaps", &self.pending_swaps)
            .field("observing", &self.observing_begin_frame_source)
            .field("inside_interval", &self.inside_begin_frame_deadline_interval)
            .field("current_begin_frame_args", &self.current_begin_frame_args)
            .field("scheduled_deadline", &self.scheduled_deadline)
            .field("deadline_schedule_count", &self.deadline_schedule_count)
            .finish_non_exhaustive()
    }
}

impl<S: BeginFrameSource, C: DisplaySchedulerClient> DisplayScheduler<S, C> {
    /// Creates a scheduler.
    ///
    /// It starts invisible, not observing, and with root surface resources
    /// **locked**; the owner unlocks them once the root surface is usable.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_pending_swaps` is zero.
    #[must_use]
    pub fn new(config: DisplaySchedulerConfig, source: S, client: C) -> Self {
        assert!(
            config.max_pending_swaps >= 1,
            "max_pending_swaps must be at least 1"
        );
        Self {
            config,
            source,
            client,
            damage: DamageTracker::new(),
            visible: false,
            output_surface_lost: false,
            root_surface_resources_locked: true,
            needs_draw: false,
            pending_swaps: 0,
            observing_begin_frame_source: false,
            inside_begin_frame_deadline_interval: false,
            current_begin_frame_args: NO_ARGS,
            last_used_begin_frame_args: None,
            scheduled_deadline: None,
            deadline_schedule_count: 0,
            tracer: Tracer::none(),
        }
    }

    /// Routes trace events to `sink`.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    // -- Events --

    /// Shows or hides the display.
    ///
    /// Becoming visible with pending damage subscribes to begin frames.
    /// Becoming invisible does not unsubscribe right away; that happens when
    /// the in-flight deadline finds nothing it may draw.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        self.start_observing_begin_frames();
        self.schedule_begin_frame_deadline();
    }

    /// Locks or unlocks the root surface's resources. Draws are suppressed
    /// while locked.
    pub fn set_root_surface_resources_locked(&mut self, locked: bool) {
        self.root_surface_resources_locked = locked;
        self.schedule_begin_frame_deadline();
    }

    /// Draws right now if allowed, without waiting for the deadline.
    ///
    /// If this happens inside a begin-frame interval, the interval ends and
    /// the source is told the frame is finished. Returns whether a frame
    /// was swapped.
    pub fn force_immediate_swap_if_possible(&mut self) -> bool {
        let in_begin = self.inside_begin_frame_deadline_interval;
        let swapped = self.attempt_draw_and_swap();
        if in_begin {
            self.source.did_finish_frame();
        }
        swapped
    }

    /// Records a display resize. The deadline stays late until a new root
    /// frame arrives.
    pub fn display_resized(&mut self) {
        self.damage.display_resized();
        self.needs_draw = true;
        self.schedule_begin_frame_deadline();
    }

    /// Replaces the root surface and treats it as damaged.
    ///
    /// Child damage history is discarded, so no child surface is waited for
    /// until it is learned again under the new root.
    pub fn set_new_root_surface(&mut self, id: SurfaceId) {
        self.damage.set_root_surface_id(id);
        self.surface_damaged(id);
    }

    /// Records new content on `id`.
    ///
    /// Ids that are neither the root nor previously seen are tracked as new
    /// children.
    pub fn surface_damaged(&mut self, id: SurfaceId) {
        self.needs_draw = true;
        self.damage.surface_damaged(id);
        self.start_observing_begin_frames();
        self.schedule_begin_frame_deadline();
    }

    /// Records that the output surface is gone. No further draws happen.
    pub fn output_surface_lost(&mut self) {
        self.output_surface_lost = true;
        self.schedule_begin_frame_deadline();
    }

    /// Records a swap handed to the display.
    pub fn did_swap_buffers(&mut self) {
        self.pending_swaps += 1;
        self.trace_pending_swaps();
    }

    /// Records that a swap was acknowledged.
    pub fn did_swap_buffers_complete(&mut self) {
        if self.pending_swaps == 0 {
            log::warn!("swap acknowledged with no swap in flight");
        } else {
            self.pending_swaps -= 1;
        }
        self.trace_pending_swaps();
        self.schedule_begin_frame_deadline();
    }

    /// Delivers a begin-frame tick.
    ///
    /// Ignored unless the scheduler is subscribed; returns whether it was
    /// accepted. If the previous interval's deadline has not fired yet, it
    /// fires first.
    pub fn on_begin_frame(&mut self, args: BeginFrameArgs) -> bool {
        if !self.observing_begin_frame_source {
            return false;
        }
        if self.inside_begin_frame_deadline_interval {
            self.on_begin_frame_deadline();
        }

        self.last_used_begin_frame_args = Some(args);
        self.current_begin_frame_args =
            args.with_deadline_earlier_by(self.config.estimated_parent_draw_time);
        self.inside_begin_frame_deadline_interval = true;
        self.tracer.begin_frame(&BeginFrameEvent {
            args,
            adjusted_deadline: self.current_begin_frame_args.deadline,
        });

        self.schedule_begin_frame_deadline();
        true
    }

    /// The deadline timer callback: attempts the draw and finishes the frame.
    pub fn on_begin_frame_deadline(&mut self) {
        self.attempt_draw_and_swap();
        self.source.did_finish_frame();
    }

    /// Fires the deadline if one is armed and `now` has reached it. Returns
    /// whether it fired.
    pub fn poll(&mut self, now: HostTime) -> bool {
        match self.scheduled_deadline {
            Some(deadline) if now >= deadline => {
                self.on_begin_frame_deadline();
                true
            }
            _ => false,
        }
    }

    // -- Queries --

    /// The deadline the scheduler would arm right now.
    #[must_use]
    pub fn desired_begin_frame_deadline_time(&self) -> HostTime {
        self.desired_deadline().0
    }

    /// Why the scheduler would pick
    /// [`desired_begin_frame_deadline_time`](Self::desired_begin_frame_deadline_time).
    #[must_use]
    pub fn desired_deadline_reason(&self) -> DeadlineReason {
        self.desired_deadline().1
    }

    /// The armed deadline, if inside a begin-frame interval.
    #[must_use]
    pub fn scheduled_deadline(&self) -> Option<HostTime> {
        self.scheduled_deadline
    }

    /// The most recent accepted tick, as delivered.
    #[must_use]
    pub fn last_used_begin_frame_args(&self) -> Option<BeginFrameArgs> {
        self.last_used_begin_frame_args
    }

    /// Swaps in flight.
    #[must_use]
    pub fn pending_swaps(&self) -> u32 {
        self.pending_swaps
    }

    /// Whether the display is visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the scheduler is subscribed to its begin-frame source.
    #[must_use]
    pub fn is_observing_begin_frames(&self) -> bool {
        self.observing_begin_frame_source
    }

    /// Whether the output surface was lost.
    #[must_use]
    pub fn is_output_surface_lost(&self) -> bool {
        self.output_surface_lost
    }

    /// Whether a draw is pending.
    #[must_use]
    pub fn needs_draw(&self) -> bool {
        self.needs_draw
    }

    /// How many times the deadline has been re-evaluated.
    #[must_use]
    pub fn deadline_schedule_count(&self) -> u64 {
        self.deadline_schedule_count
    }

    /// The damage bookkeeping.
    #[must_use]
    pub fn damage(&self) -> &DamageTracker {
        &self.damage
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &DisplaySchedulerConfig {
        &self.config
    }

    /// The begin-frame source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The begin-frame source, mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The client, mutably.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    // -- Internals --

    fn should_draw(&self) -> bool {
        self.needs_draw && !self.output_surface_lost && self.visible
    }

    fn start_observing_begin_frames(&mut self) {
        if !self.observing_begin_frame_source && self.should_draw() {
            self.source.add_observer();
            self.observing_begin_frame_source = true;
        }
    }

    fn stop_observing_begin_frames(&mut self) {
        if self.observing_begin_frame_source {
            self.source.remove_observer();
            self.observing_begin_frame_source = false;
        }
    }

    fn desired_deadline(&self) -> (HostTime, DeadlineReason) {
        let args = &self.current_begin_frame_args;
        let late = args.next_frame_time();

        if self.output_surface_lost {
            return (HostTime::ZERO, DeadlineReason::OutputSurfaceLost);
        }
        if self.pending_swaps >= self.config.max_pending_swaps {
            return (late, DeadlineReason::SwapThrottled);
        }
        if !self.needs_draw {
            return (late, DeadlineReason::NoDamage);
        }
        if self.root_surface_resources_locked {
            return (late, DeadlineReason::RootResourcesLocked);
        }

        let children_ready = self.damage.all_active_child_surfaces_ready();
        if children_ready && self.damage.root_ready() {
            return (HostTime::ZERO, DeadlineReason::AllSurfacesReady);
        }
        if self.damage.expecting_root_damage_because_of_resize() {
            return (late, DeadlineReason::ResizePending);
        }
        if children_ready && self.damage.expect_damage_from_root_surface() {
            return (
                args.deadline - self.config.estimated_parent_draw_time,
                DeadlineReason::WaitingForRootDamage,
            );
        }
        (args.deadline, DeadlineReason::Regular)
    }

    fn schedule_begin_frame_deadline(&mut self) {
        self.deadline_schedule_count += 1;

        if !self.inside_begin_frame_deadline_interval {
            debug_assert!(
                self.scheduled_deadline.is_none(),
                "deadline armed outside a begin-frame interval"
            );
            return;
        }

        let (deadline, reason) = self.desired_deadline();
        if self.scheduled_deadline == Some(deadline) {
            return;
        }
        self.scheduled_deadline = Some(deadline);
        self.tracer.deadline(&DeadlineEvent {
            frame_time: self.current_begin_frame_args.frame_time,
            deadline,
            reason,
        });
    }

    fn attempt_draw_and_swap(&mut self) -> bool {
        self.inside_begin_frame_deadline_interval = false;
        self.scheduled_deadline = None;

        let outcome = if self.should_draw() {
            if self.pending_swaps >= self.config.max_pending_swaps {
                DrawOutcome::SwapThrottled
            } else if self.root_surface_resources_locked {
                DrawOutcome::ResourcesLocked
            } else {
                self.draw_and_swap()
            }
        } else {
            // Going idle.
            self.damage.reset_for_idle();
            self.stop_observing_begin_frames();
            DrawOutcome::Idle
        };

        self.tracer.draw_and_swap(&DrawAndSwapEvent {
            frame_time: self.current_begin_frame_args.frame_time,
            outcome,
        });
        outcome == DrawOutcome::Swapped
    }

    fn draw_and_swap(&mut self) -> DrawOutcome {
        if !self.client.draw_and_swap() {
            log::debug!("draw_and_swap failed; keeping damage for the next deadline");
            return DrawOutcome::Failed;
        }
        self.damage.did_draw();
        self.needs_draw = false;
        DrawOutcome::Swapped
    }

    fn trace_pending_swaps(&mut self) {
        self.tracer.pending_swaps(&PendingSwapsEvent {
            frame_time: self.current_begin_frame_args.frame_time,
            pending_swaps: self.pending_swaps,
            max_pending_swaps: self.config.max_pending_swaps,
        });
    }
}
