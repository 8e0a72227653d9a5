// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame scheduling for a display compositor and a main-frame pipeline for
//! producers that composite remotely.
//!
//! `cadence_core` holds two single-threaded state machines and the types
//! they share. Neither owns a thread or a timer; both are driven by their
//! owner and report what they want through traits.
//!
//! # Architecture
//!
//! ```text
//!   BeginFrameSource ──► DisplayScheduler::on_begin_frame()
//!                               │  surface_damaged(), did_swap_buffers(), ...
//!                               ▼
//!                        scheduled_deadline ──► poll(now) ──► client.draw_and_swap()
//!
//!   set_needs_*() / mutate_layers() ──► bridge.schedule_main_frame()
//!                                               │
//!   RemoteFramePipeline::begin_main_frame() ◄───┘
//!        Animate ──► UpdateLayers ──► Commit ──► bridge.process_compositor_state_update()
//! ```
//!
//! **[`display_scheduler`]**: decides, per begin-frame tick, the latest safe
//! instant to draw and swap, honoring swap throttling, resource locks,
//! resizes, visibility, and output-surface loss. Surface bookkeeping lives
//! in [`damage`].
//!
//! **[`pipeline`]**: coalesces main-frame requests into one animate,
//! update-layers, commit cycle and hands the committed tree delta to a
//! remote compositor bridge.
//!
//! **[`layer`]**: struct-of-arrays layer tree with generational handles.
//! Only inputs are stored; mutations mark channels in [`dirty`].
//!
//! **[`commit`]**: the serde commit message and its JSON codec.
//!
//! **[`swap_promise`]**: callbacks tied to whether a frame is swapped.
//!
//! **[`time`]**, **[`clock`]**, **[`begin_frame`]**, **[`surface`]**,
//! **[`task_queue`]**: shared supporting types.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! both state machines, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod begin_frame;
pub mod clock;
pub mod commit;
pub mod damage;
pub mod dirty;
pub mod display_scheduler;
pub mod layer;
pub mod pipeline;
pub mod surface;
pub mod swap_promise;
pub mod task_queue;
pub mod time;
pub mod trace;
