// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two parties a pipeline talks to.

use super::host::PipelineHost;
use crate::begin_frame::BeginFrameArgs;
use crate::commit::CommitPayload;

/// The embedder that owns the layer content.
///
/// Every method defaults to doing nothing. Only the two stage hooks receive
/// the [`PipelineHost`]; edits made through it during a main frame extend
/// that frame when they ask for a later stage.
///
/// The notifications get no host. A client that paces itself on them, for
/// example requesting the next frame once the previous one is drawn, records
/// that in its own state and lets the owner make the request through
/// [`RemoteFramePipeline::with_host`] after
/// [`run_pending_tasks`][RemoteFramePipeline::run_pending_tasks] returns.
///
/// [`RemoteFramePipeline::with_host`]: super::RemoteFramePipeline::with_host
/// [RemoteFramePipeline::run_pending_tasks]: super::RemoteFramePipeline::run_pending_tasks
pub trait PipelineClient {
    /// A main frame is about to start.
    fn will_begin_main_frame(&mut self) {}

    /// Animate stage: advance animations to `args.frame_time`.
    fn begin_main_frame(&mut self, host: &mut PipelineHost, args: &BeginFrameArgs) {
        _ = (host, args);
    }

    /// Animate stage, after [`begin_main_frame`](Self::begin_main_frame):
    /// bring the layer tree up to date.
    fn update_layer_tree_host(&mut self, host: &mut PipelineHost) {
        _ = host;
    }

    /// The commit stage is starting.
    fn will_commit(&mut self) {}

    /// The main frame finished, whether or not anything was sent.
    fn did_commit(&mut self) {}

    /// Sent after [`did_commit`](Self::did_commit).
    fn did_begin_main_frame(&mut self) {}

    /// Deferred: a sent commit counts as drawn.
    fn did_commit_and_draw_frame(&mut self) {}

    /// Deferred: a sent commit counts as swapped.
    fn did_complete_swap_buffers(&mut self) {}
}

/// The transport to the remote compositor.
pub trait RemoteCompositorBridge {
    /// Asks for [`RemoteFramePipeline::begin_main_frame`] to be called
    /// later. Never called again until that happens.
    ///
    /// [`RemoteFramePipeline::begin_main_frame`]: super::RemoteFramePipeline::begin_main_frame
    fn schedule_main_frame(&mut self);

    /// Takes ownership of a commit.
    ///
    /// The bridge must eventually resolve every swap promise in the
    /// payload.
    fn process_compositor_state_update(&mut self, payload: CommitPayload);
}
