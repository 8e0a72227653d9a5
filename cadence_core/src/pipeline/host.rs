// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The client-facing half of a pipeline.

use super::id::PipelineId;
use super::stage::{PipelineStage, Request, StageTracker};
use crate::layer::LayerTree;
use crate::swap_promise::{SwapPromise, SwapPromiseManager};

/// State a [`PipelineClient`](super::PipelineClient) may touch, including
/// from inside a main frame.
///
/// Owned by a [`RemoteFramePipeline`](super::RemoteFramePipeline). Stage
/// requests made here are picked up by the pipeline when control returns to
/// it; the pipeline asks its bridge for a main frame at that point.
#[derive(Debug)]
pub struct PipelineHost {
    pub(crate) id: PipelineId,
    pub(crate) tree: LayerTree,
    pub(crate) stages: StageTracker,
    pub(crate) swap_promises: SwapPromiseManager,
    pub(crate) visible: bool,
    pub(crate) source_frame_number: u64,
}

impl PipelineHost {
    pub(crate) fn new(id: PipelineId) -> Self {
        Self {
            id,
            tree: LayerTree::new(),
            stages: StageTracker::default(),
            swap_promises: SwapPromiseManager::new(),
            visible: false,
            source_frame_number: 0,
        }
    }

    /// Returns the pipeline's id.
    #[must_use]
    pub fn id(&self) -> PipelineId {
        self.id
    }

    /// Number of main frames completed so far.
    #[must_use]
    pub fn source_frame_number(&self) -> u64 {
        self.source_frame_number
    }

    /// Stage the running main frame is in.
    #[must_use]
    pub fn current_stage(&self) -> PipelineStage {
        self.stages.current_stage
    }

    /// Read access to the layer tree.
    #[must_use]
    pub fn layer_tree(&self) -> &LayerTree {
        &self.tree
    }

    /// Edits the layer tree and turns the edits into stage requests.
    ///
    /// Property, setting and link changes request a commit. Content
    /// invalidations request a layer update, which in turn commits if it
    /// repaints anything.
    pub fn mutate_layers<R>(&mut self, f: impl FnOnce(&mut LayerTree) -> R) -> R {
        let result = f(&mut self.tree);
        let changes = self.tree.take_change_flags();
        if changes.needs_commit {
            self.request_stage(PipelineStage::Commit);
        } else if changes.needs_update_layers {
            self.request_stage(PipelineStage::UpdateLayers);
        }
        result
    }

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

    /// Requests a main frame that runs through `stage`.
    ///
    /// Swap promise monitors are notified first. During a main frame, a
    /// stage later than the current one extends that frame; anything else
    /// is left for the next frame.
    ///
    /// # Panics
    ///
    /// Panics if `stage` is [`PipelineStage::None`].
    pub fn request_stage(&mut self, stage: PipelineStage) {
        self.swap_promises.notify_monitors_of_set_needs_commit();
        match self.stages.request(stage) {
            Request::RaisedCurrentFrame => {
                log::trace!("pipeline {}: current frame extended to {stage}", self.id.get());
            }
            Request::NextFrame => {
                log::trace!("pipeline {}: {stage} requested for next frame", self.id.get());
            }
        }
    }

    /// Ties `promise` to the next commit.
    pub fn queue_swap_promise(&mut self, promise: Box<dyn SwapPromise>) {
        self.swap_promises.queue_swap_promise(promise);
    }

    /// The swap promise manager, for monitors.
    pub fn swap_promise_manager_mut(&mut self) -> &mut SwapPromiseManager {
        &mut self.swap_promises
    }

    /// Whether the embedder is shown. Kept locally, never sent.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Records visibility.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use kurbo::Affine;

    use super::*;
    use crate::swap_promise::SwapPromiseMonitor;

    struct CountingMonitor(Rc<Cell<u32>>);

    impl SwapPromiseMonitor for CountingMonitor {
        fn on_set_needs_commit_on_main(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn property_edits_request_commit() {
        let mut host = PipelineHost::new(PipelineId::new(1));
        let layer = host.mutate_layers(|tree| {
            let layer = tree.create_layer();
            tree.set_root(Some(layer));
            layer
        });
        assert_eq!(host.stages.requested_stage_for_next_frame, PipelineStage::Commit);

        host.stages = StageTracker::default();
        host.mutate_layers(|tree| tree.set_transform(layer, Affine::scale(2.0)));
        assert_eq!(host.stages.requested_stage_for_next_frame, PipelineStage::Commit);
    }

    #[test]
    fn invalidation_requests_update_layers() {
        let mut host = PipelineHost::new(PipelineId::new(1));
        let layer = host.mutate_layers(LayerTree::create_layer);
        host.stages = StageTracker::default();

        host.mutate_layers(|tree| tree.set_needs_display(layer));
        assert_eq!(
            host.stages.requested_stage_for_next_frame,
            PipelineStage::UpdateLayers
        );
    }

    #[test]
    fn reads_do_not_request_anything() {
        let mut host = PipelineHost::new(PipelineId::new(1));
        let root = host.mutate_layers(|tree| tree.root());
        assert_eq!(root, None);
        assert_eq!(host.stages.requested_stage_for_next_frame, PipelineStage::None);
    }

    #[test]
    fn every_request_notifies_monitors() {
        let notified = Rc::new(Cell::new(0));
        let mut host = PipelineHost::new(PipelineId::new(1));
        let _ = host
            .swap_promise_manager_mut()
            .insert_monitor(Box::new(CountingMonitor(notified.clone())));

        host.set_needs_animate();
        host.set_needs_commit();
        assert_eq!(notified.get(), 2);
    }
}
