// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Main-frame stages and the request bookkeeping around them.

use core::fmt;

/// How far a main frame goes.
///
/// Stages are ordered; requesting a stage implies every earlier one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    /// No main frame.
    #[default]
    None,
    /// Tick animations and let the client update its layer tree.
    Animate,
    /// Repaint invalidated layer content.
    UpdateLayers,
    /// Ship the tree delta to the remote compositor.
    Commit,
}

impl PipelineStage {
    /// Short label for logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Animate => "animate",
            Self::UpdateLayers => "update_layers",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`StageTracker::request`] did with a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Request {
    /// A main frame is running below the requested stage; its ceiling was
    /// raised.
    RaisedCurrentFrame,
    /// Recorded for the next main frame.
    NextFrame,
}

/// Stage state of one pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StageTracker {
    /// Stage the running main frame is in, `None` between frames.
    pub(crate) current_stage: PipelineStage,
    /// How far the running main frame goes.
    pub(crate) max_stage_for_current_frame: PipelineStage,
    /// How far the next main frame must go.
    pub(crate) requested_stage_for_next_frame: PipelineStage,
    /// A `schedule_main_frame` is outstanding with the bridge.
    pub(crate) main_frame_requested_from_bridge: bool,
    pub(crate) defer_commits: bool,
}

impl StageTracker {
    /// Records a request for `stage`.
    ///
    /// # Panics
    ///
    /// Panics if `stage` is [`PipelineStage::None`].
    pub(crate) fn request(&mut self, stage: PipelineStage) -> Request {
        assert_ne!(stage, PipelineStage::None, "cannot request the None stage");

        if self.current_stage != PipelineStage::None && stage > self.current_stage {
            self.max_stage_for_current_frame = self.max_stage_for_current_frame.max(stage);
            return Request::RaisedCurrentFrame;
        }
        self.requested_stage_for_next_frame = self.requested_stage_for_next_frame.max(stage);
        Request::NextFrame
    }

    /// Whether the bridge should be asked for a main frame now.
    #[must_use]
    pub(crate) fn should_schedule(&self) -> bool {
        self.requested_stage_for_next_frame != PipelineStage::None
            && !self.defer_commits
            && !self.main_frame_requested_from_bridge
    }

    /// Starts a main frame: the pending request becomes the ceiling.
    ///
    /// # Panics
    ///
    /// Panics if a main frame is already running or nothing was requested.
    pub(crate) fn start_frame(&mut self) {
        assert_eq!(
            self.current_stage,
            PipelineStage::None,
            "main frame already in progress"
        );
        assert_eq!(
            self.max_stage_for_current_frame,
            PipelineStage::None,
            "stale stage ceiling"
        );
        assert_ne!(
            self.requested_stage_for_next_frame,
            PipelineStage::None,
            "main frame started without a request"
        );
        self.max_stage_for_current_frame = self.requested_stage_for_next_frame;
        self.requested_stage_for_next_frame = PipelineStage::None;
    }

    /// Ends the running main frame.
    pub(crate) fn finish_frame(&mut self) {
        debug_assert_eq!(
            self.current_stage,
            PipelineStage::Commit,
            "main frame finished before the commit stage"
        );
        self.current_stage = PipelineStage::None;
        self.max_stage_for_current_frame = PipelineStage::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(PipelineStage::None < PipelineStage::Animate);
        assert!(PipelineStage::Animate < PipelineStage::UpdateLayers);
        assert!(PipelineStage::UpdateLayers < PipelineStage::Commit);
        assert_eq!(PipelineStage::UpdateLayers.to_string(), "update_layers");
    }

    #[test]
    fn requests_between_frames_coalesce_to_the_highest() {
        let mut stages = StageTracker::default();
        assert_eq!(stages.request(PipelineStage::Commit), Request::NextFrame);
        assert_eq!(stages.request(PipelineStage::Animate), Request::NextFrame);
        assert_eq!(stages.requested_stage_for_next_frame, PipelineStage::Commit);
        assert!(stages.should_schedule());
    }

    #[test]
    fn request_above_current_stage_raises_ceiling() {
        let mut stages = StageTracker::default();
        let _ = stages.request(PipelineStage::Animate);
        stages.start_frame();
        stages.current_stage = PipelineStage::Animate;

        assert_eq!(
            stages.request(PipelineStage::Commit),
            Request::RaisedCurrentFrame
        );
        assert_eq!(stages.max_stage_for_current_frame, PipelineStage::Commit);
        assert_eq!(stages.requested_stage_for_next_frame, PipelineStage::None);
    }

    #[test]
    fn request_at_or_below_current_stage_waits_for_next_frame() {
        let mut stages = StageTracker::default();
        let _ = stages.request(PipelineStage::Commit);
        stages.start_frame();
        stages.current_stage = PipelineStage::Commit;

        assert_eq!(stages.request(PipelineStage::Animate), Request::NextFrame);
        assert_eq!(stages.request(PipelineStage::Commit), Request::NextFrame);
        assert_eq!(stages.requested_stage_for_next_frame, PipelineStage::Commit);
    }

    #[test]
    fn scheduling_is_gated() {
        let mut stages = StageTracker::default();
        assert!(!stages.should_schedule(), "nothing requested");

        let _ = stages.request(PipelineStage::Animate);
        stages.defer_commits = true;
        assert!(!stages.should_schedule(), "deferred");

        stages.defer_commits = false;
        stages.main_frame_requested_from_bridge = true;
        assert!(!stages.should_schedule(), "already outstanding");
    }

    #[test]
    #[should_panic(expected = "cannot request the None stage")]
    fn requesting_none_panics() {
        let _ = StageTracker::default().request(PipelineStage::None);
    }

    #[test]
    #[should_panic(expected = "main frame started without a request")]
    fn starting_without_request_panics() {
        StageTracker::default().start_frame();
    }
}
