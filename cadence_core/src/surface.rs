// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor surface identity.
//!
//! A [`SurfaceId`] names one generation of content produced by one frame
//! sink. Ids are compared and hashed only; the derived `Ord` exists so that
//! they can live in ordered sets.

use core::fmt;

/// Identifies a frame sink (one producer of compositor frames).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameSinkId {
    /// Client that owns the sink.
    pub client_id: u32,
    /// Sink within that client.
    pub sink_id: u32,
}

impl FrameSinkId {
    /// Creates a frame sink id.
    #[inline]
    #[must_use]
    pub const fn new(client_id: u32, sink_id: u32) -> Self {
        Self { client_id, sink_id }
    }
}

impl fmt::Debug for FrameSinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameSinkId({}, {})", self.client_id, self.sink_id)
    }
}

/// Identifies one generation of a sink's surface.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LocalFrameId {
    /// Sequence number within the sink.
    pub local_id: u32,
    /// Random disambiguator.
    pub nonce: u64,
}

impl LocalFrameId {
    /// Creates a local frame id.
    #[inline]
    #[must_use]
    pub const fn new(local_id: u32, nonce: u64) -> Self {
        Self { local_id, nonce }
    }
}

impl fmt::Debug for LocalFrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalFrameId({}, {:#x})", self.local_id, self.nonce)
    }
}

/// A fully-qualified surface identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SurfaceId {
    /// The producing sink.
    pub frame_sink_id: FrameSinkId,
    /// The surface generation within that sink.
    pub local_frame_id: LocalFrameId,
}

impl SurfaceId {
    /// Creates a surface id.
    #[inline]
    #[must_use]
    pub const fn new(frame_sink_id: FrameSinkId, local_frame_id: LocalFrameId) -> Self {
        Self {
            frame_sink_id,
            local_frame_id,
        }
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SurfaceId({}:{}/{}:{:#x})",
            self.frame_sink_id.client_id,
            self.frame_sink_id.sink_id,
            self.local_frame_id.local_id,
            self.local_frame_id.nonce
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_compare_by_all_fields() {
        let sink = FrameSinkId::new(3, 0);
        let a = SurfaceId::new(sink, LocalFrameId::new(1, 7));
        let b = SurfaceId::new(sink, LocalFrameId::new(1, 8));
        assert_ne!(a, b, "nonce participates in identity");
        let set: HashSet<_> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
