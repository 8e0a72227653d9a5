// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline identity.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Identifies one [`RemoteFramePipeline`](super::RemoteFramePipeline) in
/// commit messages and traces.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(u32);

impl PipelineId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineId({})", self.0)
    }
}

/// Hands out unique [`PipelineId`]s, starting at 1.
///
/// Whoever constructs pipelines owns one allocator and shares it; ids are
/// unique per allocator, not per process.
#[derive(Debug)]
pub struct PipelineIdAllocator {
    next: AtomicU32,
}

impl PipelineIdAllocator {
    /// Creates an allocator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Returns a fresh id.
    pub fn allocate(&self) -> PipelineId {
        PipelineId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PipelineIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let ids = PipelineIdAllocator::new();
        assert_eq!(ids.allocate(), PipelineId::new(1));
        assert_eq!(ids.allocate().get(), 2);
    }

    #[test]
    fn allocators_are_independent() {
        let a = PipelineIdAllocator::new();
        let b = PipelineIdAllocator::default();
        let _ = a.allocate();
        assert_eq!(b.allocate(), PipelineId::new(1));
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&PipelineId::new(7)).expect("encodes");
        assert_eq!(json, "7");
    }
}
