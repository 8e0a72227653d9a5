// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-cycle surface damage bookkeeping for the display scheduler.
//!
//! The scheduler wants to draw as soon as every surface it is *waiting for*
//! has delivered new content. Which surfaces to wait for is learned: a child
//! surface becomes expected only after it was damaged in two consecutive
//! drawn cycles. At every successful draw the expected set becomes
//! `damaged_this_cycle ∩ damaged_last_drawn_cycle`, so one-off damage never
//! holds the deadline back.
//!
//! The root surface is tracked separately. Root damage is expected in the
//! next cycle if the root was damaged in the cycle just drawn, and is always
//! expected while a resize is pending.

use std::collections::BTreeSet;

use crate::surface::SurfaceId;

/// Which surfaces have been damaged and which ones the next draw waits for.
#[derive(Clone, Debug)]
pub struct DamageTracker {
    root_surface_id: Option<SurfaceId>,
    child_damaged: BTreeSet<SurfaceId>,
    child_damaged_prev: BTreeSet<SurfaceId>,
    child_expect_damage_from: BTreeSet<SurfaceId>,
    all_active_child_surfaces_ready: bool,
    root_surface_damaged: bool,
    expect_damage_from_root_surface: bool,
    expecting_root_damage_because_of_resize: bool,
}

impl Default for DamageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DamageTracker {
    /// Creates a tracker with no root surface.
    ///
    /// Children start out not ready: until the first draw there is no
    /// evidence about which surfaces are active, so the first deadline is
    /// not pulled in early.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root_surface_id: None,
            child_damaged: BTreeSet::new(),
            child_damaged_prev: BTreeSet::new(),
            child_expect_damage_from: BTreeSet::new(),
            all_active_child_surfaces_ready: false,
            root_surface_damaged: false,
            expect_damage_from_root_surface: false,
            expecting_root_damage_because_of_resize: false,
        }
    }

    /// Returns the current root surface.
    #[must_use]
    pub fn root_surface_id(&self) -> Option<SurfaceId> {
        self.root_surface_id
    }

    /// Replaces the root surface id and forgets the child damage history.
    ///
    /// Surfaces are learned again from scratch under the new root. Does not
    /// mark the new root damaged.
    pub fn set_root_surface_id(&mut self, id: SurfaceId) {
        self.root_surface_id = Some(id);
        self.root_surface_damaged = false;
        self.child_damaged.clear();
        self.child_damaged_prev.clear();
        self.child_expect_damage_from.clear();
        self.all_active_child_surfaces_ready = true;
    }

    /// Records damage on `id`.
    ///
    /// Root damage satisfies any pending resize. Child damage joins this
    /// cycle's set, and readiness is recomputed as
    /// `damaged ⊇ expected`. Ids the tracker has never seen are fine.
    pub fn surface_damaged(&mut self, id: SurfaceId) {
        if self.root_surface_id == Some(id) {
            self.root_surface_damaged = true;
            self.expecting_root_damage_because_of_resize = false;
        } else {
            self.child_damaged.insert(id);
            self.all_active_child_surfaces_ready = self
                .child_expect_damage_from
                .is_subset(&self.child_damaged);
        }
    }

    /// Records that the display was resized: a new root frame is required.
    pub fn display_resized(&mut self) {
        self.expecting_root_damage_because_of_resize = true;
        self.expect_damage_from_root_surface = true;
    }

    /// Rolls the sets over after a successful draw.
    pub fn did_draw(&mut self) {
        self.child_expect_damage_from = self
            .child_damaged
            .intersection(&self.child_damaged_prev)
            .copied()
            .collect();
        core::mem::swap(&mut self.child_damaged, &mut self.child_damaged_prev);
        self.child_damaged.clear();
        self.all_active_child_surfaces_ready = self.child_expect_damage_from.is_empty();

        self.expect_damage_from_root_surface = self.root_surface_damaged;
        self.root_surface_damaged = false;
    }

    /// Forgets all learned expectations. Called when the scheduler goes idle.
    pub fn reset_for_idle(&mut self) {
        self.child_damaged.clear();
        self.child_damaged_prev.clear();
        self.child_expect_damage_from.clear();
        self.all_active_child_surfaces_ready = true;
        self.expect_damage_from_root_surface = false;
    }

    /// Whether every expected child surface has been damaged this cycle.
    #[must_use]
    pub fn all_active_child_surfaces_ready(&self) -> bool {
        self.all_active_child_surfaces_ready
    }

    /// Whether the root surface was damaged this cycle.
    #[must_use]
    pub fn root_surface_damaged(&self) -> bool {
        self.root_surface_damaged
    }

    /// Whether root damage is expected this cycle.
    #[must_use]
    pub fn expect_damage_from_root_surface(&self) -> bool {
        self.expect_damage_from_root_surface
    }

    /// Whether a resize is waiting for a root frame.
    #[must_use]
    pub fn expecting_root_damage_because_of_resize(&self) -> bool {
        self.expecting_root_damage_because_of_resize
    }

    /// Whether the root is not holding the draw back.
    #[must_use]
    pub fn root_ready(&self) -> bool {
        !self.expect_damage_from_root_surface || self.root_surface_damaged
    }

    /// Child surfaces the next draw waits for.
    pub fn expected_children(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.child_expect_damage_from.iter().copied()
    }
}
