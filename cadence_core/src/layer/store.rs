// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and property management.

use kurbo::{Affine, Size};
use understory_dirty::{CycleHandling, DirtyTracker};

use super::clip::ClipShape;
use super::id::{ContentId, INVALID, LayerId};
use super::traverse::Children;
use crate::dirty;

/// Per-layer boolean flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Whether the layer (and its subtree) is hidden.
    pub hidden: bool,
}

/// What a batch of edits asks of the main-frame pipeline.
///
/// Returned (and reset) by [`LayerTree::take_change_flags`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeChangeFlags {
    /// A property, setting, or link changed; a commit is needed.
    pub needs_commit: bool,
    /// Content was invalidated; layers must be updated before committing.
    pub needs_update_layers: bool,
}

impl TreeChangeFlags {
    /// Whether nothing was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.needs_commit && !self.needs_update_layers
    }
}

/// Struct-of-arrays storage for a layer tree.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer
/// occupies a slot in parallel arrays. Destroyed layers are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// Only the subtree under [`root`](Self::root) is *attached*: it is what
/// [`update_layers`](Self::update_layers) walks and what a commit describes.
#[derive(Debug)]
pub struct LayerTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Inputs (set by callers) --
    pub(crate) transform: Vec<Affine>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) bounds: Vec<Size>,
    pub(crate) clip: Vec<Option<ClipShape>>,
    pub(crate) content: Vec<Option<ContentId>>,
    pub(crate) flags: Vec<LayerFlags>,

    // -- Content updates (written by update_layers) --
    pub(crate) content_version: Vec<u64>,
    pub(crate) last_update_frame: Vec<Option<u64>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) content_updated: Vec<u32>,
    pub(crate) change_flags: TreeChangeFlags,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) attached: Vec<bool>,
    pub(crate) traversal_dirty: bool,

    // -- Tree settings --
    pub(crate) root: Option<LayerId>,
    pub(crate) viewport_size: Size,
    pub(crate) device_scale_factor: f64,
    pub(crate) background_color: [f32; 4],
    pub(crate) settings_changed: bool,
    pub(crate) hierarchy_changed: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_removed: Vec<LayerId>,
}

impl Default for LayerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerTree {
    /// Creates an empty tree with no root, a zero viewport, a device scale
    /// factor of 1 and an opaque white background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            transform: Vec::new(),
            opacity: Vec::new(),
            bounds: Vec::new(),
            clip: Vec::new(),
            content: Vec::new(),
            flags: Vec::new(),
            content_version: Vec::new(),
            last_update_frame: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            content_updated: Vec::new(),
            change_flags: TreeChangeFlags::default(),
            traversal_order: Vec::new(),
            attached: Vec::new(),
            traversal_dirty: true,
            root: None,
            viewport_size: Size::ZERO,
            device_scale_factor: 1.0,
            background_color: [1.0, 1.0, 1.0, 1.0],
            settings_changed: false,
            hierarchy_changed: false,
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new layer and returns its handle.
    ///
    /// The layer starts with an identity transform, full opacity, zero
    /// bounds, no clip, no content, and no parent.
    pub fn create_layer(&mut self) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.transform[i] = Affine::IDENTITY;
            self.opacity[i] = 1.0;
            self.bounds[i] = Size::ZERO;
            self.clip[i] = None;
            self.content[i] = None;
            self.flags[i] = LayerFlags::default();
            self.content_version[i] = 0;
            self.last_update_frame[i] = None;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.transform.push(Affine::IDENTITY);
            self.opacity.push(1.0);
            self.bounds.push(Size::ZERO);
            self.clip.push(None);
            self.content.push(None);
            self.flags.push(LayerFlags::default());
            self.content_version.push(0);
            self.last_update_frame.push(None);
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.change_flags.needs_commit = true;

        self.id_at(idx)
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// If the layer was the root, the tree is left without a root.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }
        if self.root == Some(id) {
            self.root = None;
            self.hierarchy_changed = true;
        }

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(id);
        self.change_flags.needs_commit = true;
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        self.link_last_child(parent.idx, child.idx);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove_from_parent(&mut self, child: LayerId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "layer has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.mark_topology(p, c);
    }

    /// Moves `child` to be the last child of `new_parent`, detaching it from
    /// its current parent first if it has one.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, child: LayerId, new_parent: LayerId) {
        self.validate(child);
        self.validate(new_parent);

        let old_p = self.parent[child.idx as usize];
        if old_p != INVALID {
            self.unlink_from_parent(child.idx);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }
        self.link_last_child(new_parent.idx, child.idx);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or
    /// `sibling` has no parent.
    pub fn insert_before(&mut self, child: LayerId, sibling: LayerId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.mark_topology(p, c);
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    // -- Tree settings --

    /// Returns the root layer.
    #[must_use]
    pub fn root(&self) -> Option<LayerId> {
        self.root
    }

    /// Sets (or clears) the root layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_root(&mut self, root: Option<LayerId>) {
        if let Some(id) = root {
            self.validate(id);
        }
        if self.root == root {
            return;
        }
        self.root = root;
        self.traversal_dirty = true;
        self.hierarchy_changed = true;
        self.change_flags.needs_commit = true;
    }

    /// Returns the viewport size in device-independent pixels.
    #[must_use]
    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    /// Sets the viewport size.
    pub fn set_viewport_size(&mut self, size: Size) {
        if self.viewport_size != size {
            self.viewport_size = size;
            self.mark_settings_changed();
        }
    }

    /// Returns the device scale factor.
    #[must_use]
    pub fn device_scale_factor(&self) -> f64 {
        self.device_scale_factor
    }

    /// Sets the device scale factor.
    pub fn set_device_scale_factor(&mut self, scale: f64) {
        if self.device_scale_factor != scale {
            self.device_scale_factor = scale;
            self.mark_settings_changed();
        }
    }

    /// Returns the background color as unpremultiplied RGBA.
    #[must_use]
    pub fn background_color(&self) -> [f32; 4] {
        self.background_color
    }

    /// Sets the background color (unpremultiplied RGBA).
    pub fn set_background_color(&mut self, rgba: [f32; 4]) {
        if self.background_color != rgba {
            self.background_color = rgba;
            self.mark_settings_changed();
        }
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the transform of a layer relative to its parent.
    #[must_use]
    pub fn transform(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Returns the opacity of a layer.
    #[must_use]
    pub fn opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns the bounds of a layer.
    #[must_use]
    pub fn bounds(&self, id: LayerId) -> Size {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns the clip shape of a layer.
    #[must_use]
    pub fn clip(&self, id: LayerId) -> Option<ClipShape> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    /// Returns the content of a layer.
    #[must_use]
    pub fn content(&self, id: LayerId) -> Option<ContentId> {
        self.validate(id);
        self.content[id.idx as usize]
    }

    /// Returns the flags of a layer.
    #[must_use]
    pub fn flags(&self, id: LayerId) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns how many times the layer's content has been updated.
    #[must_use]
    pub fn content_version(&self, id: LayerId) -> u64 {
        self.validate(id);
        self.content_version[id.idx as usize]
    }

    /// Returns the source frame number of the layer's last content update.
    #[must_use]
    pub fn last_update_frame(&self, id: LayerId) -> Option<u64> {
        self.validate(id);
        self.last_update_frame[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the transform of a layer relative to its parent.
    pub fn set_transform(&mut self, id: LayerId, transform: Affine) {
        self.validate(id);
        self.transform[id.idx as usize] = transform;
        self.mark_properties(id.idx);
    }

    /// Sets the opacity of a layer.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        self.validate(id);
        self.opacity[id.idx as usize] = opacity;
        self.mark_properties(id.idx);
    }

    /// Sets the bounds of a layer.
    pub fn set_bounds(&mut self, id: LayerId, bounds: Size) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.mark_properties(id.idx);
    }

    /// Sets the clip shape of a layer.
    pub fn set_clip(&mut self, id: LayerId, clip: Option<ClipShape>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
        self.mark_properties(id.idx);
    }

    /// Sets the content of a layer.
    ///
    /// New content also needs painting, so this invalidates the layer as
    /// [`set_needs_display`](Self::set_needs_display) does.
    pub fn set_content(&mut self, id: LayerId, content: Option<ContentId>) {
        self.validate(id);
        self.content[id.idx as usize] = content;
        self.mark_properties(id.idx);
        self.dirty.mark(id.idx, dirty::CONTENT);
        self.change_flags.needs_update_layers = true;
    }

    /// Sets the flags of a layer.
    pub fn set_flags(&mut self, id: LayerId, flags: LayerFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        self.mark_properties(id.idx);
    }

    /// Invalidates the layer's painted content.
    ///
    /// The layer is repainted by the next
    /// [`update_layers`](Self::update_layers) that finds it attached.
    pub fn set_needs_display(&mut self, id: LayerId) {
        self.validate(id);
        self.dirty.mark(id.idx, dirty::CONTENT);
        self.change_flags.needs_update_layers = true;
    }

    /// Returns what the edits since the last call ask of the pipeline, and
    /// resets it.
    pub fn take_change_flags(&mut self) -> TreeChangeFlags {
        core::mem::take(&mut self.change_flags)
    }

    // -- Internal helpers --

    /// Returns the current handle for raw slot `idx`.
    pub(crate) fn id_at(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn mark_properties(&mut self, idx: u32) {
        self.dirty.mark(idx, dirty::PROPERTIES);
        self.change_flags.needs_commit = true;
    }

    fn mark_settings_changed(&mut self) {
        self.settings_changed = true;
        self.change_flags.needs_commit = true;
    }

    fn mark_topology(&mut self, parent: u32, child: u32) {
        self.dirty.mark(parent, dirty::TOPOLOGY);
        self.dirty.mark(child, dirty::TOPOLOGY);
        self.traversal_dirty = true;
        self.change_flags.needs_commit = true;
    }

    fn link_last_child(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.mark_topology(p, c);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut tree = LayerTree::new();
        let id = tree.create_layer();
        assert!(tree.is_alive(id));
        tree.destroy_layer(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = LayerTree::new();
        let id1 = tree.create_layer();
        tree.destroy_layer(id1);
        let id2 = tree.create_layer();
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.index(), id2.index());
        assert_ne!(id1.generation(), id2.generation());
    }

    #[test]
    fn recycled_slot_starts_fresh() {
        let mut tree = LayerTree::new();
        let id1 = tree.create_layer();
        tree.set_opacity(id1, 0.25);
        tree.set_content(id1, Some(ContentId(9)));
        tree.destroy_layer(id1);
        let id2 = tree.create_layer();
        assert_eq!(tree.opacity(id2), 1.0);
        assert_eq!(tree.content(id2), None);
        assert_eq!(tree.content_version(id2), 0);
    }

    #[test]
    fn child_links_keep_order() {
        let mut tree = LayerTree::new();
        let parent = tree.create_layer();
        let a = tree.create_layer();
        let b = tree.create_layer();
        let c = tree.create_layer();

        tree.add_child(parent, a);
        tree.add_child(parent, c);
        tree.insert_before(b, c);
        assert_eq!(tree.children(parent).collect::<Vec<_>>(), [a, b, c]);
        assert_eq!(tree.parent(b), Some(parent));

        tree.remove_from_parent(b);
        assert_eq!(tree.parent(b), None);
        assert_eq!(tree.children(parent).collect::<Vec<_>>(), [a, c]);
    }

    #[test]
    fn reparent_moves_to_end_of_new_parent() {
        let mut tree = LayerTree::new();
        let p1 = tree.create_layer();
        let p2 = tree.create_layer();
        let existing = tree.create_layer();
        let child = tree.create_layer();

        tree.add_child(p1, child);
        tree.add_child(p2, existing);
        tree.reparent(child, p2);
        assert_eq!(tree.parent(child), Some(p2));
        assert!(tree.children(p1).next().is_none());
        assert_eq!(tree.children(p2).collect::<Vec<_>>(), [existing, child]);
    }

    #[test]
    fn destroying_root_clears_it() {
        let mut tree = LayerTree::new();
        let root = tree.create_layer();
        tree.set_root(Some(root));
        tree.destroy_layer(root);
        assert_eq!(tree.root(), None);
    }

    #[test]
    #[should_panic(expected = "cannot destroy layer with children")]
    fn destroy_with_children_panics() {
        let mut tree = LayerTree::new();
        let parent = tree.create_layer();
        let child = tree.create_layer();
        tree.add_child(parent, child);
        tree.destroy_layer(parent);
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_set_transform() {
        let mut tree = LayerTree::new();
        let id = tree.create_layer();
        tree.destroy_layer(id);
        tree.set_transform(id, Affine::scale(2.0));
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_add_panics() {
        let mut tree = LayerTree::new();
        let p = tree.create_layer();
        let c = tree.create_layer();
        tree.add_child(p, c);
        tree.add_child(p, c);
    }

    #[test]
    fn property_edits_request_commit() {
        let mut tree = LayerTree::new();
        let id = tree.create_layer();
        let _ = tree.take_change_flags();

        tree.set_transform(id, Affine::translate((4.0, 2.0)));
        let flags = tree.take_change_flags();
        assert!(flags.needs_commit, "property change needs a commit");
        assert!(!flags.needs_update_layers);
        assert!(tree.take_change_flags().is_empty(), "flags reset on take");
        assert_eq!(tree.transform(id), Affine::translate((4.0, 2.0)));
    }

    #[test]
    fn needs_display_requests_update_layers() {
        let mut tree = LayerTree::new();
        let id = tree.create_layer();
        let _ = tree.take_change_flags();

        tree.set_needs_display(id);
        let flags = tree.take_change_flags();
        assert!(flags.needs_update_layers);
        assert!(!flags.needs_commit, "paint invalidation alone is not a commit");
    }

    #[test]
    fn unchanged_settings_do_not_request_commit() {
        let mut tree = LayerTree::new();
        tree.set_device_scale_factor(1.0);
        tree.set_viewport_size(Size::ZERO);
        assert!(tree.take_change_flags().is_empty());

        tree.set_viewport_size(Size::new(800.0, 600.0));
        assert!(tree.take_change_flags().needs_commit);
    }
}
