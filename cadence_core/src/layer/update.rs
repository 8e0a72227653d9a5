// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content updates and push-properties collection.
//!
//! Two passes consume the tree's dirty channels during a main frame:
//!
//! 1. [`update_layers`](LayerTree::update_layers) drains **CONTENT** and
//!    bumps the content version of every invalidated layer attached to the
//!    root. Invalidations on detached layers are re-marked.
//! 2. [`take_push_properties`](LayerTree::take_push_properties) drains
//!    **PROPERTIES** and **TOPOLOGY** and merges them with the layers updated
//!    in step 1 into the set of layers whose inputs must be sent.

use super::id::LayerId;
use super::store::LayerTree;
use crate::dirty;

/// The layers (and tree-level state) a commit must send.
///
/// Produced by [`LayerTree::take_push_properties`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushProperties {
    /// Live layers whose inputs changed, in slot order.
    pub layers: Vec<LayerId>,
    /// Whether parent/child links or the root changed.
    pub topology_changed: bool,
    /// Whether viewport, scale, or background changed.
    pub settings_changed: bool,
    /// Layers destroyed since the last collection.
    pub removed: Vec<LayerId>,
}

impl PushProperties {
    /// Whether there is nothing to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
            && !self.topology_changed
            && !self.settings_changed
            && self.removed.is_empty()
    }
}

impl LayerTree {
    /// Updates the content of every invalidated layer attached to the root.
    ///
    /// Each updated layer's content version is bumped, stamped with
    /// `source_frame_number`, and queued for push. Returns whether any layer
    /// was updated.
    pub fn update_layers(&mut self, source_frame_number: u64) -> bool {
        self.ensure_traversal();

        let invalidated: Vec<u32> = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();

        let mut updated = false;
        for idx in invalidated {
            if self.free_list.contains(&idx) {
                continue;
            }
            if !self.attached[idx as usize] {
                // Repaint once it is attached.
                self.dirty.mark(idx, dirty::CONTENT);
                continue;
            }
            self.content_version[idx as usize] += 1;
            self.last_update_frame[idx as usize] = Some(source_frame_number);
            self.content_updated.push(idx);
            updated = true;
        }
        updated
    }

    /// Drains everything a commit must send.
    pub fn take_push_properties(&mut self) -> PushProperties {
        self.ensure_traversal();

        let mut layers: Vec<u32> = self
            .dirty
            .drain(dirty::PROPERTIES)
            .deterministic()
            .run()
            .collect();
        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        let topology_changed = !topology.is_empty() || self.hierarchy_changed;

        layers.extend(topology);
        layers.append(&mut self.content_updated);
        layers.sort_unstable();
        layers.dedup();
        layers.retain(|idx| !self.free_list.contains(idx));

        let push = PushProperties {
            layers: layers.into_iter().map(|idx| self.id_at(idx)).collect(),
            topology_changed,
            settings_changed: self.settings_changed,
            removed: core::mem::take(&mut self.pending_removed),
        };
        self.hierarchy_changed = false;
        self.settings_changed = false;
        push
    }

    /// Returns the attached layers in depth-first pre-order, as raw slots.
    ///
    /// Only current after [`update_layers`](Self::update_layers) or
    /// [`take_push_properties`](Self::take_push_properties).
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    /// Returns whether the layer is reachable from the root.
    ///
    /// Only current after [`update_layers`](Self::update_layers) or
    /// [`take_push_properties`](Self::take_push_properties).
    #[must_use]
    pub fn is_attached(&self, id: LayerId) -> bool {
        self.is_alive(id) && self.attached.get(id.idx as usize).copied().unwrap_or(false)
    }

    fn ensure_traversal(&mut self) {
        if self.traversal_dirty {
            self.rebuild_traversal_order();
            self.traversal_dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Affine;

    use super::*;
    use crate::layer::ContentId;

    fn tree_with_root() -> (LayerTree, LayerId) {
        let mut tree = LayerTree::new();
        let root = tree.create_layer();
        tree.set_root(Some(root));
        let _ = tree.take_push_properties();
        (tree, root)
    }

    #[test]
    fn traversal_is_depth_first_from_root() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_layer();
        let b = tree.create_layer();
        let a1 = tree.create_layer();
        let stray = tree.create_layer();
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.add_child(a, a1);

        let _ = tree.update_layers(0);
        let order: Vec<u32> = [root, a, a1, b].iter().map(|id| id.index()).collect();
        assert_eq!(tree.traversal_order(), order.as_slice());
        assert!(tree.is_attached(a1));
        assert!(!tree.is_attached(stray), "not reachable from the root");
    }

    #[test]
    fn update_layers_bumps_attached_invalidations() {
        let (mut tree, root) = tree_with_root();
        let child = tree.create_layer();
        tree.add_child(root, child);
        tree.set_needs_display(child);

        assert!(tree.update_layers(7));
        assert_eq!(tree.content_version(child), 1);
        assert_eq!(tree.last_update_frame(child), Some(7));
        assert!(!tree.update_layers(8), "invalidation consumed");
    }

    #[test]
    fn detached_invalidation_waits_for_attachment() {
        let (mut tree, root) = tree_with_root();
        let orphan = tree.create_layer();
        tree.set_content(orphan, Some(ContentId(3)));

        assert!(!tree.update_layers(1), "detached layers are not updated");
        assert_eq!(tree.content_version(orphan), 0);

        tree.add_child(root, orphan);
        assert!(tree.update_layers(2), "kept invalidation applies once attached");
        assert_eq!(tree.last_update_frame(orphan), Some(2));
    }

    #[test]
    fn push_properties_merges_channels_once() {
        let (mut tree, root) = tree_with_root();
        let child = tree.create_layer();
        tree.add_child(root, child);
        tree.set_transform(child, Affine::scale(3.0));
        tree.set_needs_display(child);
        let _ = tree.update_layers(0);

        let push = tree.take_push_properties();
        assert_eq!(push.layers, [root, child], "root and child, each once");
        assert!(push.topology_changed);
        assert!(!push.settings_changed);

        assert!(tree.take_push_properties().is_empty(), "drained");
    }

    #[test]
    fn property_only_edit_does_not_resend_hierarchy() {
        let (mut tree, root) = tree_with_root();
        tree.set_opacity(root, 0.5);
        let push = tree.take_push_properties();
        assert_eq!(push.layers, [root]);
        assert!(!push.topology_changed);
    }

    #[test]
    fn removed_layers_are_reported_not_pushed() {
        let (mut tree, root) = tree_with_root();
        let child = tree.create_layer();
        tree.add_child(root, child);
        let _ = tree.take_push_properties();

        tree.remove_from_parent(child);
        tree.destroy_layer(child);
        let push = tree.take_push_properties();
        assert_eq!(push.removed, [child]);
        assert_eq!(push.layers, [root], "dead slots are filtered out");
    }
}
