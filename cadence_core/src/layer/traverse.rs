// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, LayerId};
use super::store::LayerTree;

/// An iterator over the direct children of a layer.
///
/// Created by [`LayerTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a LayerTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a LayerTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}

impl LayerTree {
    /// Rebuilds the depth-first pre-order traversal from the root and the
    /// per-slot `attached` flags.
    pub(crate) fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        self.attached.clear();
        self.attached.resize(self.len as usize, false);

        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root.idx];
        while let Some(idx) = stack.pop() {
            self.traversal_order.push(idx);
            self.attached[idx as usize] = true;
            // Push children in reverse so the first child is visited first.
            let first = stack.len();
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
            stack[first..].reverse();
        }
    }
}
