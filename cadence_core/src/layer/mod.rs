// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! A *layer* is a node in a compositing tree. Each layer has:
//!
//! - An identity ([`LayerId`]): a generational handle that becomes stale when
//!   the layer is destroyed, preventing use-after-free bugs at the API level.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - **Inputs** set by the caller: [`transform`](LayerTree::set_transform),
//!   [`opacity`](LayerTree::set_opacity), [`bounds`](LayerTree::set_bounds),
//!   [`clip`](LayerTree::set_clip), [`content`](LayerTree::set_content), and
//!   [`flags`](LayerTree::set_flags).
//! - A content version bumped by [`update_layers`](LayerTree::update_layers)
//!   whenever invalidated content is repainted.
//!
//! Nothing is derived locally: world transforms, effective opacity and
//! rasterization are the remote compositor's business. The tree only records
//! which inputs changed so a commit can ship them.
//!
//! # Dirty tracking
//!
//! Mutations mark the corresponding channel (see [`dirty`](crate::dirty))
//! and raise a [`TreeChangeFlags`] request that the pipeline turns into a
//! main-frame stage request.

mod clip;
mod id;
mod store;
mod traverse;
mod update;

pub use clip::{ClipShape, ClipState};
pub use id::{ContentId, INVALID, LayerId};
pub use store::{LayerFlags, LayerTree, TreeChangeFlags};
pub use traverse::Children;
pub use update::PushProperties;
