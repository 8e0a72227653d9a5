// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The layer tree uses multi-channel dirty tracking (via [`understory_dirty`])
//! to remember what changed since the last commit. No channel propagates to
//! descendants: the remote side receives inputs only and recomputes anything
//! inherited itself.
//!
//! - [`PROPERTIES`] is marked by every property setter. Drained when the
//!   commit collects the layers whose properties must be pushed.
//! - [`CONTENT`] is marked by paint invalidation. Drained by
//!   [`LayerTree::update_layers`](crate::layer::LayerTree::update_layers);
//!   invalidations on layers not attached to the root are marked again so
//!   they survive until the layer is attached.
//! - [`TOPOLOGY`] is marked on the layers whose links changed. Drained with
//!   [`PROPERTIES`]; any entry means the hierarchy must be re-sent.

use understory_dirty::Channel;

/// A layer input (transform, opacity, bounds, clip, content, flags) changed.
pub const PROPERTIES: Channel = Channel::new(0);

/// A layer's painted content was invalidated.
pub const CONTENT: Channel = Channel::new(1);

/// Parent/child links changed.
pub const TOPOLOGY: Channel = Channel::new(2);
