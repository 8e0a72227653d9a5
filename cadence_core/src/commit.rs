// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What a pipeline hands to its remote compositor on commit.
//!
//! A [`CommitMessage`] is the inputs-only delta of a [`LayerTree`]: tree
//! settings, the hierarchy when it changed, destroyed layers, and the inputs
//! of every layer that should push properties. Nothing derived (world
//! transforms, draw properties, raster output) is included; the receiver
//! computes that itself.
//!
//! The message is plain serde data. [`CommitMessage::to_json`] and
//! [`CommitMessage::from_json`] provide the JSON wire form. The swap promises
//! collected for the frame travel next to the message in a
//! [`CommitPayload`], since they are callbacks rather than data.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::layer::{ClipState, ContentId, LayerId, LayerTree};
use crate::pipeline::PipelineId;
use crate::swap_promise::{DidNotSwapReason, SwapPromise};

/// Version written into every message and required when reading one.
pub const COMMIT_FORMAT_VERSION: u32 = 1;

/// Errors from the commit wire codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The bytes were not a well-formed message.
    #[error("malformed commit message: {0}")]
    Json(#[from] serde_json::Error),
    /// The message was written by an incompatible producer.
    #[error("unsupported commit format version {found} (expected {expected})")]
    Version {
        /// Version found in the message.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}

/// Tree-level state sent with every commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerTreeState {
    /// Root layer, if any.
    pub root: Option<LayerId>,
    /// Viewport `[width, height]`.
    pub viewport_size: [f64; 2],
    /// Device scale factor.
    pub device_scale_factor: f64,
    /// Unpremultiplied RGBA.
    pub background_color: [f32; 4],
    /// Attached layers in depth-first pre-order, present only when links
    /// or the root changed since the previous commit.
    pub hierarchy: Option<Vec<LayerNode>>,
    /// Layers destroyed since the previous commit.
    pub removed_layers: Vec<LayerId>,
}

/// One entry of [`LayerTreeState::hierarchy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerNode {
    /// The layer.
    pub layer: LayerId,
    /// Its parent; `None` only for the root.
    pub parent: Option<LayerId>,
}

/// The inputs of one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerProperties {
    /// Which layer.
    pub layer: LayerId,
    /// Affine coefficients `[a, b, c, d, e, f]` relative to the parent.
    pub transform: [f64; 6],
    /// Opacity.
    pub opacity: f32,
    /// `[width, height]`.
    pub bounds: [f64; 2],
    /// Clip shape, if any.
    pub clip: Option<ClipState>,
    /// Painted content, if any.
    pub content: Option<ContentId>,
    /// Content version; a change means the content must be re-fetched.
    pub content_version: u64,
    /// Whether the layer's subtree is hidden.
    pub hidden: bool,
}

/// The serializable part of a commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitMessage {
    /// Wire format version; see [`COMMIT_FORMAT_VERSION`].
    pub format_version: u32,
    /// Producing pipeline.
    pub pipeline_id: PipelineId,
    /// Frame number of the main frame that produced this commit.
    pub source_frame_number: u64,
    /// Tree-level state.
    pub layer_tree: LayerTreeState,
    /// Inputs of every layer that should push properties.
    pub layer_updates: Vec<LayerProperties>,
}

impl CommitMessage {
    /// Captures the pending delta of `tree`, draining its push-properties
    /// state.
    pub fn capture(pipeline_id: PipelineId, source_frame_number: u64, tree: &mut LayerTree) -> Self {
        let push = tree.take_push_properties();

        let hierarchy = push.topology_changed.then(|| {
            tree.traversal_order()
                .iter()
                .map(|&idx| {
                    let layer = tree.id_at(idx);
                    LayerNode {
                        layer,
                        parent: tree.parent(layer),
                    }
                })
                .collect()
        });

        let layer_updates = push
            .layers
            .iter()
            .map(|&layer| LayerProperties {
                layer,
                transform: tree.transform(layer).as_coeffs(),
                opacity: tree.opacity(layer),
                bounds: {
                    let size = tree.bounds(layer);
                    [size.width, size.height]
                },
                clip: tree.clip(layer).map(ClipState::from),
                content: tree.content(layer),
                content_version: tree.content_version(layer),
                hidden: tree.flags(layer).hidden,
            })
            .collect();

        let viewport = tree.viewport_size();
        Self {
            format_version: COMMIT_FORMAT_VERSION,
            pipeline_id,
            source_frame_number,
            layer_tree: LayerTreeState {
                root: tree.root(),
                viewport_size: [viewport.width, viewport.height],
                device_scale_factor: tree.device_scale_factor(),
                background_color: tree.background_color(),
                hierarchy,
                removed_layers: push.removed,
            },
            layer_updates,
        }
    }

    /// Encodes the message as JSON.
    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a message from JSON, rejecting other format versions.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        let message: Self = serde_json::from_str(json)?;
        if message.format_version != COMMIT_FORMAT_VERSION {
            return Err(CodecError::Version {
                found: message.format_version,
                expected: COMMIT_FORMAT_VERSION,
            });
        }
        Ok(message)
    }
}

/// A commit as handed to a
/// [`RemoteCompositorBridge`](crate::pipeline::RemoteCompositorBridge).
///
/// The bridge owns the payload, and with it the duty to resolve every swap
/// promise once the frame is (or is not) displayed.
pub struct CommitPayload {
    /// The serializable delta.
    pub message: CommitMessage,
    /// Promises tied to this frame.
    pub swap_promises: Vec<Box<dyn SwapPromise>>,
}

impl fmt::Debug for CommitPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitPayload")
            .field("message", &self.message)
            .field("swap_promises", &self.swap_promises.len())
            .finish()
    }
}

impl CommitPayload {
    /// Resolves every promise as swapped and returns the message.
    pub fn did_swap(self) -> CommitMessage {
        for promise in self.swap_promises {
            promise.did_swap();
        }
        self.message
    }

    /// Breaks every promise with `reason` and returns the message.
    pub fn did_not_swap(self, reason: DidNotSwapReason) -> CommitMessage {
        for promise in self.swap_promises {
            promise.did_not_swap(reason);
        }
        self.message
    }
}
