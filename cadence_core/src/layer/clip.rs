// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip shapes.

use kurbo::{Rect, RoundedRect, RoundedRectRadii};
use serde::{Deserialize, Serialize};

/// A shape used to clip a layer's content and descendants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipShape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(RoundedRect),
}

/// Wire form of a [`ClipShape`]: plain coordinate arrays.
///
/// Rectangles are `[x0, y0, x1, y1]`; radii are
/// `[top_left, top_right, bottom_right, bottom_left]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipState {
    /// An axis-aligned rectangle.
    Rect {
        /// `[x0, y0, x1, y1]`.
        rect: [f64; 4],
    },
    /// A rectangle with rounded corners.
    RoundedRect {
        /// `[x0, y0, x1, y1]`.
        rect: [f64; 4],
        /// Corner radii, clockwise from top left.
        radii: [f64; 4],
    },
}

fn rect_coords(r: Rect) -> [f64; 4] {
    [r.x0, r.y0, r.x1, r.y1]
}

impl From<ClipShape> for ClipState {
    fn from(shape: ClipShape) -> Self {
        match shape {
            ClipShape::Rect(r) => Self::Rect {
                rect: rect_coords(r),
            },
            ClipShape::RoundedRect(rr) => {
                let radii = rr.radii();
                Self::RoundedRect {
                    rect: rect_coords(rr.rect()),
                    radii: [
                        radii.top_left,
                        radii.top_right,
                        radii.bottom_right,
                        radii.bottom_left,
                    ],
                }
            }
        }
    }
}

impl From<ClipState> for ClipShape {
    fn from(state: ClipState) -> Self {
        match state {
            ClipState::Rect {
                rect: [x0, y0, x1, y1],
            } => Self::Rect(Rect::new(x0, y0, x1, y1)),
            ClipState::RoundedRect {
                rect: [x0, y0, x1, y1],
                radii: [tl, tr, br, bl],
            } => Self::RoundedRect(RoundedRect::from_rect(
                Rect::new(x0, y0, x1, y1),
                RoundedRectRadii::new(tl, tr, br, bl),
            )),
        }
    }
}
