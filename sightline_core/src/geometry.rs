// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry snapshots reported by the observation primitive.

use kurbo::Rect;

/// Bounding box of a target as reported with its last intersection record.
///
/// Mirrors the shape of a DOM `DOMRectReadOnly`: `x`/`y`/`width`/`height`
/// describe the box as given, while `top`/`right`/`bottom`/`left` are the
/// normalized edges (a negative width or height swaps the edges).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClientRect {
    /// Horizontal origin.
    pub x: f64,
    /// Vertical origin.
    pub y: f64,
    /// Width, possibly negative.
    pub width: f64,
    /// Height, possibly negative.
    pub height: f64,
    /// Smaller of `y` and `y + height`.
    pub top: f64,
    /// Larger of `x` and `x + width`.
    pub right: f64,
    /// Larger of `y` and `y + height`.
    pub bottom: f64,
    /// Smaller of `x` and `x + width`.
    pub left: f64,
}

impl ClientRect {
    /// The all-zero rect every entry starts with.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    /// Builds a rect from origin and size, deriving the edge fields.
    #[must_use]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        let (x1, y1) = (x + width, y + height);
        Self {
            x,
            y,
            width,
            height,
            top: y.min(y1),
            right: x.max(x1),
            bottom: y.max(y1),
            left: x.min(x1),
        }
    }

    /// Returns the edges as a `kurbo` rect.
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }

    /// Returns `true` if the rect covers no area.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

impl From<Rect> for ClientRect {
    fn from(rect: Rect) -> Self {
        Self::from_xywh(rect.x0, rect.y0, rect.width(), rect.height())
    }
}
