//! Placement resolution.
//!
//! Turns an abstract placement request (page selector plus anchor) into an
//! absolute rectangle on the page media box. Resolution is pure geometry;
//! page lookup stays in the document model.

use crate::document::PageSelector;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Inset from the page edge for corner anchors, in points.
pub const ANCHOR_INSET: f32 = 24.0;

/// Where on the page a box goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Top-left corner, inset by [`ANCHOR_INSET`]
    TopLeft,
    /// Top-right corner, inset by [`ANCHOR_INSET`]
    TopRight,
    /// Bottom-left corner, inset by [`ANCHOR_INSET`]
    BottomLeft,
    /// Bottom-right corner, inset by [`ANCHOR_INSET`]
    BottomRight,
    /// Centered on the page
    Center,
    /// Explicit position, measured from the page's top-left corner with y
    /// growing downward
    Offset {
        /// Distance from the left page edge
        x: f32,
        /// Distance from the top page edge
        y: f32,
    },
}

/// An immutable placement request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    /// Page the box goes on
    pub selector: PageSelector,
    /// Position within that page
    pub anchor: Anchor,
}

impl PlacementRequest {
    /// Create a request.
    pub fn new(selector: PageSelector, anchor: Anchor) -> Self {
        Self { selector, anchor }
    }
}

/// Resolve an anchor to an absolute rect of `box_size` inside `media_box`.
///
/// The resolved rect must lie entirely inside the media box; anything else
/// is [`Error::OutOfBounds`], including corner boxes that cannot fit once
/// the inset is applied.
pub fn resolve(anchor: Anchor, media_box: Rect, box_size: (f32, f32)) -> Result<Rect> {
    let (w, h) = box_size;

    let rect = match anchor {
        Anchor::TopLeft => Rect::new(
            media_box.left() + ANCHOR_INSET,
            media_box.top() - ANCHOR_INSET - h,
            w,
            h,
        ),
        Anchor::TopRight => Rect::new(
            media_box.right() - ANCHOR_INSET - w,
            media_box.top() - ANCHOR_INSET - h,
            w,
            h,
        ),
        Anchor::BottomLeft => Rect::new(
            media_box.left() + ANCHOR_INSET,
            media_box.bottom() + ANCHOR_INSET,
            w,
            h,
        ),
        Anchor::BottomRight => Rect::new(
            media_box.right() - ANCHOR_INSET - w,
            media_box.bottom() + ANCHOR_INSET,
            w,
            h,
        ),
        Anchor::Center => {
            let c = media_box.center();
            Rect::new(c.x - w / 2.0, c.y - h / 2.0, w, h)
        },
        Anchor::Offset { x, y } => {
            // Top-down caller coordinates to PDF bottom-up
            Rect::new(media_box.left() + x, media_box.top() - y - h, w, h)
        },
    };

    if w <= 0.0 || h <= 0.0 || !media_box.contains_rect(&rect) {
        return Err(Error::OutOfBounds {
            rect: rect.to_xywh(),
            media_box: media_box.to_xywh(),
        });
    }

    Ok(rect)
}
