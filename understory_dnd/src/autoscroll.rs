// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Auto-scroll while dragging near the edge of a scrollable drop target.

use kurbo::{Point, Rect, Size, Vec2};

/// Scroll state of a scroll viewer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollInfo {
    /// World-space bounds of the visible viewport.
    pub viewport: Rect,
    /// Current scroll offset.
    pub offset: Vec2,
    /// Total scrollable content size.
    pub extent: Size,
}

/// Axes along which a drop target scrolls during a drag.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollingMode {
    /// Never scroll.
    None,
    /// Horizontal only.
    HorizontalOnly,
    /// Vertical only.
    VerticalOnly,
    /// Both axes.
    #[default]
    Both,
}

impl ScrollingMode {
    const fn horizontal(self) -> bool {
        matches!(self, Self::HorizontalOnly | Self::Both)
    }

    const fn vertical(self) -> bool {
        matches!(self, Self::VerticalOnly | Self::Both)
    }
}

/// One line-scroll step per axis; `-1`, `0` or `1`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ScrollRequest {
    /// Horizontal step; positive scrolls right.
    pub dx: i32,
    /// Vertical step; positive scrolls down.
    pub dy: i32,
}

/// Line-scroll step for a pointer at `pointer` (world space), or `None`.
///
/// Scrolls toward an edge when the pointer is within `margin` of it and there
/// is content left in that direction. The margin never exceeds half the
/// viewport along the axis.
pub fn scroll_request(
    mode: ScrollingMode,
    info: &ScrollInfo,
    pointer: Point,
    margin: f64,
) -> Option<ScrollRequest> {
    let viewport = info.viewport;
    let local = pointer - viewport.origin();
    let mut request = ScrollRequest::default();

    if mode.horizontal() {
        let m = margin.min(viewport.width() / 2.0);
        let max_offset = info.extent.width - viewport.width();
        if local.x >= viewport.width() - m && info.offset.x < max_offset {
            request.dx = 1;
        } else if local.x < m && info.offset.x > 0.0 {
            request.dx = -1;
        }
    }
    if mode.vertical() {
        let m = margin.min(viewport.height() / 2.0);
        let max_offset = info.extent.height - viewport.height();
        if local.y >= viewport.height() - m && info.offset.y < max_offset {
            request.dy = 1;
        } else if local.y < m && info.offset.y > 0.0 {
            request.dy = -1;
        }
    }

    (request != ScrollRequest::default()).then_some(request)
}
