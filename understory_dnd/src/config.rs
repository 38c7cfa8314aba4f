// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinator-wide configuration.

use kurbo::Point;

use crate::types::KeyStates;

/// Tuning shared by every attached source and target.
///
/// Per-control settings (drag context, orientation overrides, scrolling mode)
/// live on [`DragSourceBehavior`](crate::coordinator::DragSourceBehavior) and
/// [`DropTargetBehavior`](crate::coordinator::DropTargetBehavior).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DragDropConfig {
    /// Horizontal pointer travel that turns a press into a drag.
    pub min_horizontal_drag_distance: f64,
    /// Vertical pointer travel that turns a press into a drag.
    pub min_vertical_drag_distance: f64,
    /// Key state that switches the default drop policy from move to copy.
    pub copy_key_state: KeyStates,
    /// Select the inserted items in the target after a default drop.
    pub select_dropped_items: bool,
    /// Only start drags from items that were already selected at press time.
    pub drag_directly_selected_only: bool,
    /// Allow the secondary button to start drags.
    pub can_drag_with_right_button: bool,
    /// Distance from a viewport edge that triggers auto-scroll. Capped at half
    /// the viewport extent.
    pub scroll_margin: f64,
    /// Where the pointer sits on the drag preview, normalized to the dragged
    /// item's size.
    pub drag_anchor: Point,
    /// Keep a floating preview positioned while dragging.
    pub use_preview: bool,
}

impl Default for DragDropConfig {
    fn default() -> Self {
        Self {
            min_horizontal_drag_distance: 4.0,
            min_vertical_drag_distance: 4.0,
            copy_key_state: KeyStates::CONTROL,
            select_dropped_items: false,
            drag_directly_selected_only: false,
            can_drag_with_right_button: false,
            scroll_margin: 24.0,
            drag_anchor: Point::new(0.0, 1.0),
            use_preview: true,
        }
    }
}
