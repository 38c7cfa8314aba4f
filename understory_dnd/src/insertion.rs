// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion index calculation.
//!
//! Given the hovered item (or none), where the pointer sits inside it, and the
//! resolved orientation and flow direction, [`compute`] produces the insertion
//! index and the Before/After/Center classification.
//!
//! ## Rules
//!
//! - No hovered item: append (`index == item_count`), no position flags.
//! - The pointer coordinate along the stacking axis is normalized to the item's
//!   extent. Past the halfway point is After (index + 1), otherwise Before.
//!   Right-to-left flow swaps the halves on the horizontal axis.
//! - Strictly inside the center band (0.25, 0.75) adds the Center flag. When
//!   the item accepts children the target is redirected into the item's own
//!   child list, appending after its last child.
//! - A non-positive extent is treated as sitting exactly on the leading
//!   boundary: Before, no Center.
//!
//! [`anchor_to_group`] and [`skip_placeholder`] adjust a computed index for
//! grouped and editable views.

use kurbo::{Point, Size};

use crate::types::{FlowDirection, GroupKey, InsertPosition, Orientation, PlaceholderPosition};

/// Lower bound of the center band, as a fraction of the item's extent.
pub const CENTER_BAND_START: f64 = 0.25;
/// Upper bound of the center band, as a fraction of the item's extent.
pub const CENTER_BAND_END: f64 = 0.75;

/// The item container under the pointer, reduced to what the calculator needs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HoveredItem {
    /// View index of the hovered item.
    pub index: usize,
    /// Rendered size used for the split; a tree node's header rather than its
    /// whole expanded subtree.
    pub extent: Size,
    /// Pointer position relative to the top-left of `extent`.
    pub local: Point,
    /// Whether a center drop re-parents into this item.
    pub accepts_children: bool,
    /// Current number of children, for appending into the item.
    pub child_count: usize,
}

/// Result of the insertion calculation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Insertion {
    /// Insertion index: into the control's view, or into the hovered item's
    /// children when `into_children` is set.
    pub index: usize,
    /// Before/After/Center classification.
    pub position: InsertPosition,
    /// The drop re-parents into the hovered item.
    pub into_children: bool,
}

/// Compute the insertion point for one tick.
pub fn compute(
    hovered: Option<&HoveredItem>,
    item_count: usize,
    orientation: Orientation,
    flow: FlowDirection,
) -> Insertion {
    let Some(item) = hovered else {
        return Insertion {
            index: item_count,
            position: InsertPosition::empty(),
            into_children: false,
        };
    };

    let (coord, extent) = match orientation {
        Orientation::Vertical => (item.local.y, item.extent.height),
        Orientation::Horizontal => (item.local.x, item.extent.width),
    };
    if extent <= 0.0 || extent.is_nan() {
        return Insertion {
            index: item.index,
            position: InsertPosition::BEFORE_TARGET_ITEM,
            into_children: false,
        };
    }

    let t = coord / extent;
    let mut after = t > 0.5;
    if orientation == Orientation::Horizontal && flow == FlowDirection::RightToLeft {
        after = !after;
    }
    let mut insertion = if after {
        Insertion {
            index: item.index + 1,
            position: InsertPosition::AFTER_TARGET_ITEM,
            into_children: false,
        }
    } else {
        Insertion {
            index: item.index,
            position: InsertPosition::BEFORE_TARGET_ITEM,
            into_children: false,
        }
    };

    if t > CENTER_BAND_START && t < CENTER_BAND_END {
        insertion.position |= InsertPosition::TARGET_ITEM_CENTER;
        if item.accepts_children {
            insertion.index = item.child_count;
            insertion.into_children = true;
        }
    }
    insertion
}

/// Keep a drop inside the group the pointer is over.
///
/// When the computed index lands on an item of a different group than
/// `group`, the insertion is moved to the nearest boundary of `group`: after
/// its last item (forcing After) when the index is past the group, before its
/// first item otherwise.
pub fn anchor_to_group(
    insertion: Insertion,
    group: Option<GroupKey>,
    item_count: usize,
    group_of_index: impl Fn(usize) -> Option<GroupKey>,
) -> Insertion {
    let Some(group) = group else {
        return insertion;
    };
    if insertion.into_children
        || insertion.index >= item_count
        || group_of_index(insertion.index) == Some(group)
    {
        return insertion;
    }
    let mut members = (0..item_count).filter(|i| group_of_index(*i) == Some(group));
    let Some(first) = members.next() else {
        return insertion;
    };
    let last = members.last().unwrap_or(first);
    let center = insertion.position & InsertPosition::TARGET_ITEM_CENTER;
    if insertion.index > last {
        Insertion {
            index: last + 1,
            position: InsertPosition::AFTER_TARGET_ITEM | center,
            into_children: false,
        }
    } else {
        Insertion {
            index: first,
            position: InsertPosition::BEFORE_TARGET_ITEM | center,
            into_children: false,
        }
    }
}

/// Move an index off the new-item placeholder row of an editable view.
///
/// `item_count` includes the placeholder row.
pub fn skip_placeholder(index: usize, placeholder: PlaceholderPosition, item_count: usize) -> usize {
    match placeholder {
        PlaceholderPosition::AtBeginning if index == 0 => 1.min(item_count),
        PlaceholderPosition::AtEnd if index == item_count => item_count.saturating_sub(1),
        _ => index,
    }
}
