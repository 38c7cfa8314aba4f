// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: identifiers, layout descriptors, element kinds, flags, and payloads.
//!
//! ## Overview
//!
//! These types describe what the engine knows about a control and what it
//! reports back. They are shared by the [probe](crate::probe), the
//! [resolver](crate::orientation), the [calculator](crate::insertion) and the
//! snapshots handed to application handlers.

use core::any::Any;
use std::rc::Rc;

/// Identity of a bound data item.
///
/// Equality is the only operation the engine relies on; it stands in for
/// reference equality of the bound objects.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ItemId(pub u64);

/// Identity of a bound collection.
///
/// Two snapshots referring to the same `CollectionId` refer to the same list
/// object; this is what "reference-identical collections" means in the
/// default drop policy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CollectionId(pub u32);

/// Identity of a group in a grouped items view.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct GroupKey(pub u32);

/// Stacking axis of an items panel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Items are laid out left to right (or right to left).
    Horizontal,
    /// Items are laid out top to bottom.
    #[default]
    Vertical,
}

/// Direction in which horizontal content flows.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowDirection {
    /// The first item is leftmost.
    #[default]
    LeftToRight,
    /// The first item is rightmost.
    RightToLeft,
}

/// Edge of a tab control that hosts the tab strip.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TabPlacement {
    /// Tabs above the content.
    Top,
    /// Tabs below the content.
    Bottom,
    /// Tabs left of the content.
    Left,
    /// Tabs right of the content.
    Right,
}

/// Kind of panel that arranges an items control's containers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PanelKind {
    /// A stack panel.
    Stack,
    /// A virtualizing stack panel; containers are realized on demand.
    VirtualizingStack,
    /// A wrap panel.
    Wrap,
    /// A uniform grid with a fixed column count.
    UniformGrid {
        /// Number of columns.
        columns: u32,
    },
    /// A tab strip panel.
    Tab,
    /// Anything else.
    Custom,
}

/// What the toolkit reports about a realized items panel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PanelInfo {
    /// Panel kind.
    pub kind: PanelKind,
    /// The panel's `Orientation` property, if it has one.
    pub orientation: Option<Orientation>,
    /// Flow direction the panel arranges with.
    pub flow_direction: FlowDirection,
}

impl PanelInfo {
    /// A panel with an orientation property and left-to-right flow.
    pub const fn oriented(kind: PanelKind, orientation: Orientation) -> Self {
        Self {
            kind,
            orientation: Some(orientation),
            flow_direction: FlowDirection::LeftToRight,
        }
    }
}

/// Closed set of item-bound control kinds.
///
/// Each kind knows the element kind of its item containers, except
/// [`ItemsKind::Generic`], whose container kind is discovered structurally by
/// the [probe](crate::probe).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ItemsKind {
    /// A list box; containers are [`ElementKind::ListBoxItem`].
    ListBox,
    /// A list view; containers are [`ElementKind::ListViewItem`].
    ListView,
    /// A tree view, or a node of one hosting its own children; containers are
    /// [`ElementKind::TreeViewItem`].
    TreeView,
    /// A tab control; containers are [`ElementKind::TabItem`].
    TabControl,
    /// A data grid; containers are [`ElementKind::DataGridRow`].
    DataGrid,
    /// Any other items control.
    Generic,
}

impl ItemsKind {
    /// Element kind of this control's item containers, when fixed by the kind.
    pub const fn container_kind(self) -> Option<ElementKind> {
        match self {
            Self::ListBox => Some(ElementKind::ListBoxItem),
            Self::ListView => Some(ElementKind::ListViewItem),
            Self::TreeView => Some(ElementKind::TreeViewItem),
            Self::TabControl => Some(ElementKind::TabItem),
            Self::DataGrid => Some(ElementKind::DataGridRow),
            Self::Generic => None,
        }
    }

    /// Hierarchical controls accept drops as children and measure near-match
    /// distance in 2D.
    pub const fn is_hierarchical(self) -> bool {
        matches!(self, Self::TreeView)
    }

    /// Copy semantics are ill-defined when the dragged items are themselves
    /// headered containers.
    pub const fn allows_copy(self) -> bool {
        !matches!(self, Self::TabControl)
    }
}

/// Closed set of element kinds the engine distinguishes.
///
/// This replaces runtime type inspection: the toolkit tags each element once
/// and the engine matches on the tag.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ElementKind {
    /// A plain visual with no special meaning.
    #[default]
    Visual,
    /// The panel that arranges an items control's containers.
    ItemsPanel,
    /// List box item container.
    ListBoxItem,
    /// List view item container.
    ListViewItem,
    /// Tree view item container.
    TreeViewItem,
    /// Tab item container.
    TabItem,
    /// Data grid row container.
    DataGridRow,
    /// Container of one group in a grouped view.
    GroupItem,
    /// A scroll bar or slider.
    ScrollBar,
    /// A text editing region.
    TextInput,
    /// A toggle button or check box.
    ToggleButton,
    /// A combo box.
    ComboBox,
    /// A column header.
    ColumnHeader,
    /// Toolkit-specific element type, compared by value.
    Custom(u32),
}

impl ElementKind {
    /// Interactive sub-elements that never start a drag.
    pub const fn excludes_drag(self) -> bool {
        matches!(
            self,
            Self::ScrollBar | Self::TextInput | Self::ToggleButton | Self::ComboBox | Self::ColumnHeader
        )
    }
}

/// Where a new-item placeholder row sits in an editable view.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PlaceholderPosition {
    /// No placeholder.
    #[default]
    None,
    /// Placeholder is the first row.
    AtBeginning,
    /// Placeholder is the last row.
    AtEnd,
}

bitflags::bitflags! {
    /// Where a drop lands relative to the hovered item.
    ///
    /// `BEFORE_TARGET_ITEM` and `AFTER_TARGET_ITEM` are exclusive;
    /// `TARGET_ITEM_CENTER` is independent of both.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct InsertPosition: u8 {
        /// Insert before the hovered item.
        const BEFORE_TARGET_ITEM = 0b0001;
        /// Insert after the hovered item.
        const AFTER_TARGET_ITEM  = 0b0010;
        /// The pointer is in the center zone of the hovered item.
        const TARGET_ITEM_CENTER = 0b0100;
    }
}

bitflags::bitflags! {
    /// Drag-and-drop operations; the empty set means "none".
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DragDropEffects: u32 {
        /// Copy the data to the target.
        const COPY   = 0x0000_0001;
        /// Move the data to the target.
        const MOVE   = 0x0000_0002;
        /// Link the data to the target.
        const LINK   = 0x0000_0004;
        /// The target is scrolling.
        const SCROLL = 0x8000_0000;
    }
}

bitflags::bitflags! {
    /// Mouse button and modifier state during a drag.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct KeyStates: u8 {
        /// Left mouse button held.
        const LEFT_BUTTON   = 0b0000_0001;
        /// Right mouse button held.
        const RIGHT_BUTTON  = 0b0000_0010;
        /// Shift held.
        const SHIFT         = 0b0000_0100;
        /// Control held.
        const CONTROL       = 0b0000_1000;
        /// Middle mouse button held.
        const MIDDLE_BUTTON = 0b0001_0000;
        /// Alt held.
        const ALT           = 0b0010_0000;
    }
}

/// A mouse button that can initiate a drag.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Middle button.
    Middle,
}

impl MouseButton {
    /// The key-state bit reporting this button as held.
    pub const fn key_state(self) -> KeyStates {
        match self {
            Self::Left => KeyStates::LEFT_BUTTON,
            Self::Right => KeyStates::RIGHT_BUTTON,
            Self::Middle => KeyStates::MIDDLE_BUTTON,
        }
    }
}

/// Which adorner the drop target wants drawn.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum DropAdornerKind {
    /// No adorner.
    #[default]
    None,
    /// Highlight box around the hovered item.
    Highlight,
    /// Insertion line at the insertion index.
    Insert,
    /// An application adorner registered with
    /// [`DragDropCoordinator::register_adorner`](crate::coordinator::DragDropCoordinator::register_adorner).
    Custom(&'static str),
}

/// The native callback a drop snapshot was built for.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum DropEventKind {
    /// Pointer entered a target.
    Enter,
    /// Pointer moved over a target.
    #[default]
    Over,
    /// Pointer left a target.
    Leave,
    /// Data was dropped.
    Drop,
}

/// Data carried by a drag.
#[derive(Clone)]
pub enum Payload {
    /// A single bound item.
    Item(ItemId),
    /// Several bound items, in selection order.
    Items(Vec<ItemId>),
    /// Application-defined data.
    Data(Rc<dyn Any>),
}

impl Payload {
    /// Bound items carried by this payload; empty for application data.
    pub fn items(&self) -> &[ItemId] {
        match self {
            Self::Item(item) => core::slice::from_ref(item),
            Self::Items(items) => items,
            Self::Data(_) => &[],
        }
    }
}

impl core::fmt::Debug for Payload {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Item(item) => f.debug_tuple("Item").field(item).finish(),
            Self::Items(items) => f.debug_tuple("Items").field(items).finish(),
            Self::Data(_) => f.write_str("Data(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kinds_have_fixed_containers() {
        assert_eq!(ItemsKind::TreeView.container_kind(), Some(ElementKind::TreeViewItem));
        assert_eq!(ItemsKind::Generic.container_kind(), None);
        assert!(ItemsKind::TreeView.is_hierarchical());
        assert!(!ItemsKind::ListBox.is_hierarchical());
        assert!(!ItemsKind::TabControl.allows_copy());
    }

    #[test]
    fn payload_items_view() {
        assert_eq!(Payload::Item(ItemId(3)).items(), &[ItemId(3)]);
        assert_eq!(
            Payload::Items(vec![ItemId(1), ItemId(2)]).items(),
            &[ItemId(1), ItemId(2)]
        );
        let data = Payload::Data(Rc::new(5_u8));
        assert!(data.items().is_empty());
        assert_eq!(format!("{data:?}"), "Data(..)");
    }

    #[test]
    fn excluded_elements() {
        assert!(ElementKind::ScrollBar.excludes_drag());
        assert!(ElementKind::ColumnHeader.excludes_drag());
        assert!(!ElementKind::ListBoxItem.excludes_drag());
        assert!(!ElementKind::Custom(7).excludes_drag());
    }
}
