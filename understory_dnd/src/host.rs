// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator seams: the visual tree, items controls, and bound lists.
//!
//! ## Overview
//!
//! The engine never touches a toolkit directly. It asks a [`VisualTree`] for
//! structure and geometry, an [`ItemsHost`] for item-container semantics
//! (generator mapping, bound collection, selection, groups), and mutates bound
//! collections through [`ItemList`].
//!
//! All geometry is in world space. Implementations report only what is
//! currently realized: a container scrolled out of a virtualizing panel simply
//! has no node.

use kurbo::{Line, Point, Rect};

use crate::autoscroll::ScrollInfo;
use crate::types::{
    CollectionId, ElementKind, FlowDirection, GroupKey, ItemId, ItemsKind, PanelInfo,
    PlaceholderPosition, TabPlacement,
};

/// Structure and geometry of the rendered element tree.
pub trait VisualTree {
    /// Element handle.
    type Node: Copy + Eq + Ord + core::fmt::Debug;

    /// Visual parent of `node`, or `None` for roots and detached nodes.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Logical parent, consulted when an element has no visual parent yet
    /// (content that has not been realized).
    fn logical_parent(&self, _node: Self::Node) -> Option<Self::Node> {
        None
    }

    /// Visual children in order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// World-space rendered bounds; `None` when detached or not realized.
    fn bounds(&self, node: Self::Node) -> Option<Rect>;

    /// Whether the element is rendered (not collapsed or hidden).
    fn is_visible(&self, node: Self::Node) -> bool;

    /// Topmost visible, hit-testable element under `point` within `root`'s subtree.
    fn hit_test(&self, root: Self::Node, point: Point) -> Option<Self::Node>;

    /// Visible elements within `root`'s subtree whose bounds the segment touches.
    fn hit_test_line(&self, root: Self::Node, line: Line) -> Vec<Self::Node>;

    /// Kind tag of the element.
    fn element_kind(&self, _node: Self::Node) -> ElementKind {
        ElementKind::Visual
    }

    /// Flow direction the element lays out with.
    fn flow_direction(&self, _node: Self::Node) -> FlowDirection {
        FlowDirection::LeftToRight
    }
}

/// Items-control semantics layered on a visual tree.
///
/// An item container may itself be an items control; tree view nodes host
/// their own children that way.
pub trait ItemsHost: VisualTree {
    /// The kind of items control `node` is, or `None` if it is not one.
    fn items_kind(&self, node: Self::Node) -> Option<ItemsKind>;

    /// The realized panel arranging `control`'s containers.
    ///
    /// The default searches `control`'s subtree breadth first for an
    /// [`ElementKind::ItemsPanel`], without descending into nested items
    /// controls.
    fn items_panel(&self, control: Self::Node) -> Option<Self::Node> {
        let mut queue = std::collections::VecDeque::from(self.children(control));
        while let Some(node) = queue.pop_front() {
            if self.element_kind(node) == ElementKind::ItemsPanel {
                return Some(node);
            }
            if self.items_kind(node).is_none() {
                queue.extend(self.children(node));
            }
        }
        None
    }

    /// Layout description of a realized panel.
    fn panel_info(&self, _panel: Self::Node) -> Option<PanelInfo> {
        None
    }

    /// Tab strip placement of a tab control.
    fn tab_placement(&self, _control: Self::Node) -> Option<TabPlacement> {
        None
    }

    /// Number of items in `control`'s (possibly filtered or sorted) view.
    fn item_count(&self, control: Self::Node) -> usize;

    /// Item at `index` in `control`'s view.
    fn item_at(&self, control: Self::Node, index: usize) -> Option<ItemId>;

    /// Generator lookup: the view index of a realized container, or `None`
    /// when the container does not belong to `control`.
    fn index_from_container(&self, control: Self::Node, container: Self::Node) -> Option<usize>;

    /// Generator lookup: the realized container for a view index.
    fn container_from_index(&self, control: Self::Node, index: usize) -> Option<Self::Node>;

    /// The collection `control` is bound to.
    fn items_source(&self, control: Self::Node) -> Option<CollectionId>;

    /// Read access to a bound collection.
    fn collection(&self, id: CollectionId) -> Option<&dyn ItemList>;

    /// Write access to a bound collection.
    fn collection_mut(&mut self, id: CollectionId) -> Option<&mut dyn ItemList>;

    /// Selected items as the control currently reports them.
    ///
    /// Controls often lag their internal selection behind the press that
    /// changed it; callers must tolerate a stale answer.
    fn selected_items(&self, _control: Self::Node) -> Vec<ItemId> {
        Vec::new()
    }

    /// Whether the control allows more than one selected item.
    fn can_select_multiple(&self, _control: Self::Node) -> bool {
        false
    }

    /// Replace the control's selection.
    fn select_items(&mut self, _control: Self::Node, _items: &[ItemId]) {}

    /// Group represented by a [`ElementKind::GroupItem`] element.
    fn group_of_element(&self, _node: Self::Node) -> Option<GroupKey> {
        None
    }

    /// Bottom-level group of the item at `index` in `control`'s view.
    fn group_of_index(&self, _control: Self::Node, _index: usize) -> Option<GroupKey> {
        None
    }

    /// New-item placeholder of an editable view.
    fn placeholder(&self, _control: Self::Node) -> PlaceholderPosition {
        PlaceholderPosition::None
    }

    /// Bounds of a container's own header when it differs from the whole
    /// container, as for an expanded tree node.
    fn header_bounds(&self, _container: Self::Node) -> Option<Rect> {
        None
    }

    /// A copy of `item`, when the item supports cloning.
    fn clone_item(&mut self, _item: ItemId) -> Option<ItemId> {
        None
    }

    /// Scroll state of the scroll viewer hosting `control`.
    fn scroll_info(&self, _control: Self::Node) -> Option<ScrollInfo> {
        None
    }

    /// Scroll `control`'s viewer by whole lines; positive is right/down.
    fn scroll_by_lines(&mut self, _control: Self::Node, _dx: i32, _dy: i32) {}
}

/// A bound, mutable list of items.
pub trait ItemList {
    /// Number of items.
    fn len(&self) -> usize;

    /// Returns true if there are no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index`.
    fn get(&self, index: usize) -> Option<ItemId>;

    /// Position of `item`.
    fn index_of(&self, item: ItemId) -> Option<usize> {
        (0..self.len()).find(|i| self.get(*i) == Some(item))
    }

    /// Insert at `index`, clamped to `len`.
    fn insert(&mut self, index: usize, item: ItemId);

    /// Remove the item at `index`.
    fn remove(&mut self, index: usize) -> Option<ItemId>;

    /// Whether the list supports positional mutation at all. Plain sequences
    /// that can only be enumerated return false.
    fn is_list(&self) -> bool {
        true
    }

    /// Whether the list reorders in place, keeping selection and scroll
    /// anchors stable.
    fn supports_move(&self) -> bool {
        false
    }

    /// Move the item at `from` so it ends up at `to`.
    fn move_item(&mut self, from: usize, to: usize) {
        if let Some(item) = self.remove(from) {
            self.insert(to, item);
        }
    }

    /// Whether `item` is type-compatible with this list.
    fn accepts(&self, _item: ItemId) -> bool {
        true
    }
}

/// Visual parent, falling back to the logical parent.
pub fn parent_of<T: VisualTree + ?Sized>(tree: &T, node: T::Node) -> Option<T::Node> {
    tree.parent(node).or_else(|| tree.logical_parent(node))
}

/// Iterator over the strict ancestors of a node, innermost first.
#[derive(Debug)]
pub struct Ancestors<'a, T: VisualTree + ?Sized> {
    tree: &'a T,
    next: Option<T::Node>,
}

impl<T: VisualTree + ?Sized> Iterator for Ancestors<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = parent_of(self.tree, cur);
        Some(cur)
    }
}

/// Strict ancestors of `node`, innermost first.
pub fn ancestors<T: VisualTree + ?Sized>(tree: &T, node: T::Node) -> Ancestors<'_, T> {
    Ancestors {
        tree,
        next: parent_of(tree, node),
    }
}

/// `node` followed by its ancestors, innermost first.
pub fn self_and_ancestors<T: VisualTree + ?Sized>(tree: &T, node: T::Node) -> Ancestors<'_, T> {
    Ancestors {
        tree,
        next: Some(node),
    }
}

/// Returns true if `ancestor` is a strict ancestor of `node`.
pub fn is_descendant_of<T: VisualTree + ?Sized>(tree: &T, node: T::Node, ancestor: T::Node) -> bool {
    ancestors(tree, node).any(|n| n == ancestor)
}

/// The items control that generated `container`, with the container's index
/// in that control's view.
///
/// Walks up from the container to the first items control whose generator
/// recognizes it.
pub fn item_owner<H: ItemsHost + ?Sized>(host: &H, container: H::Node) -> Option<(H::Node, usize)> {
    ancestors(host, container).find_map(|node| {
        host.items_kind(node)?;
        host.index_from_container(node, container)
            .map(|index| (node, index))
    })
}
