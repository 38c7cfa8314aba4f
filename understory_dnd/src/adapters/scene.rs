// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory items host over Understory DnD Scene.
//!
//! ## Feature
//!
//! Enable with `scene_adapter` (on by default).
//!
//! ## Notes
//!
//! [`SceneHost`] pairs a [`Scene`] with the item-control bookkeeping a toolkit
//! would normally own: which nodes are items controls, which collection each
//! is bound to, which realized container shows which item, selection, groups
//! and scroll state. It is small enough to build by hand in tests and demos,
//! and it lags exactly like a real toolkit: geometry changes are only visible
//! to queries after [`SceneHost::commit`].
//!
//! Bounds passed to the builder methods are in the parent's space, which is
//! world space as long as no transforms are set on the scene.

use std::collections::BTreeMap;

use kurbo::{Line, Point, Rect, Vec2};
use understory_dnd_scene::{LocalNode, NodeFlags, NodeId, QueryFilter, Scene};

use crate::autoscroll::ScrollInfo;
use crate::host::{ItemList, ItemsHost, VisualTree};
use crate::types::{
    CollectionId, ElementKind, FlowDirection, GroupKey, ItemId, ItemsKind, PanelInfo,
    PlaceholderPosition, TabPlacement,
};

/// Pixels scrolled per line by [`SceneHost::scroll_by_lines`].
pub const SCROLL_LINE: f64 = 16.0;

/// A `Vec`-backed bound collection.
#[derive(Clone, Debug, Default)]
pub struct VecList {
    items: Vec<ItemId>,
    observable: bool,
    list_backed: bool,
    rejected: Vec<ItemId>,
    moves: usize,
}

impl VecList {
    /// A list-backed collection; `observable` lists reorder in place.
    pub fn new(items: Vec<ItemId>, observable: bool) -> Self {
        Self {
            items,
            observable,
            list_backed: true,
            rejected: Vec::new(),
            moves: 0,
        }
    }

    /// Current contents.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Number of in-place moves performed so far.
    pub fn moves(&self) -> usize {
        self.moves
    }
}

impl ItemList for VecList {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).copied()
    }

    fn index_of(&self, item: ItemId) -> Option<usize> {
        self.items.iter().position(|i| *i == item)
    }

    fn insert(&mut self, index: usize, item: ItemId) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    fn remove(&mut self, index: usize) -> Option<ItemId> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    fn is_list(&self) -> bool {
        self.list_backed
    }

    fn supports_move(&self) -> bool {
        self.observable
    }

    fn move_item(&mut self, from: usize, to: usize) {
        if from >= self.items.len() {
            return;
        }
        let item = self.items.remove(from);
        self.items.insert(to.min(self.items.len()), item);
        self.moves += 1;
    }

    fn accepts(&self, item: ItemId) -> bool {
        !self.rejected.contains(&item)
    }
}

#[derive(Clone, Debug)]
struct ItemsControl {
    kind: ItemsKind,
    source: Option<CollectionId>,
    /// Filtered or sorted projection; `None` shows the source as is.
    view: Option<Vec<ItemId>>,
    containers: BTreeMap<ItemId, NodeId>,
    selection: Vec<ItemId>,
    multi_select: bool,
    placeholder: PlaceholderPosition,
    tab_placement: Option<TabPlacement>,
    scroll: Option<ScrollInfo>,
}

impl ItemsControl {
    fn new(kind: ItemsKind) -> Self {
        Self {
            kind,
            source: None,
            view: None,
            containers: BTreeMap::new(),
            selection: Vec::new(),
            multi_select: false,
            placeholder: PlaceholderPosition::None,
            tab_placement: None,
            scroll: None,
        }
    }
}

/// An [`ItemsHost`] backed by a [`Scene`].
#[derive(Debug, Default)]
pub struct SceneHost {
    scene: Scene,
    kinds: BTreeMap<NodeId, ElementKind>,
    flows: BTreeMap<NodeId, FlowDirection>,
    logical_parents: BTreeMap<NodeId, NodeId>,
    panels: BTreeMap<NodeId, PanelInfo>,
    controls: BTreeMap<NodeId, ItemsControl>,
    headers: BTreeMap<NodeId, NodeId>,
    group_elements: BTreeMap<NodeId, GroupKey>,
    item_groups: BTreeMap<ItemId, GroupKey>,
    collections: Vec<VecList>,
    cloneable: Vec<ItemId>,
    next_clone: u64,
    scroll_log: Vec<(NodeId, i32, i32)>,
}

impl SceneHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self {
            next_clone: 1 << 32,
            ..Self::default()
        }
    }

    /// The underlying scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the underlying scene, e.g. to move or hide nodes.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Recompute world bounds; returns the number of nodes that moved.
    pub fn commit(&mut self) -> usize {
        self.scene.commit()
    }

    /// Add a plain element.
    pub fn add_element(&mut self, parent: NodeId, bounds: Rect, kind: ElementKind) -> NodeId {
        let node = self.scene.insert(Some(parent), LocalNode::with_bounds(bounds));
        if kind != ElementKind::Visual {
            self.kinds.insert(node, kind);
        }
        node
    }

    /// Add an items control; `parent` is `None` for a root.
    pub fn add_items_control(&mut self, parent: Option<NodeId>, bounds: Rect, kind: ItemsKind) -> NodeId {
        let node = self.scene.insert(parent, LocalNode::with_bounds(bounds));
        self.controls.insert(node, ItemsControl::new(kind));
        node
    }

    /// Add the items panel of `control`.
    pub fn add_panel(&mut self, control: NodeId, bounds: Rect, info: PanelInfo) -> NodeId {
        let panel = self.add_element(control, bounds, ElementKind::ItemsPanel);
        self.panels.insert(panel, info);
        panel
    }

    /// Realize a container for `item` under `parent` (usually the panel).
    ///
    /// The container's element kind follows the control's kind; generic
    /// controls get `ElementKind::Custom(0)`.
    pub fn add_container(&mut self, control: NodeId, parent: NodeId, bounds: Rect, item: ItemId) -> NodeId {
        let kind = self
            .controls
            .get(&control)
            .and_then(|c| c.kind.container_kind())
            .unwrap_or(ElementKind::Custom(0));
        let container = self.add_element(parent, bounds, kind);
        if let Some(c) = self.controls.get_mut(&control) {
            c.containers.insert(item, container);
        }
        container
    }

    /// Realize a tree node: a container that is also an items control for its
    /// own children. Bind its child collection with [`SceneHost::bind`].
    pub fn add_tree_item(&mut self, control: NodeId, parent: NodeId, bounds: Rect, item: ItemId) -> NodeId {
        let container = self.add_container(control, parent, bounds, item);
        self.controls.insert(container, ItemsControl::new(ItemsKind::TreeView));
        container
    }

    /// Give `container` a header element; its bounds drive the insertion split.
    pub fn add_header(&mut self, container: NodeId, bounds: Rect) -> NodeId {
        let header = self.add_element(container, bounds, ElementKind::Visual);
        self.headers.insert(container, header);
        header
    }

    /// Add a group container element for `group`.
    pub fn add_group(&mut self, parent: NodeId, bounds: Rect, group: GroupKey) -> NodeId {
        let node = self.add_element(parent, bounds, ElementKind::GroupItem);
        self.group_elements.insert(node, group);
        node
    }

    /// Drop the generator mapping of `item` but leave its node in the tree,
    /// like a container that outlived its item.
    pub fn forget_container(&mut self, control: NodeId, item: ItemId) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.containers.remove(&item);
        }
    }

    /// Virtualize the container of `item` away.
    pub fn remove_container(&mut self, control: NodeId, item: ItemId) {
        let node = self
            .controls
            .get_mut(&control)
            .and_then(|c| c.containers.remove(&item));
        if let Some(node) = node {
            self.scene.remove(node);
        }
    }

    /// Set the element kind of an existing node.
    pub fn set_element_kind(&mut self, node: NodeId, kind: ElementKind) {
        self.kinds.insert(node, kind);
    }

    /// Set a flow direction inherited by `node`'s subtree.
    pub fn set_flow_direction(&mut self, node: NodeId, flow: FlowDirection) {
        self.flows.insert(node, flow);
    }

    /// Give a detached node a logical parent.
    pub fn set_logical_parent(&mut self, node: NodeId, parent: NodeId) {
        self.logical_parents.insert(node, parent);
    }

    /// Show or hide a node.
    pub fn set_visible(&mut self, node: NodeId, visible: bool) {
        let mut flags = NodeFlags::default();
        flags.set(NodeFlags::VISIBLE, visible);
        self.scene.set_flags(node, flags);
    }

    /// Create a collection.
    pub fn new_collection(&mut self, items: Vec<ItemId>, observable: bool) -> CollectionId {
        self.collections.push(VecList::new(items, observable));
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Collection ids use 32-bit indices."
        )]
        CollectionId((self.collections.len() - 1) as u32)
    }

    /// Mark a collection as a plain enumerable that cannot be edited by index.
    pub fn set_list_backed(&mut self, id: CollectionId, list_backed: bool) {
        if let Some(list) = self.collections.get_mut(id.0 as usize) {
            list.list_backed = list_backed;
        }
    }

    /// Make a collection refuse `item` as incompatible.
    pub fn reject_item(&mut self, id: CollectionId, item: ItemId) {
        if let Some(list) = self.collections.get_mut(id.0 as usize) {
            list.rejected.push(item);
        }
    }

    /// Contents of a collection; empty for unknown ids.
    pub fn collection_items(&self, id: CollectionId) -> &[ItemId] {
        self.collections.get(id.0 as usize).map_or(&[], VecList::items)
    }

    /// The `VecList` behind `id`.
    pub fn list(&self, id: CollectionId) -> Option<&VecList> {
        self.collections.get(id.0 as usize)
    }

    /// Bind `control` to a collection.
    pub fn bind(&mut self, control: NodeId, source: CollectionId) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.source = Some(source);
        }
    }

    /// Show a filtered or sorted projection of the bound collection.
    pub fn set_view(&mut self, control: NodeId, view: Option<Vec<ItemId>>) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.view = view;
        }
    }

    /// Replace the reported selection.
    pub fn set_selection(&mut self, control: NodeId, items: Vec<ItemId>) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.selection = items;
        }
    }

    /// Allow multiple selection.
    pub fn set_multi_select(&mut self, control: NodeId, multi: bool) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.multi_select = multi;
        }
    }

    /// Assign `item` to a bottom-level group.
    pub fn set_item_group(&mut self, item: ItemId, group: GroupKey) {
        self.item_groups.insert(item, group);
    }

    /// Set the new-item placeholder row.
    pub fn set_placeholder(&mut self, control: NodeId, placeholder: PlaceholderPosition) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.placeholder = placeholder;
        }
    }

    /// Set the tab strip placement of a tab control.
    pub fn set_tab_placement(&mut self, control: NodeId, placement: TabPlacement) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.tab_placement = Some(placement);
        }
    }

    /// Give `control` a scroll viewer.
    pub fn set_scroll_info(&mut self, control: NodeId, info: ScrollInfo) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.scroll = Some(info);
        }
    }

    /// Every line scroll requested so far, in order.
    pub fn scroll_log(&self) -> &[(NodeId, i32, i32)] {
        &self.scroll_log
    }

    /// Allow `item` to be cloned by copy drops.
    pub fn mark_cloneable(&mut self, item: ItemId) {
        self.cloneable.push(item);
    }

    fn control(&self, node: NodeId) -> Option<&ItemsControl> {
        self.controls.get(&node)
    }

    fn view(&self, control: &ItemsControl) -> Vec<ItemId> {
        match (&control.view, control.source) {
            (Some(view), _) => view.clone(),
            (None, Some(source)) => self.collection_items(source).to_vec(),
            (None, None) => Vec::new(),
        }
    }
}

impl VisualTree for SceneHost {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.scene.parent(node)
    }

    fn logical_parent(&self, node: NodeId) -> Option<NodeId> {
        self.logical_parents.get(&node).copied()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.scene.children(node).to_vec()
    }

    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.scene.world_bounds(node)
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.scene
            .effective_flags(node)
            .is_some_and(|f| f.contains(NodeFlags::VISIBLE))
    }

    fn hit_test(&self, root: NodeId, point: Point) -> Option<NodeId> {
        self.scene.hit_test_point(Some(root), point, QueryFilter::POINTER)
    }

    fn hit_test_line(&self, root: NodeId, line: Line) -> Vec<NodeId> {
        let filter = QueryFilter {
            visible_only: true,
            pickable_only: false,
        };
        self.scene.intersect_line(Some(root), line, filter)
    }

    fn element_kind(&self, node: NodeId) -> ElementKind {
        self.kinds.get(&node).copied().unwrap_or_default()
    }

    fn flow_direction(&self, node: NodeId) -> FlowDirection {
        self.scene
            .path_to_root(node)
            .into_iter()
            .rev()
            .find_map(|n| self.flows.get(&n).copied())
            .unwrap_or_default()
    }
}

impl ItemsHost for SceneHost {
    fn items_kind(&self, node: NodeId) -> Option<ItemsKind> {
        self.control(node).map(|c| c.kind)
    }

    fn panel_info(&self, panel: NodeId) -> Option<PanelInfo> {
        self.panels.get(&panel).copied()
    }

    fn tab_placement(&self, control: NodeId) -> Option<TabPlacement> {
        self.control(control)?.tab_placement
    }

    fn item_count(&self, control: NodeId) -> usize {
        self.control(control).map_or(0, |c| self.view(c).len())
    }

    fn item_at(&self, control: NodeId, index: usize) -> Option<ItemId> {
        self.view(self.control(control)?).get(index).copied()
    }

    fn index_from_container(&self, control: NodeId, container: NodeId) -> Option<usize> {
        if !self.scene.is_alive(container) {
            return None;
        }
        let c = self.control(control)?;
        let item = c
            .containers
            .iter()
            .find_map(|(item, node)| (*node == container).then_some(*item))?;
        self.view(c).iter().position(|i| *i == item)
    }

    fn container_from_index(&self, control: NodeId, index: usize) -> Option<NodeId> {
        let c = self.control(control)?;
        let item = self.view(c).get(index).copied()?;
        c.containers
            .get(&item)
            .copied()
            .filter(|n| self.scene.is_alive(*n))
    }

    fn items_source(&self, control: NodeId) -> Option<CollectionId> {
        self.control(control)?.source
    }

    fn collection(&self, id: CollectionId) -> Option<&dyn ItemList> {
        self.collections
            .get(id.0 as usize)
            .map(|l| l as &dyn ItemList)
    }

    fn collection_mut(&mut self, id: CollectionId) -> Option<&mut dyn ItemList> {
        self.collections
            .get_mut(id.0 as usize)
            .map(|l| l as &mut dyn ItemList)
    }

    fn selected_items(&self, control: NodeId) -> Vec<ItemId> {
        self.control(control)
            .map(|c| c.selection.clone())
            .unwrap_or_default()
    }

    fn can_select_multiple(&self, control: NodeId) -> bool {
        self.control(control).is_some_and(|c| c.multi_select)
    }

    fn select_items(&mut self, control: NodeId, items: &[ItemId]) {
        if let Some(c) = self.controls.get_mut(&control) {
            c.selection = items.to_vec();
        }
    }

    fn group_of_element(&self, node: NodeId) -> Option<GroupKey> {
        self.group_elements.get(&node).copied()
    }

    fn group_of_index(&self, control: NodeId, index: usize) -> Option<GroupKey> {
        let item = self.item_at(control, index)?;
        self.item_groups.get(&item).copied()
    }

    fn placeholder(&self, control: NodeId) -> PlaceholderPosition {
        self.control(control)
            .map(|c| c.placeholder)
            .unwrap_or_default()
    }

    fn header_bounds(&self, container: NodeId) -> Option<Rect> {
        let header = self.headers.get(&container)?;
        self.scene.world_bounds(*header)
    }

    fn clone_item(&mut self, item: ItemId) -> Option<ItemId> {
        if !self.cloneable.contains(&item) {
            return None;
        }
        let clone = ItemId(self.next_clone);
        self.next_clone += 1;
        self.cloneable.push(clone);
        Some(clone)
    }

    fn scroll_info(&self, control: NodeId) -> Option<ScrollInfo> {
        self.control(control)?.scroll
    }

    fn scroll_by_lines(&mut self, control: NodeId, dx: i32, dy: i32) {
        self.scroll_log.push((control, dx, dy));
        if let Some(info) = self.controls.get_mut(&control).and_then(|c| c.scroll.as_mut()) {
            let max = Vec2::new(
                (info.extent.width - info.viewport.width()).max(0.0),
                (info.extent.height - info.viewport.height()).max(0.0),
            );
            let next = info.offset + Vec2::new(f64::from(dx), f64::from(dy)) * SCROLL_LINE;
            info.offset = Vec2::new(next.x.clamp(0.0, max.x), next.y.clamp(0.0, max.y));
        }
    }
}
