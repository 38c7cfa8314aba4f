// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drop snapshots, rebuilt from scratch on every drag callback.
//!
//! ## Overview
//!
//! [`DropInfoBuilder::build`] is the single entry point producing a
//! [`DropInfo`] for one tick. It
//!
//! 1. walks up from the element under the pointer to the nearest registered
//!    drop target,
//! 2. resolves the target's orientation and flow direction,
//! 3. finds the hovered item container (exact hit, else nearest),
//! 4. computes the insertion point, anchors it to the hovered group and
//!    nudges it off a new-item placeholder, and
//! 5. records whether the drag and the target share a drag context.
//!
//! Nothing is carried over between ticks apart from the container-kind cache:
//! containers come and go with virtualization and live collection changes, so
//! every tick recomputes from the current tree. Anything that cannot be
//! resolved degrades to a neutral snapshot (no target, append index, no
//! effects).

use kurbo::Point;

use crate::drag_info::DragInfo;
use crate::host::{ItemsHost, item_owner, self_and_ancestors};
use crate::insertion::{self, HoveredItem, Insertion};
use crate::orientation;
use crate::probe::{ContainerKindCache, find_item_container_at, find_item_container_near};
use crate::types::{
    CollectionId, DragDropEffects, DropAdornerKind, DropEventKind, FlowDirection, GroupKey,
    InsertPosition, ItemId, KeyStates, Orientation,
};

/// Per-target settings the builder needs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetOptions<'a> {
    /// Drag context of the target.
    pub context: Option<&'a str>,
    /// Forced stacking axis.
    pub orientation: Option<Orientation>,
    /// Whether center drops re-parent into the hovered item; defaults to true
    /// for hierarchical controls only.
    pub accepts_child_items: Option<bool>,
}

/// Registry of drop targets consulted by the ancestor walk.
pub trait DropTargetLookup<N> {
    /// Settings of `node` if it is a registered drop target.
    fn target_options(&self, node: N) -> Option<TargetOptions<'_>>;
}

impl<N: Ord> DropTargetLookup<N> for std::collections::BTreeMap<N, TargetOptions<'_>> {
    fn target_options(&self, node: N) -> Option<TargetOptions<'_>> {
        self.get(&node).copied()
    }
}

/// What a drop would do, for one tick.
#[derive(Clone, Debug)]
pub struct DropInfo<'a, N> {
    /// The active drag, when the drag originated in this process.
    pub drag: Option<&'a DragInfo<N>>,
    /// Registered drop target the pointer is over.
    pub target_control: Option<N>,
    /// Item container under or nearest to the pointer.
    pub hovered_container: Option<N>,
    /// Bound item of `hovered_container`.
    pub target_item: Option<ItemId>,
    /// The pointer is inside the hovered container's rendered bounds, as
    /// opposed to a nearest match across a gap.
    pub directly_over_item: bool,
    /// Collection a drop inserts into.
    pub target_collection: Option<CollectionId>,
    /// Group the pointer is over in a grouped view.
    pub target_group: Option<GroupKey>,
    /// Insertion index into the view of `target_collection`.
    pub insert_index: usize,
    /// Before/After/Center classification.
    pub insert_position: InsertPosition,
    /// The hovered item accepts center drops as children.
    pub accepts_child_item: bool,
    /// `target_collection` is the hovered item's own child collection.
    pub into_children: bool,
    /// Stacking axis of the target.
    pub orientation: Orientation,
    /// Flow direction of the target.
    pub flow_direction: FlowDirection,
    /// Pointer position relative to the target control.
    pub drop_position: Point,
    /// Buttons and modifiers held.
    pub key_states: KeyStates,
    /// Effects the target permits; set by the drop handler.
    pub effects: DragDropEffects,
    /// Label of the destination for effect feedback.
    pub destination_text: Option<String>,
    /// Label of the effect for effect feedback.
    pub effect_text: Option<String>,
    /// Adorner the drop handler wants drawn.
    pub adorner: DropAdornerKind,
    /// False when drag and target declare different non-empty contexts.
    pub same_context: bool,
    /// The callback this snapshot was built for.
    pub event: DropEventKind,
    /// Items control whose view `insert_index` indexes.
    item_parent: Option<N>,
}

impl<'a, N: Copy + Ord + core::fmt::Debug> DropInfo<'a, N> {
    /// A snapshot with no target: append, no effects.
    pub fn neutral(
        drag: Option<&'a DragInfo<N>>,
        point: Point,
        key_states: KeyStates,
        event: DropEventKind,
    ) -> Self {
        Self {
            drag,
            target_control: None,
            hovered_container: None,
            target_item: None,
            directly_over_item: false,
            target_collection: None,
            target_group: None,
            insert_index: 0,
            insert_position: InsertPosition::empty(),
            accepts_child_item: false,
            into_children: false,
            orientation: Orientation::Vertical,
            flow_direction: FlowDirection::LeftToRight,
            drop_position: point,
            key_states,
            effects: DragDropEffects::empty(),
            destination_text: None,
            effect_text: None,
            adorner: DropAdornerKind::None,
            same_context: true,
            event,
            item_parent: None,
        }
    }

    /// The items control whose view [`insert_index`](Self::insert_index) indexes.
    pub fn item_parent(&self) -> Option<N> {
        self.item_parent
    }

    /// [`insert_index`](Self::insert_index) translated into the index space of
    /// the unfiltered source collection.
    ///
    /// When the control shows a filtered projection, the item currently at
    /// `insert_index` in the view is located in the source list; inserting
    /// past the last visible item lands after the last visible item's source
    /// position. Only meaningful at drop time: filters can change between ticks.
    pub fn unfiltered_insert_index<H>(&self, host: &H) -> usize
    where
        H: ItemsHost<Node = N> + ?Sized,
    {
        let index = self.insert_index;
        let Some(parent) = self.item_parent else {
            return index;
        };
        let Some(source) = self.target_collection.and_then(|id| host.collection(id)) else {
            return index;
        };
        let visible = host.item_count(parent);
        if visible == source.len() {
            return index;
        }
        let anchor = if index < visible {
            host.item_at(parent, index).and_then(|item| source.index_of(item))
        } else if visible > 0 && index == visible {
            host.item_at(parent, index - 1)
                .and_then(|item| source.index_of(item))
                .map(|i| i + 1)
        } else {
            None
        };
        anchor.unwrap_or(index)
    }
}

/// Produces a [`DropInfo`] per tick.
#[derive(Debug)]
pub struct DropInfoBuilder<N> {
    cache: ContainerKindCache<N>,
}

impl<N> Default for DropInfoBuilder<N> {
    fn default() -> Self {
        Self {
            cache: ContainerKindCache::default(),
        }
    }
}

impl<N: Copy + Ord + core::fmt::Debug> DropInfoBuilder<N> {
    /// Create a builder with an empty container-kind cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The container-kind cache, e.g. to forget a control after a template change.
    pub fn cache_mut(&mut self) -> &mut ContainerKindCache<N> {
        &mut self.cache
    }

    /// Build the snapshot for the pointer at `point` over `element`.
    pub fn build<'a, H, T>(
        &mut self,
        host: &H,
        targets: &T,
        drag: Option<&'a DragInfo<N>>,
        element: N,
        point: Point,
        key_states: KeyStates,
        event: DropEventKind,
    ) -> DropInfo<'a, N>
    where
        H: ItemsHost<Node = N> + ?Sized,
        T: DropTargetLookup<N> + ?Sized,
    {
        let mut info = DropInfo::neutral(drag, point, key_states, event);
        let Some((target, options)) =
            self_and_ancestors(host, element).find_map(|n| Some((n, targets.target_options(n)?)))
        else {
            log::debug!("no drop target above {element:?}");
            return info;
        };
        info.target_control = Some(target);
        info.same_context = contexts_match(drag.and_then(|d| d.context.as_deref()), options.context);
        if let Some(bounds) = host.bounds(target) {
            info.drop_position = (point - bounds.origin()).to_point();
        }
        let (orientation, flow) = orientation::resolve(host, target, options.orientation);
        info.orientation = orientation;
        info.flow_direction = flow;

        let Some(kind) = host.items_kind(target) else {
            return info;
        };
        let hierarchical = kind.is_hierarchical();

        let exact = find_item_container_at(host, &mut self.cache, target, point);
        let container = exact.or_else(|| find_item_container_near(host, &mut self.cache, target, point, orientation));
        let owner = container.and_then(|c| item_owner(host, c).map(|(owner, index)| (c, owner, index)));

        let (parent, insertion) = match owner {
            Some((container, owner, index)) => {
                info.hovered_container = Some(container);
                info.target_item = host.item_at(owner, index);
                info.directly_over_item = exact.is_some()
                    && host.is_visible(container)
                    && host.bounds(container).is_some_and(|r| r.contains(point));

                let split = host
                    .header_bounds(container)
                    .or_else(|| host.bounds(container))
                    .unwrap_or_default();
                info.accepts_child_item = options.accepts_child_items.unwrap_or(hierarchical)
                    && host.items_kind(container).is_some();
                let hovered = HoveredItem {
                    index,
                    extent: split.size(),
                    local: (point - split.origin()).to_point(),
                    accepts_children: info.accepts_child_item,
                    child_count: host.item_count(container),
                };
                let count = host.item_count(owner);
                let insertion = insertion::compute(Some(&hovered), count, orientation, flow);
                if insertion.into_children {
                    (container, insertion)
                } else {
                    (owner, insertion)
                }
            }
            None => {
                let count = host.item_count(target);
                (target, insertion::compute(None, count, orientation, flow))
            }
        };

        info.target_collection = host.items_source(parent);
        info.target_group = self_and_ancestors(host, element)
            .take_while(|n| *n != target)
            .find_map(|n| host.group_of_element(n));

        let count = host.item_count(parent);
        let Insertion {
            index,
            position,
            into_children,
        } = insertion::anchor_to_group(insertion, info.target_group, count, |i| {
            host.group_of_index(parent, i)
        });
        let index = insertion::skip_placeholder(index, host.placeholder(parent), count);

        info.insert_index = index.min(count);
        info.insert_position = position;
        info.into_children = into_children;
        info.item_parent = Some(parent);
        log::trace!(
            "drop info: target={target:?} container={:?} index={} position={:?}",
            info.hovered_container,
            info.insert_index,
            info.insert_position
        );
        info
    }
}

/// Contexts conflict only when both are set, non-empty and different.
pub fn contexts_match(source: Option<&str>, target: Option<&str>) -> bool {
    match (source, target) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => a == b,
        _ => true,
    }
}

#[cfg(all(test, feature = "scene_adapter"))]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::adapters::scene::SceneHost;
    use crate::types::{ItemsKind, MouseButton, PanelInfo, PanelKind, PlaceholderPosition};
    use kurbo::Rect;
    use understory_dnd_scene::NodeId;

    struct Fixture {
        host: SceneHost,
        list: NodeId,
        panel: NodeId,
        rows: Vec<NodeId>,
        targets: BTreeMap<NodeId, TargetOptions<'static>>,
    }

    /// Vertical list box with `count` rows of 20px, registered as a target.
    fn list(count: u64) -> Fixture {
        let mut host = SceneHost::new();
        let list = host.add_items_control(None, Rect::new(0.0, 0.0, 100.0, 200.0), ItemsKind::ListBox);
        let panel = host.add_panel(
            list,
            Rect::new(0.0, 0.0, 100.0, 200.0),
            PanelInfo::oriented(PanelKind::Stack, Orientation::Vertical),
        );
        let items: Vec<ItemId> = (0..count).map(ItemId).collect();
        let source = host.new_collection(items.clone(), true);
        host.bind(list, source);
        let rows = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let y = i as f64 * 20.0;
                host.add_container(list, panel, Rect::new(0.0, y, 100.0, y + 20.0), *item)
            })
            .collect();
        host.commit();
        let mut targets = BTreeMap::new();
        targets.insert(list, TargetOptions::default());
        Fixture {
            host,
            list,
            panel,
            rows,
            targets,
        }
    }

    fn build<'a>(f: &Fixture, drag: Option<&'a DragInfo<NodeId>>, element: NodeId, point: Point) -> DropInfo<'a, NodeId> {
        DropInfoBuilder::new().build(
            &f.host,
            &f.targets,
            drag,
            element,
            point,
            KeyStates::LEFT_BUTTON,
            DropEventKind::Over,
        )
    }

    #[test]
    fn pointer_over_rows() {
        let f = list(5);
        let info = build(&f, None, f.rows[1], Point::new(10.0, 25.0));
        assert_eq!(info.target_control, Some(f.list));
        assert_eq!(info.hovered_container, Some(f.rows[1]));
        assert_eq!(info.target_item, Some(ItemId(1)));
        assert!(info.directly_over_item);
        assert_eq!(info.insert_index, 1);
        assert_eq!(info.insert_position, InsertPosition::BEFORE_TARGET_ITEM);
        assert_eq!(info.item_parent(), Some(f.list));

        let info = build(&f, None, f.rows[1], Point::new(10.0, 35.0));
        assert_eq!(info.insert_index, 2);
        assert_eq!(info.insert_position, InsertPosition::AFTER_TARGET_ITEM);
    }

    #[test]
    fn empty_list_appends() {
        let f = list(0);
        let info = build(&f, None, f.panel, Point::new(50.0, 50.0));
        assert_eq!(info.target_control, Some(f.list));
        assert_eq!(info.hovered_container, None);
        assert_eq!(info.insert_index, 0);
        assert!(info.insert_position.is_empty());
    }

    #[test]
    fn below_last_row_uses_nearest() {
        let f = list(3);
        let info = build(&f, None, f.panel, Point::new(50.0, 150.0));
        assert_eq!(info.hovered_container, Some(f.rows[2]));
        assert!(!info.directly_over_item);
        assert_eq!(info.insert_index, 3);
        assert_eq!(info.insert_position, InsertPosition::AFTER_TARGET_ITEM);
    }

    #[test]
    fn no_registered_target_is_neutral() {
        let mut f = list(3);
        f.targets.clear();
        let info = build(&f, None, f.rows[0], Point::new(10.0, 5.0));
        assert_eq!(info.target_control, None);
        assert_eq!(info.insert_index, 0);
        assert!(info.effects.is_empty());
        assert_eq!(info.drop_position, Point::new(10.0, 5.0));
    }

    #[test]
    fn context_mismatch_is_recorded() {
        let mut f = list(2);
        f.targets.insert(
            f.list,
            TargetOptions {
                context: Some("files"),
                ..TargetOptions::default()
            },
        );
        let mut cache = ContainerKindCache::new();
        let mut drag = DragInfo::capture(&f.host, &mut cache, f.list, Point::new(5.0, 5.0), MouseButton::Left, None);
        drag.context = Some("mail".into());
        assert!(!build(&f, Some(&drag), f.rows[0], Point::new(5.0, 5.0)).same_context);
        drag.context = Some(String::new());
        assert!(build(&f, Some(&drag), f.rows[0], Point::new(5.0, 5.0)).same_context);
        drag.context = Some("files".into());
        assert!(build(&f, Some(&drag), f.rows[0], Point::new(5.0, 5.0)).same_context);
    }

    #[test]
    fn contexts() {
        assert!(contexts_match(None, Some("a")));
        assert!(contexts_match(Some(""), Some("a")));
        assert!(contexts_match(Some("a"), Some("a")));
        assert!(!contexts_match(Some("a"), Some("b")));
    }

    #[test]
    fn placeholder_row_is_skipped() {
        let mut f = list(3);
        f.host.set_placeholder(f.list, PlaceholderPosition::AtEnd);
        // Empty space below the last row (the placeholder) would append after it.
        let info = build(&f, None, f.panel, Point::new(50.0, 150.0));
        assert_eq!(info.insert_index, 2);
    }

    #[test]
    fn filtered_view_translates_index() {
        let mut f = list(5);
        // The view shows items 1 and 3 only; their rows are rows[1] and rows[3].
        f.host.set_view(f.list, Some(vec![ItemId(1), ItemId(3)]));
        f.host.scene_mut().set_local_bounds(f.rows[1], Rect::new(0.0, 0.0, 100.0, 20.0));
        f.host.scene_mut().set_local_bounds(f.rows[3], Rect::new(0.0, 20.0, 100.0, 40.0));
        f.host.remove_container(f.list, ItemId(0));
        f.host.remove_container(f.list, ItemId(2));
        f.host.remove_container(f.list, ItemId(4));
        f.host.commit();

        let info = build(&f, None, f.rows[3], Point::new(10.0, 25.0));
        assert_eq!(info.insert_index, 1);
        assert_eq!(info.unfiltered_insert_index(&f.host), 3);

        let info = build(&f, None, f.rows[3], Point::new(10.0, 35.0));
        assert_eq!(info.insert_index, 2);
        assert_eq!(info.unfiltered_insert_index(&f.host), 4);
    }

    #[test]
    fn tree_center_targets_children() {
        let mut host = SceneHost::new();
        let tree = host.add_items_control(None, Rect::new(0.0, 0.0, 200.0, 200.0), ItemsKind::TreeView);
        let panel = host.add_panel(
            tree,
            Rect::new(0.0, 0.0, 200.0, 200.0),
            PanelInfo::oriented(PanelKind::Stack, Orientation::Vertical),
        );
        let roots = host.new_collection(vec![ItemId(1), ItemId(2)], true);
        host.bind(tree, roots);
        let folder = host.add_tree_item(tree, panel, Rect::new(0.0, 0.0, 200.0, 60.0), ItemId(1));
        host.add_header(folder, Rect::new(0.0, 0.0, 200.0, 20.0));
        let children = host.new_collection(vec![ItemId(10), ItemId(11)], true);
        host.bind(folder, children);
        host.add_tree_item(tree, panel, Rect::new(0.0, 60.0, 200.0, 80.0), ItemId(2));
        host.commit();
        let mut targets = BTreeMap::new();
        targets.insert(tree, TargetOptions::default());

        let info = DropInfoBuilder::new().build(
            &host,
            &targets,
            None,
            folder,
            Point::new(50.0, 10.0),
            KeyStates::LEFT_BUTTON,
            DropEventKind::Over,
        );
        assert!(info.accepts_child_item);
        assert!(info.into_children);
        assert!(info.insert_position.contains(InsertPosition::TARGET_ITEM_CENTER));
        assert_eq!(info.target_collection, Some(children));
        assert_eq!(info.insert_index, 2);
        assert_eq!(info.item_parent(), Some(folder));

        // Opting out keeps center drops as siblings.
        targets.insert(
            tree,
            TargetOptions {
                accepts_child_items: Some(false),
                ..TargetOptions::default()
            },
        );
        let info = DropInfoBuilder::new().build(
            &host,
            &targets,
            None,
            folder,
            Point::new(50.0, 10.0),
            KeyStates::LEFT_BUTTON,
            DropEventKind::Over,
        );
        assert!(!info.into_children);
        assert_eq!(info.target_collection, Some(roots));
        assert_eq!(info.insert_index, 0);
    }

    #[test]
    fn grouped_view_stays_in_group() {
        let mut f = list(4);
        // Rows 0-1 are group A, rows 2-3 group B.
        for item in 0..4 {
            f.host.set_item_group(ItemId(item), GroupKey(if item < 2 { 1 } else { 2 }));
        }
        let group = f.host.add_group(f.panel, Rect::new(0.0, 0.0, 100.0, 40.0), GroupKey(1));
        f.host.commit();

        // The callback reports group A's element while the pointer is already
        // on the leading edge of row 2.
        let info = build(&f, None, group, Point::new(10.0, 41.0));
        assert_eq!(info.target_group, Some(GroupKey(1)));
        assert_eq!(info.insert_index, 2);
        assert_eq!(info.insert_position, InsertPosition::AFTER_TARGET_ITEM);
    }
}
