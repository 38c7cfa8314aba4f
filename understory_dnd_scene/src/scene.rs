// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: structure, layout commit, queries.

use kurbo::{Affine, Line, Point, Rect};

use crate::types::{LocalNode, NodeFlags, NodeId};

/// Filters applied during hit testing and line intersection.
///
/// Used by [`Scene::hit_test_point`] and [`Scene::intersect_line`].
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryFilter {
    /// If true, only consider nodes that are effectively [`NodeFlags::VISIBLE`].
    pub visible_only: bool,
    /// If true, only consider nodes that are effectively [`NodeFlags::PICKABLE`].
    pub pickable_only: bool,
}

impl QueryFilter {
    /// Visible and pickable nodes only; what pointer input sees.
    pub const POINTER: Self = Self {
        visible_only: true,
        pickable_only: true,
    };
}

#[derive(Clone, Debug, Default)]
struct WorldNode {
    bounds: Rect, // AABB of transformed (and clipped) local bounds
    flags: NodeFlags,
    depth: u32,
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalNode,
    world: WorldNode,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            world: WorldNode::default(),
        }
    }
}

/// Retained visual tree.
///
/// Geometry edits are recorded immediately but world-space data only changes
/// on [`Scene::commit`], the same way a toolkit's layout pass lags behind the
/// property changes that invalidate it. Queries always see the last committed
/// layout.
#[derive(Default)]
pub struct Scene {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new node as the last child of `parent` (or as a root if `None`).
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent.filter(|p| self.is_alive(*p)) {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove a node (and its subtree) from the scene.
    ///
    /// Removing a stale id is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink_parent(id, parent);
        }
        let children = self.node(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            self.remove(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Reparent `id` under `new_parent` (or detach it as a root).
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        if !self.is_alive(id) || new_parent.is_some_and(|p| p == id || self.is_ancestor(id, p)) {
            return;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent.filter(|p| self.is_alive(*p)) {
            self.link_parent(id, p);
        }
    }

    /// Update local bounds.
    pub fn set_local_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(n) = self.node_mut(id) {
            n.local.local_bounds = bounds;
        }
    }

    /// Update local transform.
    pub fn set_local_transform(&mut self, id: NodeId, tf: Affine) {
        if let Some(n) = self.node_mut(id) {
            n.local.local_transform = tf;
        }
    }

    /// Update local clip.
    pub fn set_local_clip(&mut self, id: NodeId, clip: Option<Rect>) {
        if let Some(n) = self.node_mut(id) {
            n.local.local_clip = clip;
        }
    }

    /// Update z index.
    pub fn set_z_index(&mut self, id: NodeId, z: i32) {
        if let Some(n) = self.node_mut(id) {
            n.local.z_index = z;
        }
    }

    /// Update node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_mut(id) {
            n.local.flags = flags;
        }
    }

    /// Recompute world-space data for every root.
    ///
    /// Returns the number of nodes whose world bounds changed.
    pub fn commit(&mut self) -> usize {
        let roots: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                Some(n) if n.parent.is_none() => {
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "NodeId uses 32-bit indices by design."
                    )]
                    Some(NodeId::new(i as u32, n.generation))
                }
                _ => None,
            })
            .collect();

        let mut changed = 0;
        for root in roots {
            self.update_world_recursive(
                root,
                Affine::IDENTITY,
                None,
                NodeFlags::all(),
                0,
                &mut changed,
            );
        }
        changed
    }

    /// Hit test a world-space point within the subtree rooted at `root`
    /// (the whole scene when `None`). Returns the topmost node.
    ///
    /// Higher `z_index` wins, then the deeper node, then the newer [`NodeId`].
    pub fn hit_test_point(
        &self,
        root: Option<NodeId>,
        pt: Point,
        filter: QueryFilter,
    ) -> Option<NodeId> {
        let mut best: Option<(NodeId, i32, u32)> = None;
        for (id, node) in self.live_nodes() {
            if !Self::passes(node, filter) || !node.world.bounds.contains(pt) {
                continue;
            }
            if root.is_some_and(|r| r != id && !self.is_ancestor(r, id)) {
                continue;
            }
            let (z, depth) = (node.local.z_index, node.world.depth);
            let better = match best {
                None => true,
                Some((best_id, best_z, best_depth)) => {
                    z > best_z
                        || (z == best_z && depth > best_depth)
                        || (z == best_z && depth == best_depth && id.is_newer_than(best_id))
                }
            };
            if better {
                best = Some((id, z, depth));
            }
        }
        best.map(|(id, ..)| id)
    }

    /// Nodes within `root`'s subtree (the whole scene when `None`) whose world
    /// bounds the segment touches, in slot order.
    pub fn intersect_line(&self, root: Option<NodeId>, line: Line, filter: QueryFilter) -> Vec<NodeId> {
        self.live_nodes()
            .filter(|(id, node)| {
                Self::passes(node, filter)
                    && root.is_none_or(|r| r == *id || self.is_ancestor(r, *id))
                    && segment_touches_rect(line, node.world.bounds)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Parent of a live node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of a live node in insertion order; empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Committed world-space bounds of a live node.
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        self.node(id).map(|n| n.world.bounds)
    }

    /// Committed, inherited flags of a live node.
    pub fn effective_flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node(id).map(|n| n.world.flags)
    }

    /// Returns the z-index of a node if the identifier is live.
    pub fn z_index(&self, id: NodeId) -> Option<i32> {
        self.node(id).map(|n| n.local.z_index)
    }

    /// Returns true if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = self.parent(node);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Path from the root to `id` (inclusive); empty for stale ids.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = Some(id).filter(|id| self.is_alive(*id));
        while let Some(n) = cur {
            out.push(n);
            cur = self.parent(n);
        }
        out.reverse();
        out
    }

    // --- internals ---

    fn live_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, slot)| {
            let node = slot.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            Some((NodeId::new(i as u32, node.generation), node))
        })
    }

    fn passes(node: &Node, filter: QueryFilter) -> bool {
        !(filter.visible_only && !node.world.flags.contains(NodeFlags::VISIBLE)
            || filter.pickable_only && !node.world.flags.contains(NodeFlags::PICKABLE))
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        (n.generation == id.1).then_some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = Some(parent);
        }
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    fn update_world_recursive(
        &mut self,
        id: NodeId,
        parent_tf: Affine,
        parent_clip: Option<Rect>,
        parent_flags: NodeFlags,
        depth: u32,
        changed: &mut usize,
    ) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let old = node.world.bounds;
        let transform = parent_tf * node.local.local_transform;
        let own_clip = node
            .local
            .local_clip
            .map(|c| transform_rect_bbox(transform, c));
        let clip = match (own_clip, parent_clip) {
            (Some(a), Some(b)) => Some(a.intersect(b)),
            (a, b) => a.or(b),
        };
        let mut bounds = transform_rect_bbox(transform, node.local.local_bounds);
        if let Some(c) = clip {
            bounds = bounds.intersect(c);
        }
        node.world = WorldNode {
            bounds,
            flags: parent_flags & node.local.flags,
            depth,
        };
        if old != bounds {
            *changed += 1;
        }
        let flags = node.world.flags;
        let children = node.children.clone();
        for child in children {
            self.update_world_recursive(child, transform, clip, flags, depth + 1, changed);
        }
    }
}

/// Axis-aligned bounding box of a transformed rectangle.
fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let corners = [
        affine * Point::new(rect.x0, rect.y0),
        affine * Point::new(rect.x1, rect.y0),
        affine * Point::new(rect.x0, rect.y1),
        affine * Point::new(rect.x1, rect.y1),
    ];
    let first = Rect::from_points(corners[0], corners[0]);
    corners[1..]
        .iter()
        .fold(first, |acc, p| acc.union_pt(*p))
}

/// Liang-Barsky test of a segment against a closed rectangle.
fn segment_touches_rect(line: Line, rect: Rect) -> bool {
    let d = line.p1 - line.p0;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let checks = [
        (-d.x, line.p0.x - rect.x0),
        (d.x, rect.x1 - line.p0.x),
        (-d.y, line.p0.y - rect.y0),
        (d.y, rect.y1 - line.p0.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }
    t0 <= t1
}
