// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry probe: find the item container under, or nearest to, a point.
//!
//! ## Container kinds
//!
//! Known control kinds name their container kind outright
//! ([`ItemsKind::container_kind`]). Generic controls are probed structurally:
//! locate the items panel, take its first realized child, and confirm the
//! generator indexes it. The result is cached per control in a
//! [`ContainerKindCache`], so the probe runs once per control rather than once
//! per tick.
//!
//! ## Exact and near matches
//!
//! [`find_item_container_at`] hit tests the control's subtree and walks up to
//! the first element that is one of the control's item containers.
//! [`find_item_container_near`] is the fallback for padding, gaps and the space
//! after the last item: it casts a line through the point across the control
//! along the stacking axis, collects every container the line crosses, and
//! picks the closest one. A pointer in the side padding misses every row on
//! that line, so a second line is then cast across the stacking axis.
//!
//! Both are pure queries against the current layout.

use std::collections::BTreeMap;

use kurbo::{Line, Point, Rect};

use crate::host::{ItemsHost, is_descendant_of, item_owner, self_and_ancestors};
use crate::types::{ElementKind, Orientation};

/// Per-control cache of resolved item-container kinds.
#[derive(Clone, Debug)]
pub struct ContainerKindCache<N> {
    kinds: BTreeMap<N, ElementKind>,
}

impl<N> Default for ContainerKindCache<N> {
    fn default() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }
}

impl<N: Copy + Ord + core::fmt::Debug> ContainerKindCache<N> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the resolved kind of one control, e.g. after a template change.
    pub fn forget(&mut self, control: N) {
        self.kinds.remove(&control);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.kinds.clear();
    }

    /// The container kind of `control`, resolving and caching it on first use.
    ///
    /// Returns `None` when `control` is not an items control, or is generic
    /// and has no realized container to inspect yet; nothing is cached then.
    pub fn resolve<H>(&mut self, host: &H, control: N) -> Option<ElementKind>
    where
        H: ItemsHost<Node = N> + ?Sized,
    {
        if let Some(kind) = self.kinds.get(&control) {
            return Some(*kind);
        }
        let kind = host
            .items_kind(control)?
            .container_kind()
            .or_else(|| probe_container_kind(host, control))?;
        self.kinds.insert(control, kind);
        Some(kind)
    }
}

/// Inspect the first realized child of the items panel.
fn probe_container_kind<H: ItemsHost + ?Sized>(host: &H, control: H::Node) -> Option<ElementKind> {
    let panel = host.items_panel(control)?;
    let first = host.children(panel).into_iter().next()?;
    if host.index_from_container(control, first).is_none() {
        log::debug!("first child {first:?} of {control:?}'s panel is not an item container");
        return None;
    }
    Some(host.element_kind(first))
}

/// Whether `node` is an item container of `control` (or, for hierarchical
/// controls, of one of its nested nodes).
fn is_container_of<H: ItemsHost + ?Sized>(
    host: &H,
    control: H::Node,
    kind: ElementKind,
    node: H::Node,
) -> bool {
    if host.element_kind(node) != kind {
        return false;
    }
    let Some((owner, _)) = item_owner(host, node) else {
        return false;
    };
    owner == control
        || host.items_kind(control).is_some_and(|k| k.is_hierarchical())
            && is_descendant_of(host, owner, control)
}

/// The item container directly under `point`, if any.
pub fn find_item_container_at<H: ItemsHost + ?Sized>(
    host: &H,
    cache: &mut ContainerKindCache<H::Node>,
    control: H::Node,
    point: Point,
) -> Option<H::Node> {
    let kind = cache.resolve(host, control)?;
    let hit = host.hit_test(control, point)?;
    self_and_ancestors(host, hit)
        .take_while(|n| *n != control)
        .find(|n| is_container_of(host, control, kind, *n))
}

/// The item container nearest to `point` along the stacking axis.
///
/// Distance is measured to the nearer edge along `orientation` (zero when the
/// point is inside the container); ties go to the container whose leading
/// edge is closer. Hierarchical controls, whose rows sit at different
/// indents, use the 2D distance to the container instead.
///
/// When the line along the stacking axis crosses no container, as in the side
/// padding of a list whose rows are narrower than the control, a second line
/// is cast across the stacking axis through the point.
pub fn find_item_container_near<H: ItemsHost + ?Sized>(
    host: &H,
    cache: &mut ContainerKindCache<H::Node>,
    control: H::Node,
    point: Point,
    orientation: Orientation,
) -> Option<H::Node> {
    let kind = cache.resolve(host, control)?;
    let area = host.bounds(control)?;
    let along_x = Line::new((area.x0, point.y), (area.x1, point.y));
    let along_y = Line::new((point.x, area.y0), (point.x, area.y1));
    let (stacking, cross) = match orientation {
        Orientation::Vertical => (along_y, along_x),
        Orientation::Horizontal => (along_x, along_y),
    };
    let hierarchical = host.items_kind(control).is_some_and(|k| k.is_hierarchical());

    nearest_on_line(host, control, kind, stacking, point, orientation, hierarchical).or_else(|| {
        log::debug!("no container along the stacking axis of {control:?}; trying the cross axis");
        nearest_on_line(host, control, kind, cross, point, orientation, hierarchical)
    })
}

fn nearest_on_line<H: ItemsHost + ?Sized>(
    host: &H,
    control: H::Node,
    kind: ElementKind,
    line: Line,
    point: Point,
    orientation: Orientation,
    hierarchical: bool,
) -> Option<H::Node> {
    let mut best: Option<(H::Node, f64, f64)> = None;
    for node in host.hit_test_line(control, line) {
        if !is_container_of(host, control, kind, node) {
            continue;
        }
        let Some(rect) = host.bounds(node).filter(|r| r.area() > 0.0) else {
            continue;
        };
        let (mut distance, leading) = axis_distance(point, rect, orientation);
        if hierarchical {
            distance = distance_2d(point, rect);
        }
        let better = match best {
            None => true,
            Some((_, d, l)) => distance < d || (distance == d && leading < l),
        };
        if better {
            best = Some((node, distance, leading));
        }
    }
    best.map(|(node, ..)| node)
}

/// Distance to the rect along the orientation axis, and distance to its leading edge.
fn axis_distance(point: Point, rect: Rect, orientation: Orientation) -> (f64, f64) {
    let (p, lo, hi) = match orientation {
        Orientation::Vertical => (point.y, rect.y0, rect.y1),
        Orientation::Horizontal => (point.x, rect.x0, rect.x1),
    };
    let distance = if p < lo {
        lo - p
    } else if p > hi {
        p - hi
    } else {
        0.0
    };
    (distance, (p - lo).abs())
}

fn distance_2d(point: Point, rect: Rect) -> f64 {
    let dx = (rect.x0 - point.x).max(0.0).max(point.x - rect.x1);
    let dy = (rect.y0 - point.y).max(0.0).max(point.y - rect.y1);
    dx.hypot(dy)
}
