// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory DnD Scene: a Kurbo-native retained visual tree for drag-and-drop probing.
//!
//! The scene is the geometry half of a drag-and-drop stack. It answers the two
//! questions a drop-target engine asks of a toolkit's rendered tree:
//!
//! - which element is topmost under this point, within this control's subtree, and
//! - which elements does this line cross.
//!
//! It also exposes the parent/children structure needed to walk from a hit
//! element up to the item container or control that owns it.
//!
//! ## Not a layout engine
//!
//! This crate does not measure or arrange anything.
//! Upstream code computes positions and sizes and writes them here as local bounds,
//! transforms (scroll offsets are translations) and clips.
//! [`Scene::commit`] then derives world-space bounds and inherited flags.
//! Until the next commit, queries see the previous layout, which is exactly
//! the lag a drop-target engine has to tolerate from a real toolkit.
//!
//! ## API overview
//!
//! - [`Scene`]: container managing nodes and their committed world data.
//! - [`LocalNode`]: per-node local data (bounds, transform, optional clip, z, flags).
//! - [`NodeFlags`]: visibility and picking controls, inherited down the tree.
//! - [`NodeId`]: generational handle of a node.
//! - [`QueryFilter`]: restricts hit/line results (visible/pickable).
//!
//! ### Minimal usage
//!
//! ```
//! use understory_dnd_scene::{LocalNode, QueryFilter, Scene};
//! use kurbo::{Line, Point, Rect};
//!
//! let mut scene = Scene::new();
//! let list = scene.insert(None, LocalNode::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)));
//! let row0 = scene.insert(Some(list), LocalNode::with_bounds(Rect::new(0.0, 0.0, 100.0, 20.0)));
//! let row1 = scene.insert(Some(list), LocalNode::with_bounds(Rect::new(0.0, 24.0, 100.0, 44.0)));
//! scene.commit();
//!
//! // Directly over a row.
//! let hit = scene.hit_test_point(Some(list), Point::new(5.0, 30.0), QueryFilter::POINTER);
//! assert_eq!(hit, Some(row1));
//!
//! // In the gap between rows the hit falls through to the list itself,
//! // and a line along the stacking axis finds both rows.
//! let hit = scene.hit_test_point(Some(list), Point::new(5.0, 22.0), QueryFilter::POINTER);
//! assert_eq!(hit, Some(list));
//! let crossed = scene.intersect_line(
//!     Some(list),
//!     Line::new(Point::new(5.0, 0.0), Point::new(5.0, 100.0)),
//!     QueryFilter::POINTER,
//! );
//! assert!(crossed.contains(&row0) && crossed.contains(&row1));
//! ```

mod scene;
mod types;

pub use scene::{QueryFilter, Scene};
pub use types::{LocalNode, NodeFlags, NodeId};
