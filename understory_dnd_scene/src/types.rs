// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, flags, and local geometry.

use kurbo::{Affine, Rect};

/// Handle to a visual element in the scene.
///
/// A `NodeId` pairs a slot with the generation the slot had when the element
/// was inserted. Removing an element frees its slot; the next insert that
/// reuses the slot bumps the generation, so handles to the removed element
/// never alias the new one. Fresh slots start at generation `1`.
///
/// Item containers come and go as a list virtualizes, so callers holding a
/// `NodeId` across ticks should check [`Scene::is_alive`](crate::Scene::is_alive)
/// before trusting it.
///
/// ### Ordering
///
/// `NodeId` is totally ordered by slot, then generation. The order carries no
/// meaning beyond letting ids key ordered maps.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns true if `self` was allocated after `other`.
    ///
    /// Higher generation wins; equal generations fall back to the slot index.
    pub const fn is_newer_than(self, other: Self) -> bool {
        self.1 > other.1 || (self.1 == other.1 && self.0 > other.0)
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility and picking.
    ///
    /// Both flags are inherited: a node is only effectively visible (or
    /// pickable) when every ancestor is too.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (rendered and considered by line queries).
        const VISIBLE  = 0b0000_0001;
        /// Node is pickable (participates in hit testing).
        const PICKABLE = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

/// Local geometry for a node.
#[derive(Clone, Debug)]
pub struct LocalNode {
    /// Local (untransformed) bounds.
    pub local_bounds: Rect,
    /// Local transform relative to parent space. Scroll offsets are usually
    /// expressed as a translation on the scrolled content node.
    pub local_transform: Affine,
    /// Optional clip in local space, applied to this node and its subtree.
    pub local_clip: Option<Rect>,
    /// Z-order. Higher is drawn on top.
    pub z_index: i32,
    /// Visibility and picking flags.
    pub flags: NodeFlags,
}

impl LocalNode {
    /// A visible, pickable node with the given bounds and no transform.
    pub fn with_bounds(local_bounds: Rect) -> Self {
        Self {
            local_bounds,
            ..Default::default()
        }
    }
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            local_bounds: Rect::ZERO,
            local_transform: Affine::IDENTITY,
            local_clip: None,
            z_index: 0,
            flags: NodeFlags::default(),
        }
    }
}
