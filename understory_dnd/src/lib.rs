// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory DnD: drop-target resolution and insertion indices for item-bound controls.
//!
//! Understory DnD is the behavior layer between a toolkit's pointer input and
//! its lists, trees, tab strips and grids during drag and drop.
//!
//! - Resolves which item container a pointer is over, or nearest to across a gap.
//! - Computes orientation- and flow-aware insertion indices, including the
//!   center band that re-parents into hierarchical items.
//! - Drives the drag source state machine and the native transport, and
//!   dispatches enter/over/leave/drop to two small handler traits.
//! - Ships a default policy that moves, reorders and copies bound items.
//!
//! ## Where this fits
//!
//! The engine never touches a toolkit directly. It consumes collaborators
//! through traits:
//! - [`VisualTree`] and [`ItemsHost`]: structure, geometry, hit testing and
//!   item-container semantics (generator mapping, bound collection, selection).
//! - [`DragTransport`] and [`DragEventSink`]: the platform's blocking drag loop.
//! - [`PointerPoll`]: pointer sampling that keeps a drag preview placed.
//!
//! The `scene_adapter` feature (on by default) provides
//! [`SceneHost`](adapters::scene::SceneHost), an in-memory [`ItemsHost`] over
//! `understory_dnd_scene`, used by the tests and handy for experiments.
//!
//! ## API overview
//!
//! - [`DragDropCoordinator`]: owns attached behaviors and the drag in progress.
//! - [`DragSourceBehavior`] / [`DropTargetBehavior`]: per-control settings.
//! - [`DragSource`] / [`DropTarget`]: callbacks applications implement.
//! - [`DefaultDragHandler`] / [`DefaultDropHandler`]: the default policy.
//! - [`DragInfo`] / [`DropInfo`]: the drag snapshot and the per-tick drop snapshot.
//! - [`DropInfoBuilder`]: composes the probe, the orientation resolver and the
//!   insertion calculator into a [`DropInfo`].
//!
//! Lower-level building blocks are public too: [`probe`], [`orientation`],
//! [`insertion`], [`source`], [`tracker`], [`autoscroll`] and [`preview`].
//!
//! ## Minimal usage
//!
//! ```
//! # #[cfg(feature = "scene_adapter")] {
//! use std::collections::BTreeMap;
//!
//! use kurbo::{Point, Rect};
//! use understory_dnd::adapters::scene::SceneHost;
//! use understory_dnd::{
//!     DropEventKind, DropInfoBuilder, InsertPosition, ItemId, ItemsKind, KeyStates, Orientation,
//!     PanelInfo, PanelKind, TargetOptions,
//! };
//!
//! // A vertical list with five 20px rows.
//! let mut host = SceneHost::new();
//! let list = host.add_items_control(None, Rect::new(0.0, 0.0, 100.0, 100.0), ItemsKind::ListBox);
//! let panel = host.add_panel(
//!     list,
//!     Rect::new(0.0, 0.0, 100.0, 100.0),
//!     PanelInfo::oriented(PanelKind::Stack, Orientation::Vertical),
//! );
//! let items = host.new_collection((1..=5).map(ItemId).collect(), true);
//! host.bind(list, items);
//! for i in 0..5_u32 {
//!     let y = f64::from(i) * 20.0;
//!     host.add_container(list, panel, Rect::new(0.0, y, 100.0, y + 20.0), ItemId(u64::from(i) + 1));
//! }
//! host.commit();
//!
//! let targets = BTreeMap::from([(list, TargetOptions::default())]);
//! let mut builder = DropInfoBuilder::new();
//!
//! // Upper half of row 1 inserts before it.
//! let info = builder.build(&host, &targets, None, list, Point::new(10.0, 25.0), KeyStates::empty(), DropEventKind::Over);
//! assert_eq!(info.insert_index, 1);
//! assert_eq!(info.insert_position, InsertPosition::BEFORE_TARGET_ITEM);
//!
//! // Lower half inserts after it.
//! let info = builder.build(&host, &targets, None, list, Point::new(10.0, 35.0), KeyStates::empty(), DropEventKind::Over);
//! assert_eq!(info.insert_index, 2);
//! assert_eq!(info.insert_position, InsertPosition::AFTER_TARGET_ITEM);
//! # }
//! ```
//!
//! Everything runs synchronously on the caller's thread; per-drag state only
//! exists while [`DragDropCoordinator::pointer_move`] is inside the transport
//! call.

pub mod adapters;
pub mod autoscroll;
pub mod config;
pub mod coordinator;
pub mod default_handler;
pub mod drag_info;
pub mod drop_info;
pub mod error;
pub mod handler;
pub mod host;
pub mod insertion;
pub mod orientation;
pub mod preview;
pub mod probe;
pub mod source;
pub mod tracker;
pub mod transport;
pub mod types;

pub use autoscroll::{ScrollInfo, ScrollingMode};
pub use config::DragDropConfig;
pub use coordinator::{DragDropCoordinator, DragSourceBehavior, DropTargetBehavior};
pub use default_handler::{DefaultDragHandler, DefaultDropHandler};
pub use drag_info::DragInfo;
pub use drop_info::{DropInfo, DropInfoBuilder, DropTargetLookup, TargetOptions};
pub use error::{DragDropError, TransportError};
pub use handler::{DragSource, DropTarget};
pub use host::{ItemList, ItemsHost, VisualTree};
pub use preview::PointerPoll;
pub use transport::{AdornerState, DragAction, DragEventSink, DragTransport};
pub use types::{
    CollectionId, DragDropEffects, DropAdornerKind, DropEventKind, ElementKind, FlowDirection,
    GroupKey, InsertPosition, ItemId, ItemsKind, KeyStates, MouseButton, Orientation, PanelInfo,
    PanelKind, Payload, PlaceholderPosition, TabPlacement,
};
