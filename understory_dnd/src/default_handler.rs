// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The default accept/insert policy.
//!
//! ## Drag
//!
//! [`DefaultDragHandler`] drags the source items: one item as
//! [`Payload::Item`], several as [`Payload::Items`], and permits copy and move.
//!
//! ## Drop
//!
//! [`DefaultDropHandler`] accepts a drop when [`can_accept_data`] passes,
//! chooses copy or move with [`should_copy_data`], and inserts at the
//! snapshot's insertion index:
//!
//! - moves within one observable list reorder in place, so selection and
//!   scroll anchors survive;
//! - other moves remove from the source first and shift the insertion index
//!   down for every removed item that sat before it;
//! - copies insert clones when the host can clone the item.

use crate::config::DragDropConfig;
use crate::drag_info::DragInfo;
use crate::drop_info::DropInfo;
use crate::handler::{DragSource, DropTarget};
use crate::host::{ItemsHost, is_descendant_of};
use crate::types::{DragDropEffects, DropAdornerKind, ElementKind, InsertPosition, ItemId, KeyStates, Payload};

/// Drags the source items with copy and move allowed.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultDragHandler;

impl<H: ItemsHost + ?Sized> DragSource<H> for DefaultDragHandler {
    fn start_drag(&mut self, _host: &H, info: &mut DragInfo<H::Node>) {
        info.payload = match info.source_items.as_slice() {
            [] => None,
            [item] => Some(Payload::Item(*item)),
            items => Some(Payload::Items(items.to_vec())),
        };
        info.allowed_effects = if info.payload.is_some() {
            DragDropEffects::COPY | DragDropEffects::MOVE
        } else {
            DragDropEffects::empty()
        };
    }
}

/// Inserts dragged items into the target collection.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultDropHandler {
    /// Select the inserted items in the target control after a drop.
    pub select_dropped_items: bool,
}

impl DefaultDropHandler {
    /// A handler following the coordinator-wide configuration.
    pub fn from_config(config: &DragDropConfig) -> Self {
        Self {
            select_dropped_items: config.select_dropped_items,
        }
    }
}

/// Whether the default policy accepts the drop described by `info`.
///
/// Rejects when
/// - there is no in-process drag, or the drag contexts differ,
/// - a tree item is dropped onto its own center,
/// - there is no target collection,
/// - source and target are the same collection but it is not list-backed,
/// - the target collection refuses one of the dragged items, or
/// - the target item is the dragged container or one of its descendants.
pub fn can_accept_data<H: ItemsHost + ?Sized>(host: &H, info: &DropInfo<'_, H::Node>) -> bool {
    let Some(drag) = info.drag else {
        return false;
    };
    if !info.same_context {
        return false;
    }
    let over_tree_center = info.insert_position.contains(InsertPosition::TARGET_ITEM_CENTER)
        && info
            .hovered_container
            .is_some_and(|c| host.element_kind(c) == ElementKind::TreeViewItem);
    if over_tree_center && info.hovered_container == drag.source_container {
        return false;
    }
    let Some(target) = info.target_collection else {
        return false;
    };
    let Some(list) = host.collection(target) else {
        return false;
    };
    if drag.source_collection == Some(target) {
        return list.is_list();
    }
    let Some(payload) = drag.payload.as_ref() else {
        return false;
    };
    let items = payload.items();
    if items.is_empty() || !items.iter().all(|item| list.accepts(*item)) {
        return false;
    }
    !creates_cycle(host, info, drag)
}

/// Dropping a container onto itself or anything below it.
fn creates_cycle<H: ItemsHost + ?Sized>(host: &H, info: &DropInfo<'_, H::Node>, drag: &DragInfo<H::Node>) -> bool {
    let (Some(target), Some(source)) = (info.hovered_container, drag.source_container) else {
        return false;
    };
    target == source || is_descendant_of(host, target, source)
}

/// Whether the drop copies rather than moves.
///
/// Copies when the drag's copy key state is held (a copy key state that names
/// the left button copies unconditionally), except for sources whose items
/// are headered containers such as tabs.
pub fn should_copy_data<H: ItemsHost + ?Sized>(host: &H, info: &DropInfo<'_, H::Node>) -> bool {
    let Some(drag) = info.drag else {
        return false;
    };
    let copy_key = drag.copy_key_state;
    let copy = (!copy_key.is_empty() && info.key_states.contains(copy_key))
        || copy_key.contains(KeyStates::LEFT_BUTTON);
    copy && host
        .items_kind(drag.source_control)
        .is_none_or(|kind| kind.allows_copy())
}

impl<H: ItemsHost + ?Sized> DropTarget<H> for DefaultDropHandler {
    fn drag_over(&mut self, host: &H, info: &mut DropInfo<'_, H::Node>) {
        if !can_accept_data(host, info) {
            return;
        }
        info.effects = if should_copy_data(host, info) {
            DragDropEffects::COPY
        } else {
            DragDropEffects::MOVE
        };
        info.adorner = if info.into_children {
            DropAdornerKind::Highlight
        } else {
            DropAdornerKind::Insert
        };
    }

    fn drop(&mut self, host: &mut H, info: &DropInfo<'_, H::Node>) {
        let Some(drag) = info.drag else {
            return;
        };
        let Some(target) = info.target_collection else {
            return;
        };
        let Some(payload) = drag.payload.as_ref() else {
            return;
        };
        let data = payload.items().to_vec();
        let mut insert_index = info.unfiltered_insert_index(&*host);
        let copy = should_copy_data(&*host, info);

        let mut same_observable = false;
        if !copy
            && let Some(source) = drag.source_collection
        {
            same_observable = source == target
                && host
                    .collection(source)
                    .is_some_and(|list| list.supports_move());
            if !same_observable
                && let Some(list) = host.collection_mut(source)
            {
                for item in &data {
                    if let Some(index) = list.index_of(*item) {
                        list.remove(index);
                        if source == target && index < insert_index {
                            insert_index -= 1;
                        }
                    }
                }
            }
        }

        let clone = info.effects.intersects(DragDropEffects::COPY | DragDropEffects::LINK);
        let mut inserted = Vec::with_capacity(data.len());
        for item in data {
            let item = if clone {
                host.clone_item(item).unwrap_or(item)
            } else {
                item
            };
            inserted.push(item);
            let Some(list) = host.collection_mut(target) else {
                return;
            };
            if !clone && same_observable {
                if let Some(index) = list.index_of(item) {
                    if insert_index > index {
                        insert_index -= 1;
                    }
                    list.move_item(index, insert_index);
                    insert_index += 1;
                }
            } else {
                list.insert(insert_index, item);
                insert_index += 1;
            }
        }

        if self.select_dropped_items {
            select_dropped(host, info, &inserted);
        }
    }
}

fn select_dropped<H: ItemsHost + ?Sized>(host: &mut H, info: &DropInfo<'_, H::Node>, items: &[ItemId]) {
    let Some(control) = info.target_control else {
        return;
    };
    if host.can_select_multiple(control) {
        host.select_items(control, items);
    } else if let Some(first) = items.first() {
        host.select_items(control, core::slice::from_ref(first));
    }
}
