// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drag snapshot captured when a press becomes a drag candidate.

use kurbo::{Point, Size};

use crate::host::{ItemsHost, item_owner};
use crate::orientation;
use crate::probe::{ContainerKindCache, find_item_container_at};
use crate::types::{
    CollectionId, DragDropEffects, FlowDirection, ItemId, KeyStates, MouseButton, Orientation,
    Payload,
};

/// Everything known about the drag source, from press to transport return.
///
/// Built at press time; the source handler fills in [`payload`](Self::payload)
/// and [`allowed_effects`](Self::allowed_effects) from
/// [`DragSource::start_drag`](crate::handler::DragSource::start_drag).
#[derive(Clone, Debug)]
pub struct DragInfo<N> {
    /// The registered drag source control.
    pub source_control: N,
    /// Item container under the press, if any.
    pub source_container: Option<N>,
    /// Bound item of `source_container`.
    pub source_item: Option<ItemId>,
    /// Collection `source_item` lives in.
    pub source_collection: Option<CollectionId>,
    /// Position of `source_item` in `source_collection`; `None` when it cannot
    /// be resolved.
    pub source_index: Option<usize>,
    /// Items the drag carries by default: the selection at press time, or the
    /// pressed item when the selection is stale. Empty when nothing is selected.
    pub source_items: Vec<ItemId>,
    /// World-space press position; drag thresholds are measured from here.
    pub pointer_down_position: Point,
    /// Press position relative to the source container.
    pub position_within_item: Point,
    /// Rendered size of the source container.
    pub item_size: Size,
    /// Button that started the press.
    pub button: MouseButton,
    /// Stacking axis of the source control.
    pub orientation: Orientation,
    /// Flow direction of the source control.
    pub flow_direction: FlowDirection,
    /// Data carried by the drag, set by the source handler.
    pub payload: Option<Payload>,
    /// Operations the source permits, set by the source handler.
    pub allowed_effects: DragDropEffects,
    /// Modifier state that turns a move into a copy.
    pub copy_key_state: KeyStates,
    /// Drag context of the source; targets with a different non-empty context
    /// refuse the drop.
    pub context: Option<String>,
}

impl<N: Copy + Ord + core::fmt::Debug> DragInfo<N> {
    /// Capture the snapshot for a press at `point` on `source_control`.
    pub fn capture<H>(
        host: &H,
        cache: &mut ContainerKindCache<N>,
        source_control: N,
        point: Point,
        button: MouseButton,
        orientation_override: Option<Orientation>,
    ) -> Self
    where
        H: ItemsHost<Node = N> + ?Sized,
    {
        let (orientation, flow_direction) = orientation::resolve(host, source_control, orientation_override);
        let mut info = Self {
            source_control,
            source_container: None,
            source_item: None,
            source_collection: None,
            source_index: None,
            source_items: Vec::new(),
            pointer_down_position: point,
            position_within_item: Point::ZERO,
            item_size: Size::ZERO,
            button,
            orientation,
            flow_direction,
            payload: None,
            allowed_effects: DragDropEffects::empty(),
            copy_key_state: KeyStates::CONTROL,
            context: None,
        };

        if let Some(container) = find_item_container_at(host, cache, source_control, point) {
            info.source_container = Some(container);
            if let Some(rect) = host.bounds(container) {
                info.position_within_item = (point - rect.origin()).to_point();
                info.item_size = rect.size();
            }
            if let Some((owner, index)) = item_owner(host, container) {
                info.source_item = host.item_at(owner, index);
                info.source_collection = host.items_source(owner);
            }
        }
        info.source_index = info.source_item.zip(info.source_collection).and_then(|(item, id)| {
            host.collection(id)?.index_of(item)
        });

        let selected = host.selected_items(source_control);
        info.source_items = match info.source_item {
            Some(item) if !selected.contains(&item) => {
                log::trace!("selection of {source_control:?} lags the press; dragging {item:?}");
                vec![item]
            }
            _ => selected,
        };
        info
    }

    /// Whether the source handler provided enough to start a transport.
    pub fn is_ready(&self) -> bool {
        self.payload.is_some() && !self.allowed_effects.is_empty()
    }
}
