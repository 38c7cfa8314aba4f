// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two callback surfaces applications implement.
//!
//! A control attached as a drag source consults a [`DragSource`]; a control
//! attached as a drop target consults a [`DropTarget`]. Controls attached
//! without a handler use [`DefaultDragHandler`](crate::default_handler::DefaultDragHandler)
//! and [`DefaultDropHandler`](crate::default_handler::DefaultDropHandler).

use crate::drag_info::DragInfo;
use crate::drop_info::DropInfo;
use crate::error::TransportError;
use crate::host::ItemsHost;
use crate::types::DragDropEffects;

/// Drag source callbacks.
pub trait DragSource<H: ItemsHost + ?Sized> {
    /// Gate evaluated at press time. Returning false ignores the press.
    fn can_start_drag(&self, _host: &H, _info: &DragInfo<H::Node>) -> bool {
        true
    }

    /// Fill in [`DragInfo::payload`] and [`DragInfo::allowed_effects`].
    ///
    /// Leaving either unset aborts the drag before the transport starts.
    fn start_drag(&mut self, host: &H, info: &mut DragInfo<H::Node>);

    /// A drop target accepted the data.
    fn dropped(&mut self, _host: &mut H, _info: &DropInfo<'_, H::Node>) {}

    /// The transport finished without an effect (cancelled or refused).
    fn drag_cancelled(&mut self) {}

    /// The transport returned an effect set, possibly empty.
    fn drag_drop_operation_finished(&mut self, _effects: DragDropEffects, _info: &DragInfo<H::Node>) {}

    /// The transport failed. Return true to swallow the error.
    ///
    /// Neither [`drag_cancelled`](Self::drag_cancelled) nor
    /// [`drag_drop_operation_finished`](Self::drag_drop_operation_finished)
    /// runs after a transport failure.
    fn try_catch_occurred_exception(&mut self, _error: &TransportError) -> bool {
        false
    }
}

/// Drop target callbacks.
pub trait DropTarget<H: ItemsHost + ?Sized> {
    /// The pointer entered the target. Defaults to [`DropTarget::drag_over`].
    fn drag_enter(&mut self, host: &H, info: &mut DropInfo<'_, H::Node>) {
        self.drag_over(host, info);
    }

    /// The pointer moved over the target. Set [`DropInfo::effects`] (and
    /// usually [`DropInfo::adorner`]) to permit a drop.
    fn drag_over(&mut self, host: &H, info: &mut DropInfo<'_, H::Node>);

    /// The pointer left the target.
    fn drag_leave(&mut self, _host: &H, _info: &DropInfo<'_, H::Node>) {}

    /// Perform the drop.
    fn drop(&mut self, host: &mut H, info: &DropInfo<'_, H::Node>);
}
