// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The native drag transport seam.
//!
//! A platform runs a drag as one blocking call: it takes the source element,
//! the payload and the allowed effects, pumps its own event loop, and reports
//! pointer activity back through a [`DragEventSink`] until the user drops or
//! cancels. [`DragTransport::do_drag_drop`] returns the effect the drop target
//! settled on, or an empty set when the drag was cancelled or refused.

use kurbo::{Point, Rect};

use crate::error::TransportError;
use crate::types::{DragDropEffects, DropAdornerKind, InsertPosition, KeyStates, MouseButton, Payload};

/// What the transport should do after a key-state change.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DragAction {
    /// Keep dragging.
    Continue,
    /// Drop at the current position.
    Drop,
    /// Abort without dropping.
    Cancel,
}

/// The drop adorner to draw, as decided on the last drag tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AdornerState<N> {
    /// Drop target the adorner belongs to.
    pub target: N,
    /// What to draw.
    pub kind: DropAdornerKind,
    /// Hovered item container, for highlight adorners.
    pub container: Option<N>,
    /// Insertion index, for insertion-line adorners.
    pub insert_index: usize,
    /// Which side of `container` the line goes.
    pub insert_position: InsertPosition,
}

/// Callbacks a transport invokes while its drag loop runs.
pub trait DragEventSink<N> {
    /// The pointer is over `element` (the topmost element under it), or over
    /// nothing the application owns. Returns the effects the target allows.
    fn drag_over(&mut self, element: Option<N>, point: Point, key_states: KeyStates) -> DragDropEffects;

    /// The pointer left the application.
    fn drag_leave(&mut self);

    /// The user dropped over `element`. Returns the performed effects.
    fn drop(&mut self, element: N, point: Point, key_states: KeyStates) -> DragDropEffects;

    /// Key or button state changed.
    fn query_continue(&mut self, escape_pressed: bool, key_states: KeyStates) -> DragAction;

    /// Adorner to draw over the current target, if any.
    fn adorner(&self) -> Option<AdornerState<N>> {
        None
    }

    /// Where the drag preview goes, if one is being tracked.
    fn preview_bounds(&self) -> Option<Rect> {
        None
    }
}

/// A platform drag transport.
pub trait DragTransport<N> {
    /// Run a drag to completion.
    fn do_drag_drop(
        &mut self,
        source: N,
        payload: &Payload,
        allowed_effects: DragDropEffects,
        sink: &mut dyn DragEventSink<N>,
    ) -> Result<DragDropEffects, TransportError>;
}

/// Decide whether a drag started with `button` continues.
///
/// Escape cancels, as does holding both the primary and secondary buttons.
/// Releasing the initiating button drops.
pub fn query_continue(escape_pressed: bool, key_states: KeyStates, button: MouseButton) -> DragAction {
    if escape_pressed || key_states.contains(KeyStates::LEFT_BUTTON | KeyStates::RIGHT_BUTTON) {
        DragAction::Cancel
    } else if !key_states.contains(button.key_state()) {
        DragAction::Drop
    } else {
        DragAction::Continue
    }
}
