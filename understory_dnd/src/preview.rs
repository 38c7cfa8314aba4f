// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag preview placement and the pointer poll that drives it.
//!
//! Native drag-over callbacks arrive only when the pointer moves over a
//! window that accepts drops, which is too sparse to keep a floating preview
//! glued to the pointer. A [`PointerPoll`] samples the pointer on its own
//! cadence (a timer, an OS hook, a fake clock in tests) and the preview's
//! bounds are recomputed on every sample.
//!
//! A poll must never outlive its drag. [`PollGuard`] stops it when dropped,
//! so every exit path of the transport call tears it down.

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Point, Rect, Size};

/// Platform pointer sampling.
pub trait PointerPoll {
    /// Begin calling `callback` with world-space pointer positions.
    fn start(&mut self, callback: Box<dyn FnMut(Point)>);

    /// Stop sampling and drop the callback.
    fn stop(&mut self);
}

/// Where to draw a preview of the dragged item.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragPreview {
    /// Pointer position on the preview, normalized to `item_size`.
    pub anchor: Point,
    /// Size of the dragged item.
    pub item_size: Size,
}

impl DragPreview {
    /// Create a preview anchored at `anchor` (normalized) on an item of `item_size`.
    pub const fn new(anchor: Point, item_size: Size) -> Self {
        Self { anchor, item_size }
    }

    /// Bounds of the preview for a pointer at `pointer`.
    pub fn bounds_at(&self, pointer: Point) -> Rect {
        let offset = kurbo::Vec2::new(
            self.anchor.x * self.item_size.width,
            self.anchor.y * self.item_size.height,
        );
        Rect::from_origin_size(pointer - offset, self.item_size)
    }
}

/// Latest preview bounds, shared between the poll callback and readers.
pub type PreviewSlot = Rc<Cell<Option<Rect>>>;

/// Keeps a [`PointerPoll`] running for the lifetime of the guard.
pub struct PollGuard<'a, P: PointerPoll + ?Sized> {
    poll: &'a mut P,
    slot: PreviewSlot,
}

impl<'a, P: PointerPoll + ?Sized> PollGuard<'a, P> {
    /// Start `poll`, writing preview bounds into `slot` on every sample.
    pub fn start(poll: &'a mut P, preview: DragPreview, slot: PreviewSlot) -> Self {
        let sink = Rc::clone(&slot);
        poll.start(Box::new(move |pointer| {
            sink.set(Some(preview.bounds_at(pointer)));
        }));
        Self { poll, slot }
    }
}

impl<P: PointerPoll + ?Sized> Drop for PollGuard<'_, P> {
    fn drop(&mut self) {
        self.poll.stop();
        self.slot.set(None);
    }
}

impl<P: PointerPoll + ?Sized> core::fmt::Debug for PollGuard<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PollGuard").field("slot", &self.slot.get()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakePoll {
        callback: Option<Box<dyn FnMut(Point)>>,
        stops: usize,
    }

    impl FakePoll {
        fn tick(&mut self, p: Point) {
            if let Some(cb) = self.callback.as_mut() {
                cb(p);
            }
        }
    }

    impl PointerPoll for FakePoll {
        fn start(&mut self, callback: Box<dyn FnMut(Point)>) {
            self.callback = Some(callback);
        }

        fn stop(&mut self) {
            self.callback = None;
            self.stops += 1;
        }
    }

    #[test]
    fn anchor_places_preview() {
        let preview = DragPreview::new(Point::new(0.0, 1.0), Size::new(100.0, 20.0));
        assert_eq!(preview.bounds_at(Point::new(50.0, 50.0)), Rect::new(50.0, 30.0, 150.0, 50.0));
        let centered = DragPreview::new(Point::new(0.5, 0.5), Size::new(100.0, 20.0));
        assert_eq!(centered.bounds_at(Point::new(50.0, 50.0)), Rect::new(0.0, 40.0, 100.0, 60.0));
    }

    #[test]
    fn guard_tracks_then_stops() {
        let mut poll = FakePoll::default();
        let slot = PreviewSlot::default();
        let preview = DragPreview::new(Point::ZERO, Size::new(10.0, 10.0));

        let mut guard = PollGuard::start(&mut poll, preview, Rc::clone(&slot));
        guard.poll.tick(Point::new(5.0, 5.0));
        assert_eq!(slot.get(), Some(Rect::new(5.0, 5.0, 15.0, 15.0)));
        drop(guard);

        assert_eq!(slot.get(), None);
        assert_eq!(poll.stops, 1);
        assert!(poll.callback.is_none());
    }
}
