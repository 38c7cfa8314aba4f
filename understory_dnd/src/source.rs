// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag source state machine: Idle, Pressed, Dragging.
//!
//! ## Transitions
//!
//! - **Idle → Pressed** on a single-click press of an allowed button inside a
//!   registered drag source, unless the press landed on an interactive
//!   sub-element (scroll bar, text input, toggle, combo box, column header) or
//!   an element marked as ignored, and the handler's `can_start_drag` agrees.
//! - **Pressed → Dragging** once the pointer travels past the per-axis
//!   threshold with the initiating button still held, and the handler's
//!   `start_drag` produced a payload and non-empty effects. Otherwise the
//!   machine falls back to Idle without starting a transport.
//! - **Dragging → Idle** when the caller reports the transport returned, by
//!   any outcome, through [`DragSourceMachine::finish`].
//!
//! ## Click suppression
//!
//! Pressing an item that is part of a multi-selection would normally collapse
//! the selection to that item, making multi-item drags impossible. The machine
//! reports such presses as suppressed; if the press never becomes a drag, the
//! deferred single selection is applied on release.

use kurbo::Point;

use crate::config::DragDropConfig;
use crate::drag_info::DragInfo;
use crate::host::{ItemsHost, self_and_ancestors};
use crate::probe::ContainerKindCache;
use crate::types::{ItemId, KeyStates, MouseButton, Orientation};

/// Per-source settings the machine needs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceOptions<'a> {
    /// Drag context of the source.
    pub context: Option<&'a str>,
    /// Forced stacking axis.
    pub orientation: Option<Orientation>,
}

/// Registry of drag sources consulted by the press ancestor walk.
pub trait DragSourceLookup<N> {
    /// Settings of `node` if it is a registered drag source.
    fn source_options(&self, node: N) -> Option<SourceOptions<'_>>;

    /// Whether presses on `node` must never start a drag.
    fn is_drag_ignored(&self, _node: N) -> bool {
        false
    }
}

/// A pointer press as the toolkit reports it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerPress<N> {
    /// Topmost element under the pointer.
    pub element: N,
    /// World-space position.
    pub point: Point,
    /// Pressed button.
    pub button: MouseButton,
    /// 1 for a single click, 2 for a double click, and so on.
    pub click_count: u32,
    /// Buttons and modifiers held, including `button`.
    pub key_states: KeyStates,
}

/// Current state of the machine.
#[derive(Clone, Debug)]
pub enum SourceState<N> {
    /// No press in progress.
    Idle,
    /// A press that may become a drag.
    Pressed(DragInfo<N>),
    /// A drag is running; the snapshot is owned by the caller.
    Dragging,
}

/// Outcome of a pointer move.
#[derive(Debug)]
pub enum MoveOutcome<N> {
    /// Nothing pressed, or the drag is already running.
    Idle,
    /// Still under the drag threshold.
    Pending,
    /// The initiating button was released, or the handler left the payload or
    /// effects unset.
    Aborted,
    /// Start the transport with this snapshot.
    Start(DragInfo<N>),
}

/// The drag source state machine.
#[derive(Debug)]
pub struct DragSourceMachine<N> {
    state: SourceState<N>,
    suppressed_click: Option<(N, ItemId)>,
    cache: ContainerKindCache<N>,
}

impl<N> Default for DragSourceMachine<N> {
    fn default() -> Self {
        Self {
            state: SourceState::Idle,
            suppressed_click: None,
            cache: ContainerKindCache::default(),
        }
    }
}

impl<N: Copy + Ord + core::fmt::Debug> DragSourceMachine<N> {
    /// Create an idle machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &SourceState<N> {
        &self.state
    }

    /// Returns true while a drag is running.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SourceState::Dragging)
    }

    /// Source control of the pending press.
    pub fn pressed_source(&self) -> Option<N> {
        match &self.state {
            SourceState::Pressed(info) => Some(info.source_control),
            _ => None,
        }
    }

    /// Selection change deferred by the last press, if any.
    pub fn suppressed_click(&self) -> Option<(N, ItemId)> {
        self.suppressed_click
    }

    /// Handle a press. Returns true when the machine entered Pressed.
    ///
    /// `can_start` is the source handler's gate, called with the source
    /// control and the captured snapshot.
    pub fn press<H, L>(
        &mut self,
        host: &H,
        sources: &L,
        config: &DragDropConfig,
        press: &PointerPress<N>,
        can_start: impl FnOnce(N, &DragInfo<N>) -> bool,
    ) -> bool
    where
        H: ItemsHost<Node = N> + ?Sized,
        L: DragSourceLookup<N> + ?Sized,
    {
        if self.is_dragging() {
            return false;
        }
        self.state = SourceState::Idle;
        self.suppressed_click = None;

        let allowed_button = match press.button {
            MouseButton::Left => true,
            MouseButton::Right => config.can_drag_with_right_button,
            MouseButton::Middle => false,
        };
        if press.click_count != 1 || !allowed_button {
            return false;
        }

        let mut source = None;
        for node in self_and_ancestors(host, press.element) {
            if sources.is_drag_ignored(node) || host.element_kind(node).excludes_drag() {
                log::debug!("press on {node:?} cannot start a drag");
                return false;
            }
            if let Some(options) = sources.source_options(node) {
                source = Some((node, options));
                break;
            }
        }
        let Some((control, options)) = source else {
            return false;
        };

        let mut info = DragInfo::capture(host, &mut self.cache, control, press.point, press.button, options.orientation);
        info.copy_key_state = config.copy_key_state;
        info.context = options.context.map(str::to_owned);

        let selected = host.selected_items(control);
        if config.drag_directly_selected_only
            && info.source_item.is_some_and(|item| !selected.contains(&item))
        {
            log::debug!("{:?} is not selected; ignoring press", info.source_item);
            return false;
        }
        if !can_start(control, &info) {
            return false;
        }

        let modified = press
            .key_states
            .intersects(KeyStates::SHIFT | KeyStates::CONTROL);
        if !modified
            && host.can_select_multiple(control)
            && selected.len() > 1
            && let Some(item) = info.source_item.filter(|item| selected.contains(item))
        {
            self.suppressed_click = Some((control, item));
        }
        self.state = SourceState::Pressed(info);
        true
    }

    /// Handle a pointer move.
    ///
    /// `start` is the source handler's `start_drag`, called once when the
    /// threshold is crossed.
    pub fn pointer_move(
        &mut self,
        point: Point,
        key_states: KeyStates,
        config: &DragDropConfig,
        start: impl FnOnce(&mut DragInfo<N>),
    ) -> MoveOutcome<N> {
        let SourceState::Pressed(info) = &self.state else {
            return MoveOutcome::Idle;
        };
        if !key_states.contains(info.button.key_state()) {
            self.state = SourceState::Idle;
            return MoveOutcome::Aborted;
        }
        let delta = point - info.pointer_down_position;
        if delta.x.abs() <= config.min_horizontal_drag_distance
            && delta.y.abs() <= config.min_vertical_drag_distance
        {
            return MoveOutcome::Pending;
        }

        let SourceState::Pressed(mut info) = core::mem::replace(&mut self.state, SourceState::Idle) else {
            return MoveOutcome::Idle;
        };
        start(&mut info);
        if !info.is_ready() {
            log::debug!("drag from {:?} aborted: no payload or effects", info.source_control);
            return MoveOutcome::Aborted;
        }
        self.suppressed_click = None;
        self.state = SourceState::Dragging;
        MoveOutcome::Start(info)
    }

    /// Handle a release. Applies a suppressed selection change when the press
    /// never became a drag; returns true if it did.
    pub fn release<H>(&mut self, host: &mut H) -> bool
    where
        H: ItemsHost<Node = N> + ?Sized,
    {
        if self.is_dragging() {
            return false;
        }
        self.state = SourceState::Idle;
        match self.suppressed_click.take() {
            Some((control, item)) => {
                host.select_items(control, &[item]);
                true
            }
            None => false,
        }
    }

    /// The transport returned; go back to Idle.
    pub fn finish(&mut self) {
        self.state = SourceState::Idle;
        self.suppressed_click = None;
    }
}

#[cfg(all(test, feature = "scene_adapter"))]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use kurbo::Rect;
    use understory_dnd_scene::NodeId;

    use super::*;
    use crate::adapters::scene::SceneHost;
    use crate::host::ItemsHost;
    use crate::types::{DragDropEffects, ElementKind, ItemsKind, PanelInfo, PanelKind, Payload};

    #[derive(Default)]
    struct Sources {
        options: BTreeMap<NodeId, SourceOptions<'static>>,
        ignored: BTreeSet<NodeId>,
    }

    impl DragSourceLookup<NodeId> for Sources {
        fn source_options(&self, node: NodeId) -> Option<SourceOptions<'_>> {
            self.options.get(&node).copied()
        }

        fn is_drag_ignored(&self, node: NodeId) -> bool {
            self.ignored.contains(&node)
        }
    }

    struct Fixture {
        host: SceneHost,
        list: NodeId,
        rows: Vec<NodeId>,
        sources: Sources,
    }

    fn fixture() -> Fixture {
        let mut host = SceneHost::new();
        let list = host.add_items_control(None, Rect::new(0.0, 0.0, 100.0, 100.0), ItemsKind::ListBox);
        let panel = host.add_panel(
            list,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            PanelInfo::oriented(PanelKind::Stack, Orientation::Vertical),
        );
        let source = host.new_collection(vec![ItemId(1), ItemId(2), ItemId(3)], true);
        host.bind(list, source);
        let rows = (0..3_u32)
            .map(|i| {
                let y = f64::from(i) * 20.0;
                host.add_container(list, panel, Rect::new(0.0, y, 100.0, y + 20.0), ItemId(u64::from(i) + 1))
            })
            .collect();
        host.commit();
        let mut sources = Sources::default();
        sources.options.insert(
            list,
            SourceOptions {
                context: Some("rows"),
                orientation: None,
            },
        );
        Fixture {
            host,
            list,
            rows,
            sources,
        }
    }

    fn press_at(element: NodeId, point: Point) -> PointerPress<NodeId> {
        PointerPress {
            element,
            point,
            button: MouseButton::Left,
            click_count: 1,
            key_states: KeyStates::LEFT_BUTTON,
        }
    }

    fn payload(info: &mut DragInfo<NodeId>) {
        info.payload = Some(Payload::Items(info.source_items.clone()));
        info.allowed_effects = DragDropEffects::MOVE;
    }

    #[test]
    fn press_move_start() {
        let f = fixture();
        let config = DragDropConfig::default();
        let mut m = DragSourceMachine::new();
        assert!(m.press(&f.host, &f.sources, &config, &press_at(f.rows[0], Point::new(10.0, 10.0)), |_, _| true));
        assert_eq!(m.pressed_source(), Some(f.list));

        let held = KeyStates::LEFT_BUTTON;
        assert!(matches!(m.pointer_move(Point::new(13.0, 13.0), held, &config, payload), MoveOutcome::Pending));
        match m.pointer_move(Point::new(10.0, 15.0), held, &config, payload) {
            MoveOutcome::Start(info) => {
                assert_eq!(info.source_item, Some(ItemId(1)));
                assert_eq!(info.context.as_deref(), Some("rows"));
                assert_eq!(info.copy_key_state, KeyStates::CONTROL);
            }
            other => panic!("expected a drag start, got {other:?}"),
        }
        assert!(m.is_dragging());
        m.finish();
        assert!(matches!(m.state(), SourceState::Idle));
    }

    #[test]
    fn releasing_the_button_aborts() {
        let f = fixture();
        let config = DragDropConfig::default();
        let mut m = DragSourceMachine::new();
        assert!(m.press(&f.host, &f.sources, &config, &press_at(f.rows[0], Point::new(10.0, 10.0)), |_, _| true));
        let outcome = m.pointer_move(Point::new(50.0, 50.0), KeyStates::empty(), &config, |_| {
            panic!("must not start without the button held")
        });
        assert!(matches!(outcome, MoveOutcome::Aborted));
        assert!(matches!(m.state(), SourceState::Idle));
    }

    #[test]
    fn missing_payload_aborts() {
        let f = fixture();
        let config = DragDropConfig::default();
        let mut m = DragSourceMachine::new();
        assert!(m.press(&f.host, &f.sources, &config, &press_at(f.rows[0], Point::new(10.0, 10.0)), |_, _| true));
        let outcome = m.pointer_move(Point::new(50.0, 50.0), KeyStates::LEFT_BUTTON, &config, |info| {
            info.allowed_effects = DragDropEffects::MOVE;
        });
        assert!(matches!(outcome, MoveOutcome::Aborted));
        assert!(!m.is_dragging());
    }

    #[test]
    fn press_filters() {
        let mut f = fixture();
        let config = DragDropConfig::default();
        let mut m = DragSourceMachine::new();
        let point = Point::new(10.0, 10.0);

        let double = PointerPress {
            click_count: 2,
            ..press_at(f.rows[0], point)
        };
        assert!(!m.press(&f.host, &f.sources, &config, &double, |_, _| true));

        let right = PointerPress {
            button: MouseButton::Right,
            ..press_at(f.rows[0], point)
        };
        assert!(!m.press(&f.host, &f.sources, &config, &right, |_, _| true));
        let lenient = DragDropConfig {
            can_drag_with_right_button: true,
            ..DragDropConfig::default()
        };
        assert!(m.press(&f.host, &f.sources, &lenient, &right, |_, _| true));

        assert!(!m.press(&f.host, &f.sources, &config, &press_at(f.rows[0], point), |_, _| false));

        let toggle = f.host.add_element(f.rows[0], Rect::new(80.0, 0.0, 100.0, 20.0), ElementKind::ToggleButton);
        f.host.commit();
        assert!(!m.press(&f.host, &f.sources, &config, &press_at(toggle, Point::new(90.0, 10.0)), |_, _| true));

        f.sources.ignored.insert(f.rows[1]);
        assert!(!m.press(&f.host, &f.sources, &config, &press_at(f.rows[1], Point::new(10.0, 30.0)), |_, _| true));

        let outside = f.host.add_items_control(None, Rect::new(300.0, 0.0, 400.0, 100.0), ItemsKind::ListBox);
        f.host.commit();
        assert!(!m.press(&f.host, &f.sources, &config, &press_at(outside, Point::new(310.0, 10.0)), |_, _| true));
    }

    #[test]
    fn directly_selected_only() {
        let mut f = fixture();
        f.host.set_selection(f.list, vec![ItemId(2)]);
        let config = DragDropConfig {
            drag_directly_selected_only: true,
            ..DragDropConfig::default()
        };
        let mut m = DragSourceMachine::new();
        assert!(!m.press(&f.host, &f.sources, &config, &press_at(f.rows[0], Point::new(10.0, 10.0)), |_, _| true));
        assert!(m.press(&f.host, &f.sources, &config, &press_at(f.rows[1], Point::new(10.0, 30.0)), |_, _| true));
    }

    #[test]
    fn multi_selection_click_is_deferred_to_release() {
        let mut f = fixture();
        f.host.set_multi_select(f.list, true);
        f.host.set_selection(f.list, vec![ItemId(1), ItemId(2)]);
        let config = DragDropConfig::default();
        let mut m = DragSourceMachine::new();

        assert!(m.press(&f.host, &f.sources, &config, &press_at(f.rows[1], Point::new(10.0, 30.0)), |_, _| true));
        assert_eq!(m.suppressed_click(), Some((f.list, ItemId(2))));
        assert!(m.release(&mut f.host));
        assert_eq!(f.host.selected_items(f.list), vec![ItemId(2)]);

        // With a modifier held the toolkit's own selection handling runs.
        f.host.set_selection(f.list, vec![ItemId(1), ItemId(2)]);
        let ctrl = PointerPress {
            key_states: KeyStates::LEFT_BUTTON | KeyStates::CONTROL,
            ..press_at(f.rows[1], Point::new(10.0, 30.0))
        };
        assert!(m.press(&f.host, &f.sources, &config, &ctrl, |_, _| true));
        assert_eq!(m.suppressed_click(), None);
        assert!(!m.release(&mut f.host));
    }

    #[test]
    fn multi_selection_drag_carries_the_selection() {
        let mut f = fixture();
        f.host.set_multi_select(f.list, true);
        f.host.set_selection(f.list, vec![ItemId(1), ItemId(3)]);
        let config = DragDropConfig::default();
        let mut m = DragSourceMachine::new();
        assert!(m.press(&f.host, &f.sources, &config, &press_at(f.rows[2], Point::new(10.0, 50.0)), |_, _| true));
        let MoveOutcome::Start(info) = m.pointer_move(Point::new(10.0, 70.0), KeyStates::LEFT_BUTTON, &config, payload)
        else {
            panic!("expected a drag start");
        };
        assert_eq!(info.source_items, vec![ItemId(1), ItemId(3)]);
        assert_eq!(m.suppressed_click(), None, "a drag discards the deferred click");
    }
}
