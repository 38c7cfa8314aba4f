// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drag coordinator: behaviors, pointer routing and the drag session.
//!
//! ## Overview
//!
//! [`DragDropCoordinator`] is the one object that owns per-drag state. Controls
//! opt in by attaching a [`DragSourceBehavior`] and/or a
//! [`DropTargetBehavior`]; the toolkit forwards raw pointer input; the
//! coordinator drives the [source state machine](crate::source), and once a
//! drag starts, runs the platform [`DragTransport`] with itself as the event
//! sink.
//!
//! ## Session
//!
//! While the transport call blocks, every drag-over rebuilds a [`DropInfo`],
//! derives enter/leave transitions from the resolved target, and asks the
//! target's handler for effects and an adorner. Effects are forced to none
//! when the drag contexts differ and are always a subset of what the source
//! allows. A target over a scrollable viewport is auto-scrolled near its
//! edges.
//!
//! When the transport returns, by drop, cancellation or error, the current
//! drag, the current adorner, the target tracker and the preview poll are all
//! torn down before any source callback runs.
//!
//! ## Minimal example
//!
//! ```
//! # #[cfg(feature = "scene_adapter")] {
//! use kurbo::{Point, Rect};
//! use understory_dnd::adapters::scene::SceneHost;
//! use understory_dnd::{
//!     DragDropConfig, DragDropCoordinator, DragSourceBehavior, DropTargetBehavior, ItemId,
//!     ItemsKind, KeyStates, MouseButton,
//! };
//!
//! let mut host = SceneHost::new();
//! let list = host.add_items_control(None, Rect::new(0.0, 0.0, 100.0, 100.0), ItemsKind::ListBox);
//! let items = host.new_collection(vec![ItemId(1)], true);
//! host.bind(list, items);
//! host.commit();
//!
//! let mut dnd = DragDropCoordinator::new(DragDropConfig::default());
//! dnd.attach_source(list, DragSourceBehavior::new());
//! dnd.attach_target(list, DropTargetBehavior::new());
//!
//! // Presses outside any item container arm the machine but carry nothing.
//! assert!(dnd.pointer_down(&host, list, Point::new(5.0, 5.0), MouseButton::Left, 1, KeyStates::LEFT_BUTTON));
//! assert!(!dnd.pointer_up(&mut host));
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use kurbo::{Point, Rect};

use crate::autoscroll::{ScrollingMode, scroll_request};
use crate::config::DragDropConfig;
use crate::default_handler::{DefaultDragHandler, DefaultDropHandler};
use crate::drag_info::DragInfo;
use crate::drop_info::{DropInfo, DropInfoBuilder, DropTargetLookup, TargetOptions};
use crate::error::{DragDropError, TransportError};
use crate::handler::{DragSource, DropTarget};
use crate::host::ItemsHost;
use crate::preview::{DragPreview, PointerPoll, PollGuard, PreviewSlot};
use crate::source::{DragSourceLookup, DragSourceMachine, MoveOutcome, PointerPress, SourceOptions};
use crate::tracker::{TargetTracker, TargetTransition};
use crate::transport::{self, AdornerState, DragAction, DragEventSink, DragTransport};
use crate::types::{DragDropEffects, DropAdornerKind, DropEventKind, KeyStates, MouseButton, Orientation};

/// Drag source settings for one control.
pub struct DragSourceBehavior<H: ItemsHost + ?Sized> {
    /// Callbacks; [`DefaultDragHandler`] when `None`.
    pub handler: Option<Box<dyn DragSource<H>>>,
    /// Drag context; targets with a different non-empty context refuse drops.
    pub context: Option<String>,
    /// Forced stacking axis of the source.
    pub orientation: Option<Orientation>,
}

impl<H: ItemsHost + ?Sized> DragSourceBehavior<H> {
    /// A source using the default handler and no context.
    pub fn new() -> Self {
        Self {
            handler: None,
            context: None,
            orientation: None,
        }
    }

    /// Use `handler` for this source.
    pub fn with_handler(mut self, handler: impl DragSource<H> + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Set the drag context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Force the stacking axis.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }
}

impl<H: ItemsHost + ?Sized> Default for DragSourceBehavior<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ItemsHost + ?Sized> core::fmt::Debug for DragSourceBehavior<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DragSourceBehavior")
            .field("custom_handler", &self.handler.is_some())
            .field("context", &self.context)
            .field("orientation", &self.orientation)
            .finish()
    }
}

/// Drop target settings for one control.
pub struct DropTargetBehavior<H: ItemsHost + ?Sized> {
    /// Callbacks; [`DefaultDropHandler`] when `None`.
    pub handler: Option<Box<dyn DropTarget<H>>>,
    /// Drag context; drags with a different non-empty context are refused.
    pub context: Option<String>,
    /// Forced stacking axis of the target.
    pub orientation: Option<Orientation>,
    /// Whether center drops re-parent into the hovered item. `None` means
    /// hierarchical controls only.
    pub accepts_child_items: Option<bool>,
    /// Axes auto-scrolled while dragging near the viewport edge.
    pub scrolling_mode: ScrollingMode,
}

impl<H: ItemsHost + ?Sized> DropTargetBehavior<H> {
    /// A target using the default handler, no context, scrolling both axes.
    pub fn new() -> Self {
        Self {
            handler: None,
            context: None,
            orientation: None,
            accepts_child_items: None,
            scrolling_mode: ScrollingMode::default(),
        }
    }

    /// Use `handler` for this target.
    pub fn with_handler(mut self, handler: impl DropTarget<H> + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Set the drag context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Force the stacking axis.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Override whether center drops re-parent into the hovered item.
    pub fn with_accepts_child_items(mut self, accepts: bool) -> Self {
        self.accepts_child_items = Some(accepts);
        self
    }

    /// Set the auto-scroll axes.
    pub fn with_scrolling_mode(mut self, mode: ScrollingMode) -> Self {
        self.scrolling_mode = mode;
        self
    }
}

impl<H: ItemsHost + ?Sized> Default for DropTargetBehavior<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ItemsHost + ?Sized> core::fmt::Debug for DropTargetBehavior<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DropTargetBehavior")
            .field("custom_handler", &self.handler.is_some())
            .field("context", &self.context)
            .field("orientation", &self.orientation)
            .field("accepts_child_items", &self.accepts_child_items)
            .field("scrolling_mode", &self.scrolling_mode)
            .finish()
    }
}

type Sources<H> = BTreeMap<<H as crate::host::VisualTree>::Node, DragSourceBehavior<H>>;
type Targets<H> = BTreeMap<<H as crate::host::VisualTree>::Node, DropTargetBehavior<H>>;

struct SourceRegistry<'a, H: ItemsHost> {
    behaviors: &'a Sources<H>,
    ignored: &'a BTreeSet<H::Node>,
}

impl<H: ItemsHost> DragSourceLookup<H::Node> for SourceRegistry<'_, H> {
    fn source_options(&self, node: H::Node) -> Option<SourceOptions<'_>> {
        self.behaviors.get(&node).map(|b| SourceOptions {
            context: b.context.as_deref(),
            orientation: b.orientation,
        })
    }

    fn is_drag_ignored(&self, node: H::Node) -> bool {
        self.ignored.contains(&node)
    }
}

struct TargetRegistry<'a, H: ItemsHost>(&'a Targets<H>);

impl<H: ItemsHost> DropTargetLookup<H::Node> for TargetRegistry<'_, H> {
    fn target_options(&self, node: H::Node) -> Option<TargetOptions<'_>> {
        self.0.get(&node).map(|b| TargetOptions {
            context: b.context.as_deref(),
            orientation: b.orientation,
            accepts_child_items: b.accepts_child_items,
        })
    }
}

fn drag_handler<'s, H: ItemsHost>(
    sources: &'s mut Sources<H>,
    fallback: &'s mut DefaultDragHandler,
    control: H::Node,
) -> &'s mut dyn DragSource<H> {
    match sources.get_mut(&control).and_then(|b| b.handler.as_deref_mut()) {
        Some(handler) => handler,
        None => fallback,
    }
}

fn drop_handler<'s, H: ItemsHost>(
    targets: &'s mut Targets<H>,
    fallback: &'s mut DefaultDropHandler,
    control: H::Node,
) -> &'s mut dyn DropTarget<H> {
    match targets.get_mut(&control).and_then(|b| b.handler.as_deref_mut()) {
        Some(handler) => handler,
        None => fallback,
    }
}

/// Owns every attached behavior and the state of the drag in progress.
pub struct DragDropCoordinator<H: ItemsHost> {
    config: DragDropConfig,
    sources: Sources<H>,
    targets: Targets<H>,
    ignored: BTreeSet<H::Node>,
    adorners: BTreeSet<&'static str>,
    machine: DragSourceMachine<H::Node>,
    builder: DropInfoBuilder<H::Node>,
    default_drag: DefaultDragHandler,
    default_drop: DefaultDropHandler,
    current_drag: Option<DragInfo<H::Node>>,
    current_adorner: Option<AdornerState<H::Node>>,
    tracker: TargetTracker<H::Node>,
    preview: PreviewSlot,
    pending_error: Option<DragDropError>,
}

impl<H: ItemsHost> core::fmt::Debug for DragDropCoordinator<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DragDropCoordinator")
            .field("config", &self.config)
            .field("sources", &self.sources.len())
            .field("targets", &self.targets.len())
            .field("machine", &self.machine)
            .field("current_adorner", &self.current_adorner)
            .finish_non_exhaustive()
    }
}

impl<H: ItemsHost> DragDropCoordinator<H> {
    /// Create a coordinator with no attached controls.
    pub fn new(config: DragDropConfig) -> Self {
        Self {
            default_drop: DefaultDropHandler::from_config(&config),
            config,
            sources: BTreeMap::new(),
            targets: BTreeMap::new(),
            ignored: BTreeSet::new(),
            adorners: BTreeSet::new(),
            machine: DragSourceMachine::new(),
            builder: DropInfoBuilder::new(),
            default_drag: DefaultDragHandler,
            current_drag: None,
            current_adorner: None,
            tracker: TargetTracker::new(),
            preview: PreviewSlot::default(),
            pending_error: None,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &DragDropConfig {
        &self.config
    }

    /// Make `control` a drag source, replacing any previous behavior.
    pub fn attach_source(&mut self, control: H::Node, behavior: DragSourceBehavior<H>) {
        self.sources.insert(control, behavior);
    }

    /// Stop treating `control` as a drag source.
    pub fn detach_source(&mut self, control: H::Node) -> Option<DragSourceBehavior<H>> {
        self.sources.remove(&control)
    }

    /// Make `control` a drop target, replacing any previous behavior.
    pub fn attach_target(&mut self, control: H::Node, behavior: DropTargetBehavior<H>) {
        self.builder.cache_mut().forget(control);
        self.targets.insert(control, behavior);
    }

    /// Stop treating `control` as a drop target.
    pub fn detach_target(&mut self, control: H::Node) -> Option<DropTargetBehavior<H>> {
        self.builder.cache_mut().forget(control);
        self.targets.remove(&control)
    }

    /// Presses on `node` or its descendants never start a drag.
    pub fn set_drag_ignored(&mut self, node: H::Node, ignored: bool) {
        if ignored {
            self.ignored.insert(node);
        } else {
            self.ignored.remove(&node);
        }
    }

    /// Allow handlers to request [`DropAdornerKind::Custom`] with `name`.
    pub fn register_adorner(&mut self, name: &'static str) {
        self.adorners.insert(name);
    }

    /// The drag in progress, while the transport runs.
    pub fn current_drag(&self) -> Option<&DragInfo<H::Node>> {
        self.current_drag.as_ref()
    }

    /// The adorner chosen on the last drag tick.
    pub fn current_adorner(&self) -> Option<&AdornerState<H::Node>> {
        self.current_adorner.as_ref()
    }

    /// Last preview bounds reported by the pointer poll.
    pub fn preview_bounds(&self) -> Option<Rect> {
        self.preview.get()
    }

    /// Returns true between drag start and transport return.
    pub fn is_dragging(&self) -> bool {
        self.machine.is_dragging()
    }

    /// Route a pointer press. Returns true when the press may become a drag.
    pub fn pointer_down(
        &mut self,
        host: &H,
        element: H::Node,
        point: Point,
        button: MouseButton,
        click_count: u32,
        key_states: KeyStates,
    ) -> bool {
        if self.is_dragging() {
            return false;
        }
        let press = PointerPress {
            element,
            point,
            button,
            click_count,
            key_states,
        };
        let registry = SourceRegistry::<H> {
            behaviors: &self.sources,
            ignored: &self.ignored,
        };
        let sources = &self.sources;
        let fallback = &self.default_drag;
        self.machine.press(host, &registry, &self.config, &press, |control, info| {
            match sources.get(&control).and_then(|b| b.handler.as_deref()) {
                Some(handler) => handler.can_start_drag(host, info),
                None => DragSource::<H>::can_start_drag(fallback, host, info),
            }
        })
    }

    /// Route a pointer move.
    ///
    /// Returns `Ok(None)` when no drag ran. When the move crosses the drag
    /// threshold this runs the whole transport call and returns the effects
    /// it settled on. `poll`, when given and previews are enabled, keeps the
    /// preview bounds current for the duration of the call.
    pub fn pointer_move<T>(
        &mut self,
        host: &mut H,
        transport: &mut T,
        poll: Option<&mut dyn PointerPoll>,
        point: Point,
        key_states: KeyStates,
    ) -> Result<Option<DragDropEffects>, DragDropError>
    where
        T: DragTransport<H::Node> + ?Sized,
    {
        let Some(control) = self.machine.pressed_source() else {
            return Ok(None);
        };
        let handler = drag_handler(&mut self.sources, &mut self.default_drag, control);
        let outcome = self
            .machine
            .pointer_move(point, key_states, &self.config, |info| handler.start_drag(&*host, info));
        match outcome {
            MoveOutcome::Start(info) => self.run(host, transport, poll, info).map(Some),
            MoveOutcome::Idle | MoveOutcome::Pending | MoveOutcome::Aborted => Ok(None),
        }
    }

    /// Route a pointer release. Returns true when a deferred selection change
    /// was applied.
    pub fn pointer_up(&mut self, host: &mut H) -> bool {
        self.machine.release(host)
    }

    fn run<T>(
        &mut self,
        host: &mut H,
        transport: &mut T,
        poll: Option<&mut dyn PointerPoll>,
        info: DragInfo<H::Node>,
    ) -> Result<DragDropEffects, DragDropError>
    where
        T: DragTransport<H::Node> + ?Sized,
    {
        let Some(payload) = info.payload.clone() else {
            self.machine.finish();
            return Ok(DragDropEffects::empty());
        };
        let source = info.source_control;
        let allowed = info.allowed_effects;
        let guard = match poll {
            Some(poll) if self.config.use_preview => Some(PollGuard::start(
                poll,
                DragPreview::new(self.config.drag_anchor, info.item_size),
                Rc::clone(&self.preview),
            )),
            _ => None,
        };
        log::debug!("drag started from {source:?} with {allowed:?}");

        let drag: &DragInfo<H::Node> = self.current_drag.insert(info);
        let mut session = Session {
            host,
            config: &self.config,
            drag,
            sources: &mut self.sources,
            targets: &mut self.targets,
            adorners: &self.adorners,
            builder: &mut self.builder,
            default_drag: &mut self.default_drag,
            default_drop: &mut self.default_drop,
            adorner: &mut self.current_adorner,
            tracker: &mut self.tracker,
            preview: &self.preview,
            error: &mut self.pending_error,
            last: (drag.pointer_down_position, KeyStates::empty()),
        };
        let result = transport.do_drag_drop(source, &payload, allowed, &mut session);
        drop(session);
        drop(guard);
        self.finish(result)
    }

    /// Clear every per-drag slot, then notify the source.
    fn finish(
        &mut self,
        result: Result<DragDropEffects, TransportError>,
    ) -> Result<DragDropEffects, DragDropError> {
        let drag = self.current_drag.take();
        self.current_adorner = None;
        self.tracker = TargetTracker::new();
        self.preview.set(None);
        self.machine.finish();
        let pending = self.pending_error.take();

        let Some(drag) = drag else {
            return result.map_err(DragDropError::from);
        };
        let handler = drag_handler(&mut self.sources, &mut self.default_drag, drag.source_control);
        // Transport errors end in the exception hook; cancel and finish only
        // follow a drag the transport completed.
        let effects = match result {
            Ok(effects) => effects,
            Err(err) => {
                if !handler.try_catch_occurred_exception(&err) {
                    return Err(err.into());
                }
                log::warn!("drag from {:?} failed: {err}", drag.source_control);
                return Ok(DragDropEffects::empty());
            }
        };
        if effects.is_empty() {
            handler.drag_cancelled();
        }
        handler.drag_drop_operation_finished(effects, &drag);
        match pending {
            Some(err) => Err(err),
            None => Ok(effects),
        }
    }
}

/// The event sink handed to the transport for one drag.
struct Session<'c, H: ItemsHost> {
    host: &'c mut H,
    config: &'c DragDropConfig,
    drag: &'c DragInfo<H::Node>,
    sources: &'c mut Sources<H>,
    targets: &'c mut Targets<H>,
    adorners: &'c BTreeSet<&'static str>,
    builder: &'c mut DropInfoBuilder<H::Node>,
    default_drag: &'c mut DefaultDragHandler,
    default_drop: &'c mut DefaultDropHandler,
    adorner: &'c mut Option<AdornerState<H::Node>>,
    tracker: &'c mut TargetTracker<H::Node>,
    preview: &'c PreviewSlot,
    error: &'c mut Option<DragDropError>,
    last: (Point, KeyStates),
}

impl<'c, H: ItemsHost> Session<'c, H> {
    fn build(
        &mut self,
        element: H::Node,
        point: Point,
        key_states: KeyStates,
        event: DropEventKind,
    ) -> DropInfo<'c, H::Node> {
        let targets = TargetRegistry::<H>(&*self.targets);
        self.builder
            .build(&*self.host, &targets, Some(self.drag), element, point, key_states, event)
    }

    fn leave(&mut self, target: H::Node) {
        let (point, key_states) = self.last;
        let mut info = DropInfo::neutral(Some(self.drag), point, key_states, DropEventKind::Leave);
        info.target_control = Some(target);
        drop_handler(&mut *self.targets, &mut *self.default_drop, target).drag_leave(&*self.host, &info);
        *self.adorner = None;
    }

    fn leave_current(&mut self) {
        if let Some(TargetTransition::Leave(old)) = self.tracker.clear() {
            self.leave(old);
        }
        *self.adorner = None;
    }

    /// Apply the transitions toward `target`; true when it was just entered.
    fn transition(&mut self, target: Option<H::Node>) -> bool {
        let mut entered = false;
        for transition in self.tracker.update(target) {
            match transition {
                TargetTransition::Leave(old) => self.leave(old),
                TargetTransition::Enter(_) => entered = true,
            }
        }
        entered
    }

    /// Constrain the handler's effects: none across contexts, never more
    /// than the source allows.
    fn settle(&self, info: &mut DropInfo<'_, H::Node>) -> DragDropEffects {
        if !info.same_context {
            info.effects = DragDropEffects::empty();
            info.adorner = DropAdornerKind::None;
        }
        info.effects &= self.drag.allowed_effects;
        info.effects
    }

    fn auto_scroll(&mut self, target: H::Node, point: Point) -> DragDropEffects {
        let mode = self
            .targets
            .get(&target)
            .map_or(ScrollingMode::default(), |b| b.scrolling_mode);
        let Some(info) = self.host.scroll_info(target) else {
            return DragDropEffects::empty();
        };
        let Some(request) = scroll_request(mode, &info, point, self.config.scroll_margin) else {
            return DragDropEffects::empty();
        };
        self.host.scroll_by_lines(target, request.dx, request.dy);
        DragDropEffects::SCROLL
    }
}

impl<H: ItemsHost> DragEventSink<H::Node> for Session<'_, H> {
    fn drag_over(&mut self, element: Option<H::Node>, point: Point, key_states: KeyStates) -> DragDropEffects {
        self.last = (point, key_states);
        let Some(element) = element else {
            self.leave_current();
            return DragDropEffects::empty();
        };
        let mut info = self.build(element, point, key_states, DropEventKind::Over);
        let entered = self.transition(info.target_control);
        let Some(target) = info.target_control else {
            return DragDropEffects::empty();
        };

        let handler = drop_handler(&mut *self.targets, &mut *self.default_drop, target);
        if entered {
            info.event = DropEventKind::Enter;
            handler.drag_enter(&*self.host, &mut info);
        } else {
            handler.drag_over(&*self.host, &mut info);
        }
        let effects = self.settle(&mut info);

        if let DropAdornerKind::Custom(name) = info.adorner
            && !self.adorners.contains(name)
        {
            *self.error = Some(DragDropError::UnknownAdorner { name });
            *self.adorner = None;
            return DragDropEffects::empty();
        }
        *self.adorner = (!effects.is_empty() && info.adorner != DropAdornerKind::None).then_some(AdornerState {
            target,
            kind: info.adorner,
            container: info.hovered_container,
            insert_index: info.insert_index,
            insert_position: info.insert_position,
        });
        effects | self.auto_scroll(target, point)
    }

    fn drag_leave(&mut self) {
        self.leave_current();
    }

    fn drop(&mut self, element: H::Node, point: Point, key_states: KeyStates) -> DragDropEffects {
        self.last = (point, key_states);
        let mut info = self.build(element, point, key_states, DropEventKind::Drop);
        self.transition(info.target_control);
        if let Some(TargetTransition::Leave(last)) = self.tracker.clear() {
            // The drop stands in for the final leave.
            log::trace!("drop ends the hover over {last:?}");
        }
        *self.adorner = None;
        let Some(target) = info.target_control else {
            return DragDropEffects::empty();
        };

        drop_handler(&mut *self.targets, &mut *self.default_drop, target).drag_over(&*self.host, &mut info);
        let effects = self.settle(&mut info);
        if effects.is_empty() {
            log::debug!("drop on {target:?} refused");
            return effects;
        }
        DropTarget::drop(drop_handler(&mut *self.targets, &mut *self.default_drop, target), &mut *self.host, &info);
        drag_handler(&mut *self.sources, &mut *self.default_drag, self.drag.source_control).dropped(&mut *self.host, &info);
        effects
    }

    fn query_continue(&mut self, escape_pressed: bool, key_states: KeyStates) -> DragAction {
        let action = if self.error.is_some() {
            DragAction::Cancel
        } else {
            transport::query_continue(escape_pressed, key_states, self.drag.button)
        };
        if action == DragAction::Cancel {
            log::debug!("drag from {:?} cancelled", self.drag.source_control);
            self.leave_current();
        }
        action
    }

    fn adorner(&self) -> Option<AdornerState<H::Node>> {
        *self.adorner
    }

    fn preview_bounds(&self) -> Option<Rect> {
        self.preview.get()
    }
}

#[cfg(all(test, feature = "scene_adapter"))]
mod tests {
    use std::cell::RefCell;

    use kurbo::{Size, Vec2};
    use understory_dnd_scene::NodeId;

    use super::*;
    use crate::adapters::scene::SceneHost;
    use crate::autoscroll::ScrollInfo;
    use crate::types::{CollectionId, InsertPosition, ItemId, ItemsKind, PanelInfo, PanelKind};

    type Log = Rc<RefCell<Vec<String>>>;

    struct Fixture {
        host: SceneHost,
        left: NodeId,
        right: NodeId,
        left_rows: Vec<NodeId>,
        right_rows: Vec<NodeId>,
        left_items: CollectionId,
        right_items: CollectionId,
    }

    fn column(host: &mut SceneHost, x: f64, items: &[u64]) -> (NodeId, Vec<NodeId>, CollectionId) {
        let control = host.add_items_control(None, Rect::new(x, 0.0, x + 100.0, 200.0), ItemsKind::ListBox);
        let panel = host.add_panel(
            control,
            Rect::new(x, 0.0, x + 100.0, 200.0),
            PanelInfo::oriented(PanelKind::Stack, Orientation::Vertical),
        );
        let source = host.new_collection(items.iter().copied().map(ItemId).collect(), true);
        host.bind(control, source);
        let rows = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let y = i as f64 * 20.0;
                host.add_container(control, panel, Rect::new(x, y, x + 100.0, y + 20.0), ItemId(*item))
            })
            .collect();
        (control, rows, source)
    }

    fn fixture() -> Fixture {
        let mut host = SceneHost::new();
        let (left, left_rows, left_items) = column(&mut host, 0.0, &[1, 2, 3, 4]);
        let (right, right_rows, right_items) = column(&mut host, 200.0, &[10, 11]);
        host.commit();
        Fixture {
            host,
            left,
            right,
            left_rows,
            right_rows,
            left_items,
            right_items,
        }
    }

    fn ids(host: &SceneHost, id: CollectionId) -> Vec<u64> {
        host.collection_items(id).iter().map(|i| i.0).collect()
    }

    struct RecordingSource {
        log: Log,
        catch: bool,
    }

    impl DragSource<SceneHost> for RecordingSource {
        fn start_drag(&mut self, host: &SceneHost, info: &mut DragInfo<NodeId>) {
            self.log.borrow_mut().push("start".into());
            DefaultDragHandler.start_drag(host, info);
        }

        fn dropped(&mut self, _host: &mut SceneHost, _info: &DropInfo<'_, NodeId>) {
            self.log.borrow_mut().push("dropped".into());
        }

        fn drag_cancelled(&mut self) {
            self.log.borrow_mut().push("cancelled".into());
        }

        fn drag_drop_operation_finished(&mut self, effects: DragDropEffects, _info: &DragInfo<NodeId>) {
            self.log.borrow_mut().push(format!("finished {}", effects.bits()));
        }

        fn try_catch_occurred_exception(&mut self, _error: &TransportError) -> bool {
            self.log.borrow_mut().push("exception".into());
            self.catch
        }
    }

    struct RecordingTarget {
        log: Log,
        name: &'static str,
        adorner: Option<DropAdornerKind>,
    }

    impl DropTarget<SceneHost> for RecordingTarget {
        fn drag_enter(&mut self, host: &SceneHost, info: &mut DropInfo<'_, NodeId>) {
            self.log.borrow_mut().push(format!("enter {}", self.name));
            self.drag_over(host, info);
        }

        fn drag_over(&mut self, host: &SceneHost, info: &mut DropInfo<'_, NodeId>) {
            DefaultDropHandler::default().drag_over(host, info);
            if let Some(kind) = self.adorner {
                info.adorner = kind;
                info.effects = DragDropEffects::MOVE;
            }
        }

        fn drag_leave(&mut self, _host: &SceneHost, _info: &DropInfo<'_, NodeId>) {
            self.log.borrow_mut().push(format!("leave {}", self.name));
        }

        fn drop(&mut self, host: &mut SceneHost, info: &DropInfo<'_, NodeId>) {
            self.log.borrow_mut().push(format!("drop {}", self.name));
            DropTarget::drop(&mut DefaultDropHandler::default(), host, info);
        }
    }

    type Callback = Rc<RefCell<Option<Box<dyn FnMut(Point)>>>>;

    #[derive(Default)]
    struct FakePoll {
        callback: Callback,
        stops: usize,
    }

    impl PointerPoll for FakePoll {
        fn start(&mut self, callback: Box<dyn FnMut(Point)>) {
            *self.callback.borrow_mut() = Some(callback);
        }

        fn stop(&mut self) {
            *self.callback.borrow_mut() = None;
            self.stops += 1;
        }
    }

    enum Step {
        Over(NodeId, Point),
        Outside,
        Tick,
        Escape,
        Poll(Point),
        Drop(NodeId, Point),
        Fail,
    }

    #[derive(Default)]
    struct Script {
        steps: Vec<Step>,
        keys: KeyStates,
        poll: Callback,
        started: Option<(NodeId, DragDropEffects)>,
        over: Vec<DragDropEffects>,
        adorners: Vec<Option<AdornerState<NodeId>>>,
        previews: Vec<Option<Rect>>,
    }

    impl Script {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps,
                keys: KeyStates::LEFT_BUTTON,
                ..Self::default()
            }
        }
    }

    impl DragTransport<NodeId> for Script {
        fn do_drag_drop(
            &mut self,
            source: NodeId,
            _payload: &crate::types::Payload,
            allowed_effects: DragDropEffects,
            sink: &mut dyn DragEventSink<NodeId>,
        ) -> Result<DragDropEffects, TransportError> {
            self.started = Some((source, allowed_effects));
            for step in core::mem::take(&mut self.steps) {
                match step {
                    Step::Over(element, point) => {
                        let effects = sink.drag_over(Some(element), point, self.keys);
                        self.over.push(effects);
                        self.adorners.push(sink.adorner());
                    }
                    Step::Outside => sink.drag_leave(),
                    Step::Tick => {
                        if sink.query_continue(false, self.keys) == DragAction::Cancel {
                            return Ok(DragDropEffects::empty());
                        }
                    }
                    Step::Escape => {
                        if sink.query_continue(true, self.keys) == DragAction::Cancel {
                            return Ok(DragDropEffects::empty());
                        }
                    }
                    Step::Poll(point) => {
                        if let Some(callback) = self.poll.borrow_mut().as_mut() {
                            callback(point);
                        }
                        self.previews.push(sink.preview_bounds());
                    }
                    Step::Drop(element, point) => return Ok(sink.drop(element, point, self.keys)),
                    Step::Fail => return Err(TransportError::new("transport lost")),
                }
            }
            Ok(DragDropEffects::empty())
        }
    }

    /// Press the first left row and drag past the threshold.
    fn drag_first_row(
        f: &mut Fixture,
        dnd: &mut DragDropCoordinator<SceneHost>,
        script: &mut Script,
    ) -> Result<Option<DragDropEffects>, DragDropError> {
        let down = dnd.pointer_down(
            &f.host,
            f.left_rows[0],
            Point::new(10.0, 10.0),
            MouseButton::Left,
            1,
            KeyStates::LEFT_BUTTON,
        );
        assert!(down, "press on a source row must arm the drag");
        dnd.pointer_move(&mut f.host, script, None, Point::new(10.0, 30.0), KeyStates::LEFT_BUTTON)
    }

    fn coordinator(f: &Fixture) -> DragDropCoordinator<SceneHost> {
        let mut dnd = DragDropCoordinator::new(DragDropConfig::default());
        dnd.attach_source(f.left, DragSourceBehavior::new());
        dnd.attach_target(f.left, DropTargetBehavior::new());
        dnd.attach_target(f.right, DropTargetBehavior::new());
        dnd
    }

    fn assert_idle(dnd: &DragDropCoordinator<SceneHost>) {
        assert!(!dnd.is_dragging());
        assert!(dnd.current_drag().is_none());
        assert!(dnd.current_adorner().is_none());
        assert!(dnd.preview_bounds().is_none());
    }

    #[test]
    fn reorder_within_list() {
        let mut f = fixture();
        let mut dnd = coordinator(&f);
        let below_last = Point::new(10.0, 75.0);
        let mut script = Script::new(vec![
            Step::Over(f.left_rows[3], below_last),
            Step::Drop(f.left_rows[3], below_last),
        ]);

        let result = drag_first_row(&mut f, &mut dnd, &mut script);
        assert_eq!(result, Ok(Some(DragDropEffects::MOVE)));
        assert_eq!(script.started, Some((f.left, DragDropEffects::COPY | DragDropEffects::MOVE)));
        assert_eq!(script.over, vec![DragDropEffects::MOVE]);
        assert_eq!(
            script.adorners,
            vec![Some(AdornerState {
                target: f.left,
                kind: DropAdornerKind::Insert,
                container: Some(f.left_rows[3]),
                insert_index: 4,
                insert_position: InsertPosition::AFTER_TARGET_ITEM,
            })]
        );
        assert_eq!(ids(&f.host, f.left_items), vec![2, 3, 4, 1]);
        assert_idle(&dnd);
    }

    #[test]
    fn move_between_lists() {
        let mut f = fixture();
        let log = Log::default();
        let mut dnd = coordinator(&f);
        dnd.attach_source(
            f.left,
            DragSourceBehavior::new().with_handler(RecordingSource {
                log: Rc::clone(&log),
                catch: false,
            }),
        );
        let point = Point::new(210.0, 35.0);
        let mut script = Script::new(vec![Step::Over(f.right_rows[1], point), Step::Drop(f.right_rows[1], point)]);

        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::MOVE)));
        assert_eq!(ids(&f.host, f.left_items), vec![2, 3, 4]);
        assert_eq!(ids(&f.host, f.right_items), vec![10, 11, 1]);
        assert_eq!(*log.borrow(), vec!["start", "dropped", "finished 2"]);
    }

    #[test]
    fn enter_and_leave_follow_the_resolved_target() {
        let mut f = fixture();
        let log = Log::default();
        let mut dnd = coordinator(&f);
        for (control, name) in [(f.left, "left"), (f.right, "right")] {
            dnd.attach_target(
                control,
                DropTargetBehavior::new().with_handler(RecordingTarget {
                    log: Rc::clone(&log),
                    name,
                    adorner: None,
                }),
            );
        }
        let mut script = Script::new(vec![
            Step::Over(f.left_rows[1], Point::new(10.0, 30.0)),
            Step::Over(f.left_rows[2], Point::new(10.0, 50.0)),
            Step::Over(f.right_rows[0], Point::new(210.0, 10.0)),
            Step::Outside,
        ]);

        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::empty())));
        assert_eq!(*log.borrow(), vec!["enter left", "leave left", "enter right", "leave right"]);
        assert_eq!(ids(&f.host, f.left_items), vec![1, 2, 3, 4]);
        assert_idle(&dnd);
    }

    #[test]
    fn drop_replaces_the_final_leave() {
        let mut f = fixture();
        let log = Log::default();
        let mut dnd = coordinator(&f);
        dnd.attach_target(
            f.right,
            DropTargetBehavior::new().with_handler(RecordingTarget {
                log: Rc::clone(&log),
                name: "right",
                adorner: None,
            }),
        );
        let point = Point::new(210.0, 35.0);
        let mut script = Script::new(vec![Step::Over(f.right_rows[1], point), Step::Drop(f.right_rows[1], point)]);
        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::MOVE)));
        assert_eq!(*log.borrow(), vec!["enter right", "drop right"], "no leave after a drop");

        // The next drag starts from a clean tracker and enters again. Row 0's
        // item moved away, so press the row of item 2.
        log.borrow_mut().clear();
        let mut script = Script::new(vec![Step::Over(f.right_rows[0], Point::new(210.0, 10.0)), Step::Outside]);
        assert!(dnd.pointer_down(
            &f.host,
            f.left_rows[1],
            Point::new(10.0, 30.0),
            MouseButton::Left,
            1,
            KeyStates::LEFT_BUTTON,
        ), "item 2 is still in the source list");
        let result = dnd.pointer_move(&mut f.host, &mut script, None, Point::new(10.0, 50.0), KeyStates::LEFT_BUTTON);
        assert_eq!(result, Ok(Some(DragDropEffects::empty())));
        assert_eq!(*log.borrow(), vec!["enter right", "leave right"], "fresh enter on the next drag");
    }

    #[test]
    fn context_mismatch_forces_no_effect() {
        let mut f = fixture();
        let mut dnd = coordinator(&f);
        dnd.attach_source(f.left, DragSourceBehavior::new().with_context("rows"));
        dnd.attach_target(f.right, DropTargetBehavior::new().with_context("tabs"));
        let point = Point::new(210.0, 35.0);
        let mut script = Script::new(vec![Step::Over(f.right_rows[1], point), Step::Drop(f.right_rows[1], point)]);

        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::empty())));
        assert_eq!(script.over, vec![DragDropEffects::empty()]);
        assert_eq!(script.adorners, vec![None]);
        assert_eq!(ids(&f.host, f.right_items), vec![10, 11]);
    }

    #[test]
    fn escape_cancels_and_leaves() {
        let mut f = fixture();
        let sources = Log::default();
        let targets = Log::default();
        let mut dnd = coordinator(&f);
        dnd.attach_source(
            f.left,
            DragSourceBehavior::new().with_handler(RecordingSource {
                log: Rc::clone(&sources),
                catch: false,
            }),
        );
        dnd.attach_target(
            f.left,
            DropTargetBehavior::new().with_handler(RecordingTarget {
                log: Rc::clone(&targets),
                name: "left",
                adorner: None,
            }),
        );
        let mut script = Script::new(vec![
            Step::Over(f.left_rows[1], Point::new(10.0, 30.0)),
            Step::Escape,
            Step::Drop(f.left_rows[1], Point::new(10.0, 30.0)),
        ]);

        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::empty())));
        assert_eq!(*targets.borrow(), vec!["enter left", "leave left"]);
        assert_eq!(*sources.borrow(), vec!["start", "cancelled", "finished 0"]);
        assert_eq!(ids(&f.host, f.left_items), vec![1, 2, 3, 4]);
        assert_idle(&dnd);
    }

    #[test]
    fn transport_failure_propagates_unless_caught() {
        let mut f = fixture();
        let log = Log::default();
        let mut dnd = coordinator(&f);
        dnd.attach_source(
            f.left,
            DragSourceBehavior::new().with_handler(RecordingSource {
                log: Rc::clone(&log),
                catch: false,
            }),
        );
        let mut script = Script::new(vec![Step::Fail]);
        assert_eq!(
            drag_first_row(&mut f, &mut dnd, &mut script),
            Err(DragDropError::Transport(TransportError::new("transport lost")))
        );
        assert_eq!(*log.borrow(), vec!["start", "exception"]);
        assert_idle(&dnd);

        log.borrow_mut().clear();
        dnd.attach_source(
            f.left,
            DragSourceBehavior::new().with_handler(RecordingSource {
                log: Rc::clone(&log),
                catch: true,
            }),
        );
        let mut script = Script::new(vec![Step::Fail]);
        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::empty())));
        assert_eq!(*log.borrow(), vec!["start", "exception"], "a caught failure skips cancel and finish");
        assert_idle(&dnd);
    }

    #[test]
    fn unregistered_custom_adorner_aborts_the_drag() {
        let mut f = fixture();
        let log = Log::default();
        let mut dnd = coordinator(&f);
        dnd.attach_target(
            f.right,
            DropTargetBehavior::new().with_handler(RecordingTarget {
                log: Rc::clone(&log),
                name: "right",
                adorner: Some(DropAdornerKind::Custom("ghost")),
            }),
        );
        let point = Point::new(210.0, 35.0);
        let target_row = f.right_rows[1];
        let steps = || vec![Step::Over(target_row, point), Step::Tick, Step::Drop(target_row, point)];

        let mut script = Script::new(steps());
        assert_eq!(
            drag_first_row(&mut f, &mut dnd, &mut script),
            Err(DragDropError::UnknownAdorner { name: "ghost" })
        );
        assert_eq!(ids(&f.host, f.right_items), vec![10, 11]);
        assert_idle(&dnd);

        dnd.register_adorner("ghost");
        let mut script = Script::new(steps());
        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::MOVE)));
        assert_eq!(script.adorners[0].map(|a| a.kind), Some(DropAdornerKind::Custom("ghost")));
        assert_eq!(ids(&f.host, f.right_items), vec![10, 11, 1]);
    }

    #[test]
    fn dragging_near_the_viewport_edge_scrolls() {
        let mut f = fixture();
        f.host.set_scroll_info(
            f.right,
            ScrollInfo {
                viewport: Rect::new(200.0, 0.0, 300.0, 200.0),
                offset: Vec2::ZERO,
                extent: Size::new(100.0, 400.0),
            },
        );
        let mut dnd = coordinator(&f);
        let mut script = Script::new(vec![Step::Over(f.right, Point::new(250.0, 195.0))]);

        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::empty())));
        assert_eq!(script.over, vec![DragDropEffects::MOVE | DragDropEffects::SCROLL]);
        assert_eq!(f.host.scroll_log(), &[(f.right, 0, 1)]);

        dnd.attach_target(f.right, DropTargetBehavior::new().with_scrolling_mode(ScrollingMode::None));
        let mut script = Script::new(vec![Step::Over(f.right, Point::new(250.0, 195.0))]);
        assert_eq!(drag_first_row(&mut f, &mut dnd, &mut script), Ok(Some(DragDropEffects::empty())));
        assert_eq!(script.over, vec![DragDropEffects::MOVE]);
        assert_eq!(f.host.scroll_log().len(), 1);
    }

    #[test]
    fn preview_follows_the_poll_and_stops_with_the_drag() {
        let mut f = fixture();
        let mut dnd = coordinator(&f);
        let mut poll = FakePoll::default();
        let mut script = Script::new(vec![Step::Poll(Point::new(50.0, 50.0))]);
        script.poll = Rc::clone(&poll.callback);

        assert!(dnd.pointer_down(
            &f.host,
            f.left_rows[0],
            Point::new(10.0, 10.0),
            MouseButton::Left,
            1,
            KeyStates::LEFT_BUTTON,
        ), "item 2 is still in the source list");
        let result = dnd.pointer_move(
            &mut f.host,
            &mut script,
            Some(&mut poll as &mut dyn PointerPoll),
            Point::new(10.0, 30.0),
            KeyStates::LEFT_BUTTON,
        );
        assert_eq!(result, Ok(Some(DragDropEffects::empty())));
        // Anchored at the bottom-left corner of a 100x20 row.
        assert_eq!(script.previews, vec![Some(Rect::new(50.0, 30.0, 150.0, 50.0))]);
        assert_eq!(poll.stops, 1);
        assert!(poll.callback.borrow().is_none());
        assert_idle(&dnd);
    }

    #[test]
    fn small_moves_and_unregistered_presses_do_nothing() {
        let mut f = fixture();
        let mut dnd = coordinator(&f);
        let mut script = Script::new(vec![Step::Fail]);

        assert!(dnd.pointer_down(
            &f.host,
            f.left_rows[0],
            Point::new(10.0, 10.0),
            MouseButton::Left,
            1,
            KeyStates::LEFT_BUTTON,
        ), "item 2 is still in the source list");
        let result = dnd.pointer_move(&mut f.host, &mut script, None, Point::new(12.0, 13.0), KeyStates::LEFT_BUTTON);
        assert_eq!(result, Ok(None));
        assert!(script.started.is_none());
        assert!(!dnd.pointer_up(&mut f.host));

        // The right list is a target only.
        assert!(!dnd.pointer_down(
            &f.host,
            f.right_rows[0],
            Point::new(210.0, 10.0),
            MouseButton::Left,
            1,
            KeyStates::LEFT_BUTTON
        ));
        dnd.set_drag_ignored(f.left_rows[0], true);
        assert!(!dnd.pointer_down(
            &f.host,
            f.left_rows[0],
            Point::new(10.0, 10.0),
            MouseButton::Left,
            1,
            KeyStates::LEFT_BUTTON
        ));
    }
}
