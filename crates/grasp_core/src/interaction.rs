//! In-flight interactions
//!
//! An [`Interaction`] tracks one gesture: where it started, where it is now,
//! which pointers are down, and which lifecycle phase it has reached.
//!
//! ```text
//! Created → Reflowed → Started → Moved → Ending → Ended
//!              │                            ▲        ▲
//!              └── start refused ───────────┼────────┘
//!                                   veto holds here until stop()
//! ```
//!
//! Phase primitives here (`start`, `do_move`, `finish`) fire the synthesized
//! events. The reflow engine drives them in order. Handles are cheap `Rc`
//! clones and compare by identity.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tokio::sync::watch;

use crate::actions::{ActionProps, Axis};
use crate::event::{event_type, EventPhase, InteractEvent};
use crate::geometry::{Coords, Point, Rect};
use crate::interactable::Interactable;
use crate::scope::{Scope, ScopeInner};
use crate::signals::{channels, SignalPayload};

/// Scope-unique identifier of an interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionId(pub u64);

/// Identifier of a pointer taking part in an interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

impl PointerId {
    /// The pointer a reflow enqueues in place of real input
    pub const SYNTHETIC: PointerId = PointerId(u32::MAX);
}

/// Kind of input driving an interaction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerType {
    #[default]
    Mouse,
    Touch,
    Pen,
    /// No real input; the interaction replays a measured rect
    Reflow,
}

/// Lifecycle phase of an interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InteractionPhase {
    Created,
    Reflowed,
    Started,
    Moved,
    /// The pointer is up and the end is pending; the only vetoable phase
    Ending,
    Ended,
}

struct InteractionState {
    interactable: Option<Interactable>,
    prepared: Option<ActionProps>,
    rect: Rect,
    start_coords: Coords,
    prev_coords: Coords,
    cur_coords: Coords,
    pointers: SmallVec<[PointerId; 2]>,
    pointer_is_down: bool,
    pointer_was_moved: bool,
    interacting: bool,
    phase: InteractionPhase,
    /// Nesting depth of synchronous sequences on the call stack
    sequence_depth: u32,
    /// `stop()` was called while a sequence was running
    stop_requested: bool,
}

struct InteractionInner {
    id: InteractionId,
    pointer_type: PointerType,
    scope: Weak<ScopeInner>,
    state: RefCell<InteractionState>,
    /// Flips to `true` exactly once, when the interaction reaches `Ended`
    completion: watch::Sender<bool>,
}

/// Handle to one in-flight gesture
#[derive(Clone)]
pub struct Interaction {
    inner: Rc<InteractionInner>,
}

impl Interaction {
    pub(crate) fn new(scope: &Scope, id: InteractionId, pointer_type: PointerType) -> Self {
        let (completion, _) = watch::channel(false);
        let now = Coords::at(Point::ZERO, scope.now());
        Self {
            inner: Rc::new(InteractionInner {
                id,
                pointer_type,
                scope: scope.downgrade(),
                state: RefCell::new(InteractionState {
                    interactable: None,
                    prepared: None,
                    rect: Rect::default(),
                    start_coords: now,
                    prev_coords: now,
                    cur_coords: now,
                    pointers: SmallVec::new(),
                    pointer_is_down: false,
                    pointer_was_moved: false,
                    interacting: false,
                    phase: InteractionPhase::Created,
                    sequence_depth: 0,
                    stop_requested: false,
                }),
                completion,
            }),
        }
    }

    pub fn id(&self) -> InteractionId {
        self.inner.id
    }

    pub fn pointer_type(&self) -> PointerType {
        self.inner.pointer_type
    }

    /// The interactable this interaction is bound to
    pub fn interactable(&self) -> Option<Interactable> {
        self.inner.state.borrow().interactable.clone()
    }

    /// The action this interaction is prepared for
    pub fn prepared(&self) -> Option<ActionProps> {
        self.inner.state.borrow().prepared.clone()
    }

    pub fn phase(&self) -> InteractionPhase {
        self.inner.state.borrow().phase
    }

    /// True from a successful start until the interaction ends
    pub fn interacting(&self) -> bool {
        self.inner.state.borrow().interacting
    }

    pub fn rect(&self) -> Rect {
        self.inner.state.borrow().rect
    }

    pub fn start_coords(&self) -> Coords {
        self.inner.state.borrow().start_coords
    }

    pub fn prev_coords(&self) -> Coords {
        self.inner.state.borrow().prev_coords
    }

    pub fn cur_coords(&self) -> Coords {
        self.inner.state.borrow().cur_coords
    }

    /// Steer the current page position
    ///
    /// Called from `before-action-move` handlers; the next move event's
    /// delta is measured against the previous tick.
    pub fn set_cur_page(&self, page: Point) {
        self.inner.state.borrow_mut().cur_coords.page = page;
    }

    pub fn set_cur_coords(&self, coords: Coords) {
        self.inner.state.borrow_mut().cur_coords = coords;
    }

    pub fn pointers(&self) -> Vec<PointerId> {
        self.inner.state.borrow().pointers.to_vec()
    }

    pub fn pointer_count(&self) -> usize {
        self.inner.state.borrow().pointers.len()
    }

    pub fn pointer_is_down(&self) -> bool {
        self.inner.state.borrow().pointer_is_down
    }

    /// Whether the pointer has travelled beyond the scope's move tolerance
    pub fn pointer_was_moved(&self) -> bool {
        self.inner.state.borrow().pointer_was_moved
    }

    /// True once the interaction has reached `Ended`
    pub fn is_complete(&self) -> bool {
        *self.inner.completion.borrow()
    }

    /// Stop the interaction
    ///
    /// In `Ending` this fires the pending end event and completes normally.
    /// While a synchronous sequence is still running, the stop is latched and
    /// the sequence completes without waiting on a veto. Interactions that
    /// are not in a sequence end without an end event. Stopping an ended
    /// interaction does nothing.
    pub fn stop(&self) {
        let (phase, in_sequence) = {
            let state = self.inner.state.borrow();
            (state.phase, state.sequence_depth > 0)
        };

        match phase {
            InteractionPhase::Ended => {}
            _ if in_sequence => {
                tracing::trace!(interaction = self.id().0, "stop latched during sequence");
                self.inner.state.borrow_mut().stop_requested = true;
            }
            InteractionPhase::Ending => self.finish(),
            _ => self.terminate(),
        }
    }

    // =========================================================================
    // Phase primitives
    // =========================================================================

    pub(crate) fn prepare(
        &self,
        interactable: &Interactable,
        action: ActionProps,
        rect: Rect,
        coords: Coords,
    ) {
        self.with_state(|s| {
            s.interactable = Some(interactable.clone());
            s.prepared = Some(action);
            s.rect = rect;
            s.start_coords = coords;
            s.prev_coords = coords;
            s.cur_coords = coords;
        });
    }

    pub(crate) fn pointer_down(&self, pointer: PointerId) {
        self.with_state(|s| {
            if !s.pointers.contains(&pointer) {
                s.pointers.push(pointer);
            }
            s.pointer_is_down = true;
        });
    }

    pub(crate) fn pointer_up(&self, pointer: PointerId) {
        self.with_state(|s| {
            s.pointers.retain(|p| *p != pointer);
            s.pointer_is_down = false;
        });
    }

    pub(crate) fn set_phase(&self, phase: InteractionPhase) {
        self.inner.state.borrow_mut().phase = phase;
    }

    pub(crate) fn begin_sequence(&self) {
        self.inner.state.borrow_mut().sequence_depth += 1;
    }

    /// Leave one sequence level
    ///
    /// Returns whether `stop()` was latched meanwhile, but only when the
    /// outermost level exits. Nested levels leave the latch in place.
    pub(crate) fn end_sequence(&self) -> bool {
        self.with_state(|s| {
            s.sequence_depth = s.sequence_depth.saturating_sub(1);
            s.sequence_depth == 0 && std::mem::take(&mut s.stop_requested)
        })
    }

    pub(crate) fn completion(&self) -> watch::Receiver<bool> {
        self.inner.completion.subscribe()
    }

    pub(crate) fn payload(&self) -> SignalPayload {
        SignalPayload::Interaction(self.clone())
    }

    /// Try to start the prepared action, firing `<name>start` on success
    pub(crate) fn start(&self) -> bool {
        let Some(scope) = self.scope() else {
            return false;
        };
        let (Some(interactable), Some(action)) = (self.interactable(), self.prepared()) else {
            return false;
        };

        let settings = interactable.action_settings(&action.name);
        if !settings.enabled {
            tracing::debug!(action = %action.name, "action disabled; not starting");
            return false;
        }
        if let Some(max) = settings.max {
            let running = scope
                .interactions()
                .count_running(&interactable, &action.name, self);
            if running >= max {
                tracing::debug!(action = %action.name, max, "interaction limit reached");
                return false;
            }
        }
        if scope
            .signals()
            .fire(channels::BEFORE_ACTION_START, &self.payload())
            .is_veto()
        {
            tracing::debug!(action = %action.name, "start vetoed");
            return false;
        }

        self.with_state(|s| {
            s.interacting = true;
            s.start_coords = s.cur_coords;
            s.prev_coords = s.cur_coords;
            s.phase = InteractionPhase::Started;
        });
        self.fire_phase(EventPhase::Start, None);
        true
    }

    /// Fire `before-action-move`, then `<name>move` with the delta since the
    /// previous tick
    pub(crate) fn do_move(&self) {
        let Some(scope) = self.scope() else {
            return;
        };
        let now = scope.now();
        self.with_state(|s| s.cur_coords.time_stamp = now);

        scope
            .signals()
            .fire(channels::BEFORE_ACTION_MOVE, &self.payload());

        let tolerance = scope.interactions().pointer_move_tolerance();
        let delta = self.with_state(|s| {
            let mut delta = s.cur_coords.page - s.prev_coords.page;
            match s.prepared.as_ref().and_then(|action| action.axis) {
                Some(Axis::X) => delta.y = 0.0,
                Some(Axis::Y) => delta.x = 0.0,
                _ => {}
            }
            if (s.cur_coords.page - s.start_coords.page).hypot() > tolerance {
                s.pointer_was_moved = true;
            }
            delta
        });

        self.fire_phase(EventPhase::Move, Some(delta));

        self.with_state(|s| {
            s.prev_coords = s.cur_coords;
            if s.phase == InteractionPhase::Started {
                s.phase = InteractionPhase::Moved;
            }
        });
    }

    /// Fire `<name>end` and complete
    pub(crate) fn finish(&self) {
        let already_ended = self.with_state(|s| {
            let ended = s.phase == InteractionPhase::Ended;
            s.phase = InteractionPhase::Ended;
            ended
        });
        if already_ended {
            return;
        }

        self.fire_phase(EventPhase::End, None);

        self.with_state(|s| {
            s.interacting = false;
            s.pointers.clear();
            s.pointer_is_down = false;
        });
        self.release();
    }

    /// Complete without an end event
    pub(crate) fn terminate(&self) {
        let already_ended = self.with_state(|s| {
            let ended = s.phase == InteractionPhase::Ended;
            s.phase = InteractionPhase::Ended;
            s.interacting = false;
            s.pointers.clear();
            s.pointer_is_down = false;
            ended
        });
        if !already_ended {
            self.release();
        }
    }

    pub(crate) fn fire_phase(&self, phase: EventPhase, delta: Option<Point>) {
        let event = {
            let s = self.inner.state.borrow();
            let (Some(interactable), Some(action)) = (s.interactable.clone(), s.prepared.clone())
            else {
                return;
            };
            InteractEvent {
                event_type: event_type(&action.name, phase),
                phase,
                action,
                interaction: self.clone(),
                interactable,
                page: s.cur_coords.page,
                client: s.cur_coords.client,
                delta,
                rect: s.rect,
                time_stamp: s.cur_coords.time_stamp,
            }
        };

        tracing::trace!(
            interaction = self.id().0,
            event = %event.event_type,
            x = event.page.x,
            y = event.page.y,
            "fire"
        );
        event.interactable.fire(&event);
    }

    /// Leave the scope list, announce the stop, and resolve completion
    fn release(&self) {
        if let Some(scope) = self.scope() {
            scope.interactions().remove(self);
            scope.signals().fire(channels::STOP, &self.payload());
        }
        self.inner.completion.send_replace(true);
        tracing::debug!(interaction = self.id().0, "interaction completed");
    }

    fn scope(&self) -> Option<Scope> {
        Scope::upgrade(&self.inner.scope)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut InteractionState) -> R) -> R {
        let mut guard = self.inner.state.borrow_mut();
        f(&mut guard)
    }
}

impl PartialEq for Interaction {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Interaction {}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Interaction")
            .field("id", &self.inner.id)
            .field("pointer_type", &self.inner.pointer_type)
            .field("phase", &state.phase)
            .field("interacting", &state.interacting)
            .field("pointers", &state.pointers.len())
            .finish()
    }
}

/// The scope's ordered list of active interactions
#[derive(Debug)]
pub struct InteractionList {
    list: RefCell<Vec<Interaction>>,
    pointer_move_tolerance: Cell<f64>,
}

impl InteractionList {
    pub(crate) fn new(pointer_move_tolerance: f64) -> Self {
        Self {
            list: RefCell::new(Vec::new()),
            pointer_move_tolerance: Cell::new(pointer_move_tolerance),
        }
    }

    /// Snapshot of the active interactions, oldest first
    pub fn list(&self) -> Vec<Interaction> {
        self.list.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.list.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.borrow().is_empty()
    }

    pub fn contains(&self, interaction: &Interaction) -> bool {
        self.list.borrow().contains(interaction)
    }

    /// First interaction matching `predicate`, oldest first
    pub fn find(&self, predicate: impl Fn(&Interaction) -> bool) -> Option<Interaction> {
        self.list().into_iter().find(|interaction| predicate(interaction))
    }

    pub fn pointer_move_tolerance(&self) -> f64 {
        self.pointer_move_tolerance.get()
    }

    pub fn set_pointer_move_tolerance(&self, tolerance: f64) {
        self.pointer_move_tolerance.set(tolerance);
    }

    pub(crate) fn push(&self, interaction: Interaction) {
        self.list.borrow_mut().push(interaction);
    }

    pub(crate) fn remove(&self, interaction: &Interaction) -> bool {
        let mut list = self.list.borrow_mut();
        match list.iter().position(|i| i == interaction) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Interactions other than `excluding` that are running `action` on `interactable`
    pub(crate) fn count_running(
        &self,
        interactable: &Interactable,
        action: &str,
        excluding: &Interaction,
    ) -> usize {
        self.list()
            .iter()
            .filter(|i| *i != excluding && i.interacting())
            .filter(|i| i.interactable().as_ref() == Some(interactable))
            .filter(|i| i.prepared().is_some_and(|p| p.name == action))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Propagation;
    use crate::Target;

    fn prepared_interaction(scope: &Scope) -> (Interactable, Interaction) {
        let interactable = scope.interactable(Target::element(7));
        let interaction = scope.new_interaction(PointerType::Mouse);
        let rect = Rect::new(10.0, 20.0, 60.0, 120.0);
        interaction.prepare(
            &interactable,
            ActionProps::drag(),
            rect,
            Coords::at(rect.origin(), scope.now()),
        );
        interaction.pointer_down(PointerId(1));
        (interactable, interaction)
    }

    #[test]
    fn test_new_interaction_is_listed_and_idle() {
        let scope = Scope::new();
        let interaction = scope.new_interaction(PointerType::Touch);

        assert!(scope.interactions().contains(&interaction));
        assert_eq!(interaction.phase(), InteractionPhase::Created);
        assert_eq!(interaction.pointer_type(), PointerType::Touch);
        assert!(!interaction.interacting());
        assert!(!interaction.pointer_is_down());
        assert!(interaction.interactable().is_none());
    }

    #[test]
    fn test_pointer_bookkeeping() {
        let scope = Scope::new();
        let (_, interaction) = prepared_interaction(&scope);
        interaction.pointer_down(PointerId(1));
        interaction.pointer_down(PointerId(2));
        assert_eq!(interaction.pointers(), vec![PointerId(1), PointerId(2)]);
        assert!(interaction.pointer_is_down());

        interaction.pointer_up(PointerId(1));
        interaction.pointer_up(PointerId(2));
        assert_eq!(interaction.pointer_count(), 0);
        assert!(!interaction.pointer_is_down());
    }

    #[test]
    fn test_start_respects_disabled_action() {
        let scope = Scope::new();
        let (interactable, interaction) = prepared_interaction(&scope);
        interactable.update_options(|o| {
            o.set_enabled("drag", false);
        });

        assert!(!interaction.start());
        assert!(!interaction.interacting());
    }

    #[test]
    fn test_start_respects_max() {
        let scope = Scope::new();
        let (interactable, first) = prepared_interaction(&scope);
        interactable.update_options(|o| {
            o.set_max("drag", Some(1));
        });
        assert!(first.start());

        let second = scope.new_interaction(PointerType::Mouse);
        second.prepare(
            &interactable,
            ActionProps::drag(),
            first.rect(),
            first.start_coords(),
        );
        assert!(!second.start());

        first.stop();
        assert!(second.start());
    }

    #[test]
    fn test_before_action_start_veto() {
        let scope = Scope::new();
        let (_, interaction) = prepared_interaction(&scope);
        scope
            .signals()
            .on(channels::BEFORE_ACTION_START, |_| Propagation::Veto);

        assert!(!interaction.start());
        assert_eq!(interaction.phase(), InteractionPhase::Created);
    }

    #[test]
    fn test_axis_constrains_move_delta() {
        let scope = Scope::new();
        let interactable = scope.interactable(Target::element(3));
        let interaction = scope.new_interaction(PointerType::Mouse);
        interaction.prepare(
            &interactable,
            ActionProps::drag().with_axis(Axis::X),
            Rect::default(),
            Coords::default(),
        );
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let sink = deltas.clone();
        interactable.on("dragmove", move |e| sink.borrow_mut().push(e.delta));

        assert!(interaction.start());
        interaction.set_cur_page(Point::new(30.0, 40.0));
        interaction.do_move();

        assert_eq!(*deltas.borrow(), vec![Some(Point::new(30.0, 0.0))]);
        assert_eq!(interaction.prev_coords().page, Point::new(30.0, 40.0));
        assert_eq!(interaction.phase(), InteractionPhase::Moved);
    }

    #[test]
    fn test_pointer_was_moved_uses_tolerance() {
        let scope = Scope::new();
        scope.interactions().set_pointer_move_tolerance(5.0);
        let (_, interaction) = prepared_interaction(&scope);
        assert!(interaction.start());

        let origin = interaction.start_coords().page;
        interaction.set_cur_page(origin + Point::new(3.0, 4.0));
        interaction.do_move();
        assert!(!interaction.pointer_was_moved());

        interaction.set_cur_page(origin + Point::new(6.0, 0.0));
        interaction.do_move();
        assert!(interaction.pointer_was_moved());
    }

    #[test]
    fn test_stop_outside_sequence_terminates_without_end() {
        let scope = Scope::new();
        let (interactable, interaction) = prepared_interaction(&scope);
        let ends = Rc::new(Cell::new(0));
        let counter = ends.clone();
        interactable.on("dragend", move |_| counter.set(counter.get() + 1));
        let stops = Rc::new(Cell::new(0));
        let counter = stops.clone();
        scope
            .signals()
            .on(channels::STOP, move |_| counter.set(counter.get() + 1));

        assert!(interaction.start());
        interaction.stop();
        interaction.stop();

        assert_eq!(ends.get(), 0);
        assert_eq!(stops.get(), 1);
        assert_eq!(interaction.phase(), InteractionPhase::Ended);
        assert!(!interaction.interacting());
        assert!(interaction.is_complete());
        assert!(!scope.interactions().contains(&interaction));
    }

    #[test]
    fn test_stop_in_ending_fires_end_once() {
        let scope = Scope::new();
        let (interactable, interaction) = prepared_interaction(&scope);
        let ends = Rc::new(Cell::new(0));
        let counter = ends.clone();
        let reentrant = interaction.clone();
        interactable.on("dragend", move |_| {
            counter.set(counter.get() + 1);
            reentrant.stop();
        });

        assert!(interaction.start());
        interaction.set_phase(InteractionPhase::Ending);
        interaction.stop();

        assert_eq!(ends.get(), 1);
        assert!(interaction.is_complete());
    }

    #[test]
    fn test_nested_sequence_keeps_latch_for_outermost() {
        let scope = Scope::new();
        let (_, interaction) = prepared_interaction(&scope);
        interaction.begin_sequence();
        interaction.begin_sequence();
        interaction.stop();

        assert!(!interaction.end_sequence());
        // Still inside the outer sequence
        interaction.stop();
        assert_eq!(interaction.phase(), InteractionPhase::Created);
        assert!(interaction.end_sequence());
        assert!(!interaction.end_sequence());
    }

    #[test]
    fn test_set_cur_coords_steers_page_and_client() {
        let scope = Scope::new();
        let (interactable, interaction) = prepared_interaction(&scope);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        interactable.on("dragmove", move |e| sink.borrow_mut().push((e.page, e.client)));

        assert!(interaction.start());
        let start = interaction.start_coords();
        interaction.set_cur_coords(Coords {
            page: start.page + Point::new(5.0, 5.0),
            client: Point::new(1.0, 2.0),
            time_stamp: start.time_stamp,
        });
        interaction.do_move();

        assert_eq!(
            *events.borrow(),
            vec![(start.page + Point::new(5.0, 5.0), Point::new(1.0, 2.0))]
        );
    }

    #[test]
    fn test_stop_is_latched_during_sequence() {
        let scope = Scope::new();
        let (_, interaction) = prepared_interaction(&scope);
        interaction.begin_sequence();
        interaction.stop();

        assert_eq!(interaction.phase(), InteractionPhase::Created);
        assert!(interaction.end_sequence());
        assert!(!interaction.end_sequence());
    }
}
