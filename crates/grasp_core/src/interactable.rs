//! Per-target interaction configuration
//!
//! An [`Interactable`] is what a host gets back when it marks a target as
//! interactable. It carries the action options for that target, the rect
//! checker used to measure it, and the listeners synthesized events are
//! delivered to.
//!
//! # Example
//!
//! ```rust
//! use grasp_core::{Rect, Scope, Target};
//!
//! let scope = Scope::new();
//! let card = scope.interactable(Target::element(1));
//!
//! card.set_rect_checker(|_| Some(Rect::from_xywh(0.0, 0.0, 200.0, 100.0)))
//!     .on("dragmove", |event| println!("moved by {:?}", event.delta));
//!
//! let reflow = card.reflow("drag").unwrap();
//! assert!(reflow.is_complete());
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::actions::ActionProps;
use crate::error::{GraspError, Result};
use crate::event::{EventListeners, InteractEvent, ListenerId};
use crate::geometry::Rect;
use crate::options::{ActionSettings, InteractableOptions};
use crate::reflow::{self, ReflowHandle};
use crate::scope::{Scope, ScopeInner};
use crate::signals::{channels, SignalPayload};
use crate::target::{ContextId, Target};

/// Callback measuring a target's current bounding rect
pub type RectChecker = Rc<dyn Fn(&Target) -> Option<Rect>>;

struct InteractableInner {
    target: Target,
    context: ContextId,
    scope: Weak<ScopeInner>,
    options: RefCell<InteractableOptions>,
    rect_checker: RefCell<Option<RectChecker>>,
    listeners: EventListeners,
    unset: Cell<bool>,
}

/// Handle to a target's interaction configuration
#[derive(Clone)]
pub struct Interactable {
    inner: Rc<InteractableInner>,
}

impl Interactable {
    pub(crate) fn new(scope: &Scope, target: Target, context: ContextId) -> Self {
        Self {
            inner: Rc::new(InteractableInner {
                target,
                context,
                scope: scope.downgrade(),
                options: RefCell::new(InteractableOptions::new()),
                rect_checker: RefCell::new(None),
                listeners: EventListeners::new(),
                unset: Cell::new(false),
            }),
        }
    }

    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    pub fn context(&self) -> ContextId {
        self.inner.context
    }

    /// The owning scope
    pub fn scope(&self) -> Result<Scope> {
        Scope::upgrade(&self.inner.scope).ok_or(GraspError::ScopeDropped)
    }

    // =========================================================================
    // Options
    // =========================================================================

    pub fn options(&self) -> InteractableOptions {
        self.inner.options.borrow().clone()
    }

    pub fn set_options(&self, options: InteractableOptions) -> &Self {
        *self.inner.options.borrow_mut() = options;
        self
    }

    pub fn update_options(&self, f: impl FnOnce(&mut InteractableOptions)) -> &Self {
        f(&mut self.inner.options.borrow_mut());
        self
    }

    pub fn action_settings(&self, action: &str) -> ActionSettings {
        self.inner.options.borrow().settings(action)
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// Set the callback that measures this target
    pub fn set_rect_checker<F>(&self, checker: F) -> &Self
    where
        F: Fn(&Target) -> Option<Rect> + 'static,
    {
        *self.inner.rect_checker.borrow_mut() = Some(Rc::new(checker));
        self
    }

    pub fn clear_rect_checker(&self) -> &Self {
        self.inner.rect_checker.borrow_mut().take();
        self
    }

    pub fn has_rect_checker(&self) -> bool {
        self.inner.rect_checker.borrow().is_some()
    }

    /// Measure the target now
    ///
    /// Returns `None` without a rect checker, or when the checker cannot
    /// measure the target.
    pub fn rect(&self) -> Option<Rect> {
        let checker = self.inner.rect_checker.borrow().clone()?;
        checker(&self.inner.target)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Listen for a synthesized event type on this interactable
    pub fn on<F>(&self, event_type: &str, listener: F) -> &Self
    where
        F: Fn(&InteractEvent) + 'static,
    {
        self.inner.listeners.on(event_type, listener);
        self
    }

    /// Like [`Interactable::on`], returning the id for [`Interactable::off`]
    pub fn listen<F>(&self, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&InteractEvent) + 'static,
    {
        self.inner.listeners.on(event_type, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.listeners.off(id)
    }

    /// Deliver an event to this interactable's listeners, then the scope's
    pub fn fire(&self, event: &InteractEvent) {
        self.inner.listeners.dispatch(event);
        if let Some(scope) = Scope::upgrade(&self.inner.scope) {
            scope.listeners().dispatch(event);
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Replay an action's `reflow → start → move → end` sequence against the
    /// target's current rect
    ///
    /// Fails before any event fires if the action is not registered or the
    /// target cannot be measured. See [`ReflowHandle`] for completion.
    pub fn reflow(&self, action: impl Into<ActionProps>) -> Result<ReflowHandle> {
        reflow::reflow(self, action.into())
    }

    /// Remove this interactable from its scope
    ///
    /// Interactions bound to it are stopped and the `unset` signal fires.
    /// Unsetting twice does nothing.
    pub fn unset(&self) {
        if self.inner.unset.replace(true) {
            return;
        }
        let Some(scope) = Scope::upgrade(&self.inner.scope) else {
            return;
        };

        scope
            .interactables()
            .remove(&self.inner.target, self.inner.context);

        for interaction in scope.interactions().list() {
            if interaction.interactable().as_ref() == Some(self) {
                interaction.stop();
            }
        }

        scope
            .signals()
            .fire(channels::UNSET, &SignalPayload::Interactable(self.clone()));
        tracing::debug!(target = %self.inner.target, "interactable unset");
    }

    pub fn is_unset(&self) -> bool {
        self.inner.unset.get()
    }
}

impl PartialEq for Interactable {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Interactable {}

impl fmt::Debug for Interactable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interactable")
            .field("target", &self.inner.target)
            .field("context", &self.inner.context)
            .field("unset", &self.inner.unset.get())
            .finish()
    }
}

/// The scope's interactables, in creation order, keyed by target and context
#[derive(Debug, Default)]
pub struct InteractableList {
    map: RefCell<IndexMap<(Target, ContextId), Interactable>>,
}

impl InteractableList {
    pub fn get(&self, target: &Target, context: ContextId) -> Option<Interactable> {
        self.map
            .borrow()
            .get(&(target.clone(), context))
            .cloned()
    }

    pub fn list(&self) -> Vec<Interactable> {
        self.map.borrow().values().cloned().collect()
    }

    pub fn contains(&self, interactable: &Interactable) -> bool {
        self.map.borrow().values().any(|i| i == interactable)
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    pub(crate) fn insert(&self, interactable: Interactable) {
        let key = (interactable.target().clone(), interactable.context());
        self.map.borrow_mut().insert(key, interactable);
    }

    pub(crate) fn remove(&self, target: &Target, context: ContextId) -> Option<Interactable> {
        self.map
            .borrow_mut()
            .shift_remove(&(target.clone(), context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{InteractionPhase, PointerType};
    use crate::signals::Propagation;

    #[test]
    fn test_rect_requires_checker() {
        let scope = Scope::new();
        let interactable = scope.interactable(Target::element(1));
        assert!(!interactable.has_rect_checker());
        assert_eq!(interactable.rect(), None);

        interactable.set_rect_checker(|target| match target {
            Target::Element(_) => Some(Rect::new(1.0, 2.0, 3.0, 4.0)),
            Target::Selector(_) => None,
        });
        assert_eq!(interactable.rect(), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));

        interactable.clear_rect_checker();
        assert_eq!(interactable.rect(), None);
    }

    #[test]
    fn test_listeners_and_scope_listeners_both_receive() {
        let scope = Scope::new();
        let interactable = scope.interactable(Target::element(1));
        interactable.set_rect_checker(|_| Some(Rect::default()));

        let log = Rc::new(RefCell::new(Vec::new()));
        let local = log.clone();
        let id = interactable.listen("dragstart", move |_| local.borrow_mut().push("local"));
        let global = log.clone();
        scope.on("dragstart", move |_| global.borrow_mut().push("scope"));

        interactable.reflow("drag").unwrap();
        assert_eq!(*log.borrow(), vec!["local", "scope"]);

        assert!(interactable.off(id));
        interactable.reflow("drag").unwrap();
        assert_eq!(*log.borrow(), vec!["local", "scope", "scope"]);
    }

    #[test]
    fn test_unset_removes_and_signals() {
        let scope = Scope::new();
        let interactable = scope.interactable(Target::selector(".card"));
        let unset_seen = Rc::new(Cell::new(false));
        let seen = unset_seen.clone();
        let expected = interactable.clone();
        scope.signals().on(channels::UNSET, move |payload| {
            seen.set(payload.interactable().as_ref() == Some(&expected));
        });

        interactable.unset();
        interactable.unset();

        assert!(unset_seen.get());
        assert!(interactable.is_unset());
        assert!(scope.interactables().is_empty());
        assert_eq!(
            interactable.reflow("drag").unwrap_err(),
            GraspError::InteractableUnset
        );
    }

    #[test]
    fn test_unset_stops_bound_interactions() {
        let scope = Scope::new();
        let interactable = scope.interactable(Target::element(5));
        interactable.set_rect_checker(|_| Some(Rect::from_xywh(0.0, 0.0, 10.0, 10.0)));
        scope
            .signals()
            .on(channels::BEFORE_ACTION_END, |_| Propagation::Veto);

        let reflow = interactable.reflow("drag").unwrap();
        let pending = reflow.interaction().clone();
        assert!(pending.interacting());

        let other = scope.new_interaction(PointerType::Mouse);

        interactable.unset();

        assert_eq!(pending.phase(), InteractionPhase::Ended);
        assert!(!pending.interacting());
        assert!(reflow.is_complete());
        // Interactions bound elsewhere are untouched
        assert!(scope.interactions().contains(&other));
    }

    #[test]
    fn test_options_roundtrip_through_handle() {
        let scope = Scope::new();
        let interactable = scope.interactable(Target::element(9));
        interactable.update_options(|o| {
            o.set_enabled("resize", false);
        });
        assert!(!interactable.action_settings("resize").enabled);
        assert!(interactable.action_settings("drag").enabled);

        interactable.set_options(InteractableOptions::new());
        assert!(interactable.action_settings("resize").enabled);
    }
}
