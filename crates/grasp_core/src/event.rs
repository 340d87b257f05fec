//! Synthesized interaction events and listener storage
//!
//! Every phase of an interaction produces an [`InteractEvent`] whose type is
//! the action name followed by the phase tag, e.g. `dragstart` or
//! `testreflow`. Interactables fan events out to their own listeners first,
//! then to the scope-wide ones.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::actions::ActionProps;
use crate::geometry::{Point, Rect};
use crate::interactable::Interactable;
use crate::interaction::Interaction;

/// Lifecycle phase tag of a synthesized event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventPhase {
    Reflow,
    Start,
    Move,
    End,
}

impl EventPhase {
    /// All phases, in firing order
    pub const ALL: [EventPhase; 4] = [
        EventPhase::Reflow,
        EventPhase::Start,
        EventPhase::Move,
        EventPhase::End,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventPhase::Reflow => "reflow",
            EventPhase::Start => "start",
            EventPhase::Move => "move",
            EventPhase::End => "end",
        }
    }
}

/// Event type string for an action and phase (`"drag"` + `Move` → `"dragmove"`)
pub fn event_type(action: &str, phase: EventPhase) -> String {
    format!("{action}{}", phase.as_str())
}

/// An event synthesized for one phase of an interaction
#[derive(Clone, Debug)]
pub struct InteractEvent {
    /// `"<action><phase>"`
    pub event_type: String,
    pub phase: EventPhase,
    /// The action the interaction is prepared for
    pub action: ActionProps,
    pub interaction: Interaction,
    pub interactable: Interactable,
    /// Page coordinates at this tick
    pub page: Point,
    /// Client coordinates at this tick
    pub client: Point,
    /// Offset from the previous tick (move events only)
    pub delta: Option<Point>,
    /// The measured rect the interaction was seeded from
    pub rect: Rect,
    /// Milliseconds since the scope was created
    pub time_stamp: f64,
}

new_key_type! {
    /// Handle for removing an event listener
    pub struct ListenerId;
}

/// Callback for synthesized events
///
/// Uses Rc since interactions are single-threaded.
pub type EventListener = Rc<dyn Fn(&InteractEvent)>;

#[derive(Default)]
struct ListenersInner {
    listeners: SlotMap<ListenerId, (String, EventListener)>,
    by_type: FxHashMap<String, SmallVec<[ListenerId; 2]>>,
}

/// Listeners keyed by event type
#[derive(Default)]
pub struct EventListeners {
    inner: RefCell<ListenersInner>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for an event type
    pub fn on<F>(&self, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&InteractEvent) + 'static,
    {
        let listener: EventListener = Rc::new(listener);
        let mut inner = self.inner.borrow_mut();
        let id = inner
            .listeners
            .insert((event_type.to_string(), listener));
        inner
            .by_type
            .entry(event_type.to_string())
            .or_default()
            .push(id);
        id
    }

    /// Remove a listener. Returns false if it was already removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some((event_type, _)) = inner.listeners.remove(id) else {
            return false;
        };
        if let Some(ids) = inner.by_type.get_mut(&event_type) {
            ids.retain(|l| *l != id);
            if ids.is_empty() {
                inner.by_type.remove(&event_type);
            }
        }
        true
    }

    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.inner.borrow().by_type.contains_key(event_type)
    }

    /// Call every listener for the event's type, in registration order
    pub fn dispatch(&self, event: &InteractEvent) {
        let listeners: SmallVec<[EventListener; 2]> = {
            let inner = self.inner.borrow();
            match inner.by_type.get(&event.event_type) {
                Some(ids) => ids
                    .iter()
                    .filter_map(|id| inner.listeners.get(*id))
                    .map(|(_, listener)| listener.clone())
                    .collect(),
                None => return,
            }
        };
        for listener in listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &self.inner.borrow().listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        assert_eq!(event_type("test", EventPhase::Reflow), "testreflow");
        assert_eq!(event_type("drag", EventPhase::Move), "dragmove");
        assert_eq!(event_type("resize", EventPhase::End), "resizeend");
    }

    #[test]
    fn test_listener_registration() {
        let listeners = EventListeners::new();
        let id = listeners.on("dragstart", |_| {});
        assert!(listeners.has_listeners("dragstart"));
        assert!(!listeners.has_listeners("dragend"));

        assert!(listeners.off(id));
        assert!(!listeners.off(id));
        assert!(!listeners.has_listeners("dragstart"));
    }
}
