//! Named-channel signal bus
//!
//! Core components announce lifecycle points (an interaction is about to
//! move, about to end, an interactable was unset) on named channels. Host
//! code subscribes to observe or steer in-flight operations.
//!
//! ```text
//! reflow engine ──fire("before-action-end")──► SignalBus
//!                                                 │ in registration order
//!                                                 ├─► handler A → Continue
//!                                                 └─► handler B → Veto
//!                 ◄──────── Propagation::Veto ────┘
//! ```
//!
//! Every handler on a channel runs, even after one has vetoed. The fire
//! result is [`Propagation::Veto`] when any handler vetoed. Handlers that
//! return `()` count as [`Propagation::Continue`], so only an explicit
//! `Veto` suppresses the default continuation.
//!
//! # Example
//!
//! ```rust
//! use grasp_core::signals::{channels, Propagation, SignalBus};
//!
//! let bus = SignalBus::new();
//! bus.on(channels::BEFORE_ACTION_END, |_| Propagation::Veto);
//! bus.on(channels::BEFORE_ACTION_END, |_| ());
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::interactable::Interactable;
use crate::interaction::Interaction;

/// Channel names used by the core
pub mod channels {
    /// A new interaction was created and pushed to the scope list
    pub const INTERACTION_NEW: &str = "interactions:new";
    /// A new interactable was created in the scope
    pub const INTERACTABLE_NEW: &str = "interactable:new";
    /// An interaction is about to start; vetoable
    pub const BEFORE_ACTION_START: &str = "before-action-start";
    /// An interaction is about to emit a move; subscribers may steer `cur_coords`
    pub const BEFORE_ACTION_MOVE: &str = "before-action-move";
    /// An interaction is about to end; vetoable
    pub const BEFORE_ACTION_END: &str = "before-action-end";
    /// An interaction stopped and left the scope list
    pub const STOP: &str = "stop";
    /// An interactable was unset from the scope
    pub const UNSET: &str = "unset";
}

new_key_type! {
    /// Handle for removing a signal handler
    pub struct SignalHandlerId;
}

/// Outcome of a signal handler
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    /// Let the emitting operation carry on
    #[default]
    Continue,
    /// Suppress the emitting operation's default continuation
    Veto,
}

impl Propagation {
    pub fn is_veto(self) -> bool {
        self == Propagation::Veto
    }
}

impl From<()> for Propagation {
    fn from(_: ()) -> Self {
        Propagation::Continue
    }
}

/// Payload passed to signal handlers
#[derive(Clone, Debug)]
pub enum SignalPayload {
    Interaction(Interaction),
    Interactable(Interactable),
}

impl SignalPayload {
    /// The interaction this signal is about, if any
    pub fn interaction(&self) -> Option<&Interaction> {
        match self {
            SignalPayload::Interaction(interaction) => Some(interaction),
            SignalPayload::Interactable(_) => None,
        }
    }

    /// The interactable this signal is about
    ///
    /// For interaction signals this is the interactable the interaction is
    /// bound to.
    pub fn interactable(&self) -> Option<Interactable> {
        match self {
            SignalPayload::Interaction(interaction) => interaction.interactable(),
            SignalPayload::Interactable(interactable) => Some(interactable.clone()),
        }
    }
}

/// Type-erased signal handler
///
/// Uses Rc since the bus is single-threaded.
pub type SignalHandler = Rc<dyn Fn(&SignalPayload) -> Propagation>;

struct HandlerEntry {
    channel: String,
    handler: SignalHandler,
}

#[derive(Default)]
struct BusInner {
    handlers: SlotMap<SignalHandlerId, HandlerEntry>,
    /// Registration order per channel
    channels: FxHashMap<String, SmallVec<[SignalHandlerId; 4]>>,
}

/// Registry of channel → ordered handlers
#[derive(Default)]
pub struct SignalBus {
    inner: RefCell<BusInner>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler on a channel
    ///
    /// Handlers stay registered until [`SignalBus::off`] removes them.
    pub fn on<F, R>(&self, channel: &str, handler: F) -> SignalHandlerId
    where
        F: Fn(&SignalPayload) -> R + 'static,
        R: Into<Propagation>,
    {
        let handler: SignalHandler =
            Rc::new(move |payload: &SignalPayload| handler(payload).into());
        let mut inner = self.inner.borrow_mut();
        let id = inner.handlers.insert(HandlerEntry {
            channel: channel.to_string(),
            handler,
        });
        inner
            .channels
            .entry(channel.to_string())
            .or_default()
            .push(id);
        id
    }

    /// Remove a handler. Returns false if it was already removed.
    pub fn off(&self, id: SignalHandlerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(entry) = inner.handlers.remove(id) else {
            return false;
        };
        if let Some(ids) = inner.channels.get_mut(&entry.channel) {
            ids.retain(|h| *h != id);
            if ids.is_empty() {
                inner.channels.remove(&entry.channel);
            }
        }
        true
    }

    /// Number of handlers registered on a channel
    pub fn handler_count(&self, channel: &str) -> usize {
        self.inner
            .borrow()
            .channels
            .get(channel)
            .map_or(0, |ids| ids.len())
    }

    /// Invoke every handler on `channel` in registration order
    ///
    /// The handler list is snapshotted first, so handlers may register,
    /// remove, or fire signals themselves.
    pub fn fire(&self, channel: &str, payload: &SignalPayload) -> Propagation {
        let handlers: SmallVec<[SignalHandler; 4]> = {
            let inner = self.inner.borrow();
            match inner.channels.get(channel) {
                Some(ids) => ids
                    .iter()
                    .filter_map(|id| inner.handlers.get(*id))
                    .map(|entry| entry.handler.clone())
                    .collect(),
                None => return Propagation::Continue,
            }
        };

        let mut result = Propagation::Continue;
        for handler in handlers {
            if handler(payload).is_veto() {
                result = Propagation::Veto;
            }
        }

        if result.is_veto() {
            tracing::trace!(channel, "signal vetoed");
        }
        result
    }
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SignalBus")
            .field("handlers", &inner.handlers.len())
            .field("channels", &inner.channels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use crate::Target;
    use std::cell::Cell;

    fn unset_payload() -> SignalPayload {
        let scope = Scope::new();
        SignalPayload::Interactable(scope.interactable(Target::element(1)))
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = SignalBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            bus.on(channels::UNSET, move |_| log.borrow_mut().push(i));
        }
        // Other channels are not invoked
        let other = log.clone();
        bus.on(channels::STOP, move |_| other.borrow_mut().push(99));

        assert_eq!(bus.fire(channels::UNSET, &unset_payload()), Propagation::Continue);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_any_veto_vetoes_and_all_handlers_still_run() {
        let bus = SignalBus::new();
        let calls = Rc::new(Cell::new(0));

        let c = calls.clone();
        bus.on(channels::BEFORE_ACTION_END, move |_| {
            c.set(c.get() + 1);
            Propagation::Veto
        });
        let c = calls.clone();
        bus.on(channels::BEFORE_ACTION_END, move |_| c.set(c.get() + 1));

        assert_eq!(
            bus.fire(channels::BEFORE_ACTION_END, &unset_payload()),
            Propagation::Veto
        );
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_handlers_fire_repeatedly_until_removed() {
        let bus = SignalBus::new();
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let id = bus.on(channels::STOP, move |_| c.set(c.get() + 1));

        let payload = unset_payload();
        bus.fire(channels::STOP, &payload);
        bus.fire(channels::STOP, &payload);
        assert_eq!(calls.get(), 2);

        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert_eq!(bus.handler_count(channels::STOP), 0);

        bus.fire(channels::STOP, &payload);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_handler_can_register_during_fire() {
        let bus = Rc::new(SignalBus::new());
        let inner_bus = bus.clone();
        bus.on(channels::STOP, move |_| {
            inner_bus.on(channels::STOP, |_| ());
        });

        bus.fire(channels::STOP, &unset_payload());
        assert_eq!(bus.handler_count(channels::STOP), 2);
    }

    #[test]
    fn test_fire_without_handlers_continues() {
        let bus = SignalBus::new();
        assert_eq!(bus.fire("nothing-here", &unset_payload()), Propagation::Continue);
    }
}
