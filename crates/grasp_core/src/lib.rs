//! Grasp Core
//!
//! Headless interaction engine: interactables, in-flight interactions, a
//! vetoable signal bus, and programmatic reflow of drag, resize, and gesture
//! actions.
//!
//! # Architecture
//!
//! ```text
//! Scope ─┬─ ActionRegistry     registered action kinds
//!        ├─ InteractableList   (target, context) → Interactable
//!        ├─ InteractionList    in-flight Interactions, oldest first
//!        ├─ SignalBus          before-action-* hooks, lifecycle signals
//!        └─ EventListeners     scope-wide <action><phase> listeners
//!
//! Interactable::reflow(action)
//!     → Interaction (synthetic pointer at the rect's top-left)
//!     → reflow / start / move / end events
//!     → ReflowHandle resolves when the end is emitted
//! ```
//!
//! Everything is single-threaded: handles are `Rc` clones and callbacks run
//! synchronously on the caller's stack. No borrow is held while user code
//! runs, so handlers may freely call back into the scope.
//!
//! # Example
//!
//! ```rust
//! use grasp_core::{Point, Rect, Scope, Target};
//! use grasp_core::signals::channels;
//!
//! let scope = Scope::new();
//! let card = scope.interactable(Target::element(1));
//! card.set_rect_checker(|_| Some(Rect::new(100.0, 200.0, 300.0, 400.0)));
//!
//! // Steer the synthetic pointer 10px to the right
//! scope.signals().on(channels::BEFORE_ACTION_MOVE, |payload| {
//!     if let Some(interaction) = payload.interaction() {
//!         let page = interaction.cur_coords().page;
//!         interaction.set_cur_page(page + Point::new(10.0, 0.0));
//!     }
//! });
//!
//! card.on("dragmove", |event| assert_eq!(event.delta, Some(Point::new(10.0, 0.0))));
//! assert!(card.reflow("drag").unwrap().is_complete());
//! ```

pub mod actions;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod interactable;
pub mod interaction;
pub mod options;
pub mod plugin;
pub mod reflow;
pub mod scope;
pub mod signals;
pub mod target;

pub use actions::{ActionKind, ActionProps, ActionRegistry, Axis, Edges};
pub use config::ScopeConfig;
pub use error::{GraspError, Result};
pub use event::{event_type, EventListeners, EventPhase, InteractEvent, ListenerId};
pub use geometry::{Coords, Point, Rect};
pub use interactable::{Interactable, InteractableList, RectChecker};
pub use interaction::{
    Interaction, InteractionId, InteractionList, InteractionPhase, PointerId, PointerType,
};
pub use options::{ActionSettings, InteractableOptions};
pub use plugin::{ActionPlugin, Plugin};
pub use reflow::ReflowHandle;
pub use scope::Scope;
pub use signals::{Propagation, SignalBus, SignalHandlerId, SignalPayload};
pub use target::{ContextId, ElementId, Target};
