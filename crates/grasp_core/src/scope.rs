//! The scope: registry shared by every grasp component
//!
//! A [`Scope`] owns the configuration, the action registry, the interactable
//! and interaction lists, the signal bus, and scope-wide event listeners.
//! It is constructed explicitly and handed to whatever needs it; handles are
//! cheap clones of the same registry.
//!
//! # Example
//!
//! ```rust
//! use grasp_core::{ActionKind, Scope, ScopeConfig, Target};
//!
//! let scope = Scope::with_config(ScopeConfig::bare());
//! scope.actions().register(ActionKind::new("test"));
//!
//! let a = scope.interactable(Target::element(1));
//! let b = scope.interactable(Target::element(1));
//! assert_eq!(a, b);
//! assert_eq!(scope.actions().names(), vec!["test"]);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::actions::ActionRegistry;
use crate::config::ScopeConfig;
use crate::error::Result;
use crate::event::{EventListeners, InteractEvent, ListenerId};
use crate::interactable::{Interactable, InteractableList};
use crate::interaction::{Interaction, InteractionId, InteractionList, PointerType};
use crate::plugin::{ActionPlugin, Plugin};
use crate::signals::{channels, SignalBus, SignalPayload};
use crate::target::{ContextId, Target};

pub(crate) struct ScopeInner {
    config: ScopeConfig,
    signals: SignalBus,
    actions: ActionRegistry,
    interactables: InteractableList,
    interactions: InteractionList,
    listeners: EventListeners,
    /// Installed plugin ids, in install order
    plugins: RefCell<Vec<String>>,
    epoch: Instant,
    next_interaction: Cell<u64>,
}

/// Handle to a grasp registry
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// A scope with [`ScopeConfig::standard`]
    pub fn new() -> Self {
        Self::with_config(ScopeConfig::standard())
    }

    /// A scope with the given configuration
    ///
    /// Every action in `default_actions` is installed as an [`ActionPlugin`].
    pub fn with_config(config: ScopeConfig) -> Self {
        let scope = Self {
            inner: Rc::new(ScopeInner {
                signals: SignalBus::new(),
                actions: ActionRegistry::new(),
                interactables: InteractableList::default(),
                interactions: InteractionList::new(config.pointer_move_tolerance),
                listeners: EventListeners::new(),
                plugins: RefCell::new(Vec::new()),
                epoch: Instant::now(),
                next_interaction: Cell::new(0),
                config,
            }),
        };

        for name in scope.inner.config.default_actions.clone() {
            if let Err(err) = scope.use_plugin(&ActionPlugin::new(name.as_str())) {
                tracing::warn!(action = %name, %err, "skipping default action");
            }
        }
        scope
    }

    pub(crate) fn downgrade(&self) -> Weak<ScopeInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<ScopeInner>) -> Option<Scope> {
        weak.upgrade().map(|inner| Scope { inner })
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.inner.config
    }

    pub fn signals(&self) -> &SignalBus {
        &self.inner.signals
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.inner.actions
    }

    pub fn interactables(&self) -> &InteractableList {
        &self.inner.interactables
    }

    pub fn interactions(&self) -> &InteractionList {
        &self.inner.interactions
    }

    /// Milliseconds since the scope was created
    pub fn now(&self) -> f64 {
        self.inner.epoch.elapsed().as_secs_f64() * 1000.0
    }

    // =========================================================================
    // Interactables
    // =========================================================================

    /// Get or create the interactable for a target in the default document
    pub fn interactable(&self, target: Target) -> Interactable {
        self.interactable_in(target, ContextId::DOCUMENT)
    }

    /// Get or create the interactable for a target in a context
    pub fn interactable_in(&self, target: Target, context: ContextId) -> Interactable {
        if let Some(existing) = self.inner.interactables.get(&target, context) {
            return existing;
        }

        tracing::debug!(%target, ?context, "new interactable");
        let interactable = Interactable::new(self, target, context);
        self.inner.interactables.insert(interactable.clone());
        self.inner.signals.fire(
            channels::INTERACTABLE_NEW,
            &SignalPayload::Interactable(interactable.clone()),
        );
        interactable
    }

    /// Look up an existing interactable without creating one
    pub fn find_interactable(&self, target: &Target, context: ContextId) -> Option<Interactable> {
        self.inner.interactables.get(target, context)
    }

    // =========================================================================
    // Interactions
    // =========================================================================

    /// Create an interaction and push it to the interaction list
    pub(crate) fn new_interaction(&self, pointer_type: PointerType) -> Interaction {
        let id = self.inner.next_interaction.get();
        self.inner.next_interaction.set(id + 1);

        let interaction = Interaction::new(self, InteractionId(id), pointer_type);
        self.inner.interactions.push(interaction.clone());
        self.inner
            .signals
            .fire(channels::INTERACTION_NEW, &interaction.payload());
        interaction
    }

    // =========================================================================
    // Scope-wide listeners
    // =========================================================================

    /// Listen for an event type on every interactable in this scope
    pub fn on<F>(&self, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&InteractEvent) + 'static,
    {
        self.inner.listeners.on(event_type, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.listeners.off(id)
    }

    pub(crate) fn listeners(&self) -> &EventListeners {
        &self.inner.listeners
    }

    // =========================================================================
    // Plugins
    // =========================================================================

    /// Install a plugin
    ///
    /// Returns `Ok(false)` if a plugin with the same id is already installed.
    pub fn use_plugin(&self, plugin: &dyn Plugin) -> Result<bool> {
        let id = plugin.id();
        if self.is_installed(id) {
            return Ok(false);
        }
        plugin.install(self)?;
        self.inner.plugins.borrow_mut().push(id.to_string());
        tracing::debug!(plugin = id, "installed plugin");
        Ok(true)
    }

    pub fn is_installed(&self, plugin_id: &str) -> bool {
        self.inner.plugins.borrow().iter().any(|id| id == plugin_id)
    }

    /// Installed plugin ids, in install order
    pub fn plugins(&self) -> Vec<String> {
        self.inner.plugins.borrow().clone()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("actions", &self.inner.actions.names())
            .field("interactables", &self.inner.interactables.len())
            .field("interactions", &self.inner.interactions.len())
            .finish()
    }
}
