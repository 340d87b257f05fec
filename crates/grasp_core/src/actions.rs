//! Action kinds and the action registry
//!
//! An action is a named capability (`drag`, `resize`, `gesture`, or anything
//! a plugin registers). Reflow only accepts names present in the registry.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::event::{event_type, EventPhase};

/// Constrains which axis a drag moves along
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    #[default]
    Both,
}

/// Which edges a resize acts on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edges {
    pub top: bool,
    pub left: bool,
    pub bottom: bool,
    pub right: bool,
}

impl Edges {
    pub const BOTTOM_RIGHT: Edges = Edges {
        top: false,
        left: false,
        bottom: true,
        right: true,
    };

    pub const ALL: Edges = Edges {
        top: true,
        left: true,
        bottom: true,
        right: true,
    };
}

/// The action an interaction is prepared for
#[derive(Clone, Debug, PartialEq)]
pub struct ActionProps {
    pub name: String,
    pub axis: Option<Axis>,
    pub edges: Option<Edges>,
}

impl ActionProps {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            axis: None,
            edges: None,
        }
    }

    pub fn drag() -> Self {
        Self::new("drag")
    }

    pub fn resize(edges: Edges) -> Self {
        Self::new("resize").with_edges(edges)
    }

    pub fn gesture() -> Self {
        Self::new("gesture")
    }

    /// Restrict movement deltas to one axis
    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn with_edges(mut self, edges: Edges) -> Self {
        self.edges = Some(edges);
        self
    }
}

impl From<&str> for ActionProps {
    fn from(name: &str) -> Self {
        ActionProps::new(name)
    }
}

/// Metadata for a registered action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionKind {
    name: String,
    event_types: Vec<String>,
}

impl ActionKind {
    /// An action with the standard `reflow/start/move/end` event types
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let event_types = EventPhase::ALL
            .iter()
            .map(|phase| event_type(&name, *phase))
            .collect();
        Self { name, event_types }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn event_types(&self) -> &[String] {
        &self.event_types
    }
}

/// Registry of named actions, in registration order
#[derive(Debug, Default)]
pub struct ActionRegistry {
    kinds: RefCell<IndexMap<String, ActionKind>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action. Returns false if the name was already present.
    pub fn register(&self, kind: ActionKind) -> bool {
        let mut kinds = self.kinds.borrow_mut();
        if kinds.contains_key(kind.name()) {
            return false;
        }
        tracing::debug!(action = kind.name(), "registered action");
        kinds.insert(kind.name().to_string(), kind);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.borrow().contains_key(name)
    }

    /// Registered action names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.kinds.borrow().keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<ActionKind> {
        self.kinds.borrow().get(name).cloned()
    }

    /// Every event type any registered action can emit
    pub fn event_types(&self) -> Vec<String> {
        self.kinds
            .borrow()
            .values()
            .flat_map(|kind| kind.event_types().iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.kinds.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_keeps_order_and_rejects_duplicates() {
        let registry = ActionRegistry::new();
        assert!(registry.register(ActionKind::new("drag")));
        assert!(registry.register(ActionKind::new("resize")));
        assert!(!registry.register(ActionKind::new("drag")));

        assert_eq!(registry.names(), vec!["drag", "resize"]);
        assert!(registry.contains("resize"));
        assert!(!registry.contains("spin"));
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.event_types(),
            vec![
                "dragreflow",
                "dragstart",
                "dragmove",
                "dragend",
                "resizereflow",
                "resizestart",
                "resizemove",
                "resizeend",
            ]
        );
    }

    #[test]
    fn test_action_kind_event_types() {
        let kind = ActionKind::new("test");
        assert_eq!(
            kind.event_types(),
            &["testreflow", "teststart", "testmove", "testend"]
        );
    }

    #[test]
    fn test_action_props_builders() {
        let props = ActionProps::resize(Edges::BOTTOM_RIGHT);
        assert_eq!(props.name, "resize");
        assert_eq!(props.edges, Some(Edges::BOTTOM_RIGHT));
        let props = props.with_edges(Edges::ALL);
        assert!(props.edges.is_some_and(|e| e.top && e.left && e.bottom && e.right));

        let props = ActionProps::drag().with_axis(Axis::X);
        assert_eq!(props.axis, Some(Axis::X));
        assert_eq!(ActionProps::from("test"), ActionProps::new("test"));
    }
}
