//! Target identity for interactables

use std::fmt;

/// Host-assigned identifier of a concrete element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// What an interactable is attached to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// A single element
    Element(ElementId),
    /// Every element matching a selector, as resolved by the host
    Selector(String),
}

impl Target {
    pub fn element(id: u64) -> Self {
        Target::Element(ElementId(id))
    }

    pub fn selector(selector: impl Into<String>) -> Self {
        Target::Selector(selector.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Element(ElementId(id)) => write!(f, "element#{id}"),
            Target::Selector(selector) => write!(f, "{selector}"),
        }
    }
}

/// The document or root a target is resolved in
///
/// The same target in two contexts yields two interactables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

impl ContextId {
    /// The default top-level document
    pub const DOCUMENT: ContextId = ContextId(0);
}
