//! Error types

use thiserror::Error;

/// Errors surfaced by interactables and the reflow engine
///
/// All of these are caller-contract violations detected before any state is
/// mutated. Once a reflow sequence has begun it cannot fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraspError {
    /// The action name is not registered in the scope's action registry
    #[error("Invalid action name: {0:?} is not a registered action")]
    InvalidActionName(String),

    /// No rect checker is configured, or it could not measure the target
    #[error("Measurement unavailable: no rect could be measured for the target")]
    MeasurementUnavailable,

    /// The interactable was unset from its scope
    #[error("Interactable has been unset")]
    InteractableUnset,

    /// The scope owning this object no longer exists
    #[error("Scope has been dropped")]
    ScopeDropped,

    /// The completion sender went away before the reflow resolved
    #[error("Reflow was abandoned before it completed")]
    ReflowAbandoned,
}

/// Result type for grasp operations
pub type Result<T> = std::result::Result<T, GraspError>;
