//! Scope configuration presets

use serde::{Deserialize, Serialize};

/// Configuration for a [`Scope`](crate::Scope)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Distance a pointer must travel from its start before it counts as moved
    pub pointer_move_tolerance: f64,
    /// Actions installed as plugins when the scope is created
    pub default_actions: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ScopeConfig {
    /// Standard configuration with the drag, resize, and gesture actions
    pub fn standard() -> Self {
        Self {
            pointer_move_tolerance: 1.0,
            default_actions: vec!["drag".into(), "resize".into(), "gesture".into()],
        }
    }

    /// No actions registered; plugins add them explicitly
    pub fn bare() -> Self {
        Self {
            pointer_move_tolerance: 1.0,
            default_actions: Vec::new(),
        }
    }

    /// Set the pointer move tolerance
    pub fn with_pointer_move_tolerance(mut self, tolerance: f64) -> Self {
        self.pointer_move_tolerance = tolerance;
        self
    }

    /// Replace the default action list
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_actions = actions.into_iter().map(Into::into).collect();
        self
    }
}
