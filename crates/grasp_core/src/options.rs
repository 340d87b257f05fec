//! Per-interactable action options

use rustc_hash::FxHashMap;

/// Settings for one action on one interactable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionSettings {
    /// Whether the action may start at all
    pub enabled: bool,
    /// Maximum concurrent interactions of this action on the interactable
    pub max: Option<usize>,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max: None,
        }
    }
}

/// Action settings keyed by action name
///
/// Actions without an explicit entry use [`ActionSettings::default`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractableOptions {
    actions: FxHashMap<String, ActionSettings>,
}

impl InteractableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for an action, falling back to defaults
    pub fn settings(&self, action: &str) -> ActionSettings {
        self.actions.get(action).copied().unwrap_or_default()
    }

    pub fn set(&mut self, action: impl Into<String>, settings: ActionSettings) -> &mut Self {
        self.actions.insert(action.into(), settings);
        self
    }

    pub fn set_enabled(&mut self, action: &str, enabled: bool) -> &mut Self {
        self.actions.entry(action.to_string()).or_default().enabled = enabled;
        self
    }

    pub fn set_max(&mut self, action: &str, max: Option<usize>) -> &mut Self {
        self.actions.entry(action.to_string()).or_default().max = max;
        self
    }

    pub fn is_enabled(&self, action: &str) -> bool {
        self.settings(action).enabled
    }
}
