//! Plugins extend a scope with actions, signal handlers, or both
//!
//! A plugin is installed at most once per scope, keyed by its id.
//!
//! ```rust
//! use grasp_core::{ActionPlugin, Scope, ScopeConfig};
//!
//! let scope = Scope::with_config(ScopeConfig::bare());
//! assert!(scope.use_plugin(&ActionPlugin::drag()).unwrap());
//! assert!(!scope.use_plugin(&ActionPlugin::drag()).unwrap());
//! assert_eq!(scope.actions().names(), vec!["drag"]);
//! ```

use crate::actions::ActionKind;
use crate::error::{GraspError, Result};
use crate::scope::Scope;

/// Something that can be installed into a [`Scope`]
pub trait Plugin {
    /// Unique id; installing a second plugin with the same id is a no-op
    fn id(&self) -> &str;

    /// Register whatever the plugin provides
    fn install(&self, scope: &Scope) -> Result<()>;
}

/// Registers a single action kind
#[derive(Clone, Debug)]
pub struct ActionPlugin {
    id: String,
    kind: ActionKind,
}

impl ActionPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        let kind = ActionKind::new(name);
        Self {
            id: format!("actions/{}", kind.name()),
            kind,
        }
    }

    pub fn drag() -> Self {
        Self::new("drag")
    }

    pub fn resize() -> Self {
        Self::new("resize")
    }

    pub fn gesture() -> Self {
        Self::new("gesture")
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }
}

impl Plugin for ActionPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn install(&self, scope: &Scope) -> Result<()> {
        let name = self.kind.name();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GraspError::InvalidActionName(name.to_string()));
        }
        scope.actions().register(self.kind.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopeConfig;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingPlugin {
        installs: Rc<Cell<u32>>,
    }

    impl Plugin for CountingPlugin {
        fn id(&self) -> &str {
            "counting"
        }

        fn install(&self, scope: &Scope) -> Result<()> {
            self.installs.set(self.installs.get() + 1);
            scope.use_plugin(&ActionPlugin::new("tap"))?;
            Ok(())
        }
    }

    #[test]
    fn test_plugin_installs_once() {
        let scope = Scope::with_config(ScopeConfig::bare());
        let installs = Rc::new(Cell::new(0));
        let plugin = CountingPlugin {
            installs: installs.clone(),
        };

        assert!(scope.use_plugin(&plugin).unwrap());
        assert!(!scope.use_plugin(&plugin).unwrap());
        assert_eq!(installs.get(), 1);
        assert_eq!(scope.plugins(), vec!["actions/tap", "counting"]);
        assert!(scope.actions().contains("tap"));
    }

    #[test]
    fn test_invalid_action_plugin_is_rejected() {
        let scope = Scope::with_config(ScopeConfig::bare());
        let err = scope.use_plugin(&ActionPlugin::new("drag move")).unwrap_err();
        assert_eq!(err, GraspError::InvalidActionName("drag move".into()));
        assert!(!scope.is_installed("actions/drag move"));
        assert!(scope.actions().is_empty());
    }

    #[test]
    fn test_config_default_actions_skip_invalid_names() {
        let scope = Scope::with_config(ScopeConfig::bare().with_actions(["drag", ""]));
        assert_eq!(scope.actions().names(), vec!["drag"]);
    }
}
