//! Grasp configuration file handling
//!
//! `grasp.toml` holds a single `[scope]` table mirroring
//! [`grasp_core::ScopeConfig`]:
//!
//! ```toml
//! [scope]
//! pointer_move_tolerance = 2.0
//! default_actions = ["drag", "resize"]
//! ```

use anyhow::{Context, Result};
use grasp_core::ScopeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "grasp.toml";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GraspConfig {
    #[serde(default)]
    pub scope: ScopeConfig,
}

impl GraspConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, `grasp.toml` in the working
    /// directory is used if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    Self::load_file(default_path)
                } else {
                    tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid grasp configuration")
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
