//! Binder configuration.
//!
//! ```toml
//! # vtbind.toml
//! allow_free_for_bound = false
//! trace_slots = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options that change how a [`Binder`](crate::Binder) checks and binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Let a free candidate operation satisfy a requirement that declares a
    /// receiver. The receiver is then simply not passed.
    pub allow_free_for_bound: bool,

    /// Emit a `trace` event for every populated slot.
    pub trace_slots: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            allow_free_for_bound: true,
            trace_slots: false,
        }
    }
}

impl BindConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a configuration file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
