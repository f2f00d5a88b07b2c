//! Reflection configuration
//!
//! Loaded from `wrapkit.toml`:
//!
//! ```toml
//! # What to do when a type's field layout no longer matches a wrapper's
//! # declared expectations: "off", "warn" (default) or "strict"
//! layout_policy = "strict"
//!
//! # Extra host names to try for a stable type, before the wrapper's defaults
//! [aliases]
//! "MapIcon" = ["MapDecoration", "MapIcon"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use wrapkit_host::{TypeId, TypeRegistry};

use crate::error::{ReflectError, ReflectResult};

/// Handling of layout expectation mismatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPolicy {
    /// Do not check
    Off,
    /// Log a warning and keep going
    #[default]
    Warn,
    /// Fail with [`ReflectError::LayoutMismatch`]
    Strict,
}

/// Configuration shared by converters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReflectConfig {
    /// Layout expectation policy
    pub layout_policy: LayoutPolicy,
    /// Stable type name to host names, tried in order
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl ReflectConfig {
    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> ReflectResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ReflectResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ReflectError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Host names to try for `stable`: configured aliases first, then `defaults`
    pub fn host_names(&self, stable: &str, defaults: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = self.aliases.get(stable).cloned().unwrap_or_default();
        for name in defaults {
            if !names.iter().any(|n| n == name) {
                names.push((*name).to_string());
            }
        }
        names
    }

    /// Locate the host type standing for `stable`
    pub fn resolve_type(
        &self,
        registry: &TypeRegistry,
        stable: &str,
        defaults: &[&str],
    ) -> ReflectResult<TypeId> {
        let candidates = self.host_names(stable, defaults);
        registry
            .find_first(&candidates)
            .ok_or_else(|| ReflectError::TypeNotFound {
                stable: stable.to_string(),
                candidates,
            })
    }
}
