//! Experiment configuration
//!
//! [`ExperimentConfig`] holds settings shared by every experiment built with
//! it: a global enable switch placed in front of each run gate, and default
//! context values. It can be constructed in code or loaded from TOML/JSON.

use crate::error::ExperimentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings applied to experiments at build time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Whether candidates may run at all
    pub enabled: bool,
    /// Default context attached to every experiment
    pub context: BTreeMap<String, serde_json::Value>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            context: BTreeMap::new(),
        }
    }
}

impl ExperimentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With enable switch
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// With default context entry
    #[must_use]
    pub fn with_context(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Load from TOML
    ///
    /// # Errors
    /// `ExperimentError::Config` if the document does not parse
    pub fn from_toml_str(s: &str) -> Result<Self, ExperimentError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from JSON
    ///
    /// # Errors
    /// `ExperimentError::Config` if the document does not parse
    pub fn from_json_str(s: &str) -> Result<Self, ExperimentError> {
        Ok(serde_json::from_str(s)?)
    }
}
