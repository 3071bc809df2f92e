//! Engine Configuration
//!
//! Tunables for the scheduler and the child flattener. Hosts usually build
//! this with [`EngineConfig::default`]; embedders that ship settings as JSON
//! can use [`EngineConfig::from_json`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// How nested child lists are flattened before reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlattenPolicy {
    /// Flatten lists of lists to any depth.
    #[default]
    Recursive,
    /// Flatten exactly one level; deeper nesting is rejected.
    OneLevel,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stop issuing units once the deadline reports less than this (microseconds).
    pub yield_threshold_us: u64,

    /// Length of one time slice used by the async driver (microseconds).
    pub slice_budget_us: u64,

    /// Child flattening policy.
    pub flatten: FlattenPolicy,

    /// Emit a trace event for every unit of work, with the tag counts its
    /// reconciliation assigned.
    pub log_units: bool,

    /// Commits one driver call may perform before it assumes a component
    /// keeps scheduling itself from `render`.
    pub max_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            yield_threshold_us: 1_000,
            slice_budget_us: 5_000,
            flatten: FlattenPolicy::default(),
            log_units: false,
            max_passes: 64,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The yield threshold as a [`Duration`].
    pub fn yield_threshold(&self) -> Duration {
        Duration::from_micros(self.yield_threshold_us)
    }

    /// The async driver's slice length as a [`Duration`].
    pub fn slice_budget(&self) -> Duration {
        Duration::from_micros(self.slice_budget_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"flatten": "one_level"}"#).unwrap();
        assert_eq!(config.flatten, FlattenPolicy::OneLevel);
        assert_eq!(config.yield_threshold(), Duration::from_millis(1));
        assert_eq!(config.slice_budget(), Duration::from_millis(5));
        assert!(!config.log_units);
        assert_eq!(config.max_passes, 64);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = EngineConfig::from_json(r#"{"flatten": "sideways"}"#).unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
    }
}
