//! Routing policy
//!
//! TigerStyle: Explicit defaults, validation, env-overridable.
//!
//! A [`RoutingPolicy`] is the complete knob set one routing request runs
//! under. The server builds one at startup (defaults merged with
//! environment), and each request may override the three thresholds and the
//! fact-extraction switch.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Resolved routing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// Similarity above this keeps the message on the current branch
    pub stay_threshold: f32,
    /// Similarity at or below this marks a branch as a new cluster
    pub new_cluster_threshold: f32,
    /// Other-branch score above this routes instead of branching
    pub route_threshold: f32,
    /// Cap on candidate branches loaded per request
    pub branches_for_context_max: usize,
    /// Whether the sidecar preprocesses text before embedding.
    /// Off by default: stopword stripping hurts follow-up detection.
    pub preprocess: bool,
    /// Total per-request deadline
    pub pipeline_timeout_ms: u64,
    /// Default for per-request `extractFacts`
    pub extract_facts: bool,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            stay_threshold: STAY_THRESHOLD_DEFAULT,
            new_cluster_threshold: NEW_CLUSTER_THRESHOLD_DEFAULT,
            route_threshold: ROUTE_THRESHOLD_DEFAULT,
            branches_for_context_max: BRANCHES_FOR_CONTEXT_MAX_DEFAULT,
            preprocess: false,
            pipeline_timeout_ms: PIPELINE_TIMEOUT_MS_DEFAULT,
            extract_facts: true,
        }
    }
}

/// Per-request threshold overrides, merged over the server policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    pub stay_threshold: Option<f32>,
    pub new_cluster_threshold: Option<f32>,
    pub route_threshold: Option<f32>,
    pub extract_facts: Option<bool>,
}

impl PolicyOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RoutingPolicy {
    /// Build a policy from environment variables, falling back to defaults.
    ///
    /// Recognized: `BRAID_STAY_THRESHOLD`, `BRAID_NEW_CLUSTER_THRESHOLD`,
    /// `BRAID_ROUTE_THRESHOLD`, `BRAID_MAX_BRANCHES`,
    /// `BRAID_PIPELINE_TIMEOUT_MS`, `BRAID_PREPROCESS`.
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        if let Some(v) = env_parse::<f32>("BRAID_STAY_THRESHOLD") {
            policy.stay_threshold = v;
        }
        if let Some(v) = env_parse::<f32>("BRAID_NEW_CLUSTER_THRESHOLD") {
            policy.new_cluster_threshold = v;
        }
        if let Some(v) = env_parse::<f32>("BRAID_ROUTE_THRESHOLD") {
            policy.route_threshold = v;
        }
        if let Some(v) = env_parse::<usize>("BRAID_MAX_BRANCHES") {
            policy.branches_for_context_max = v;
        }
        if let Some(v) = env_parse::<u64>("BRAID_PIPELINE_TIMEOUT_MS") {
            policy.pipeline_timeout_ms = v;
        }
        if let Some(v) = env_parse::<bool>("BRAID_PREPROCESS") {
            policy.preprocess = v;
        }
        policy
    }

    /// Apply per-request overrides, returning the effective policy.
    pub fn with_overrides(&self, overrides: &PolicyOverrides) -> Self {
        let mut policy = self.clone();
        if let Some(v) = overrides.stay_threshold {
            policy.stay_threshold = v;
        }
        if let Some(v) = overrides.new_cluster_threshold {
            policy.new_cluster_threshold = v;
        }
        if let Some(v) = overrides.route_threshold {
            policy.route_threshold = v;
        }
        if let Some(v) = overrides.extract_facts {
            policy.extract_facts = v;
        }
        policy
    }

    /// Validate threshold ordering and ranges.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("stay_threshold", self.stay_threshold),
            ("new_cluster_threshold", self.new_cluster_threshold),
            ("route_threshold", self.route_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(Error::config(field, format!("{value} not in [0, 1]")));
            }
        }
        if self.new_cluster_threshold >= self.stay_threshold {
            return Err(Error::config(
                "new_cluster_threshold",
                "must be below stay_threshold",
            ));
        }
        if self.branches_for_context_max == 0 {
            return Err(Error::config("branches_for_context_max", "must be positive"));
        }
        if self.pipeline_timeout_ms == 0 {
            return Err(Error::config("pipeline_timeout_ms", "must be positive"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = RoutingPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.stay_threshold, 0.47);
        assert_eq!(policy.new_cluster_threshold, 0.20);
        assert_eq!(policy.route_threshold, 0.42);
        assert!(!policy.preprocess);
        assert!(policy.extract_facts);
    }

    #[test]
    fn test_threshold_ordering_enforced() {
        let policy = RoutingPolicy {
            new_cluster_threshold: 0.5,
            stay_threshold: 0.4,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_threshold_range_enforced() {
        let policy = RoutingPolicy {
            route_threshold: 1.5,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_overrides_merge() {
        let base = RoutingPolicy::default();
        let overrides = PolicyOverrides {
            stay_threshold: Some(0.6),
            extract_facts: Some(false),
            ..Default::default()
        };
        let effective = base.with_overrides(&overrides);
        assert_eq!(effective.stay_threshold, 0.6);
        assert!(!effective.extract_facts);
        // untouched knobs keep server values
        assert_eq!(effective.route_threshold, base.route_threshold);
    }

    #[test]
    fn test_empty_overrides_are_identity() {
        let base = RoutingPolicy::default();
        let overrides = PolicyOverrides::default();
        assert!(overrides.is_empty());
        assert_eq!(base.with_overrides(&overrides), base);
    }
}
