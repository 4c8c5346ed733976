//! Transitioner configuration.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Duration used for every animated transition unless overridden.
pub const DEFAULT_DURATION_MS: f32 = 250.0;

/// Effective timing parameters for one animated transition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub duration_ms: f32,
    pub easing: Easing,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            easing: Easing::EaseInOut,
        }
    }
}

/// Partial spec returned by a `configure_transition` hook. Unset fields keep the defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpecOverride {
    #[serde(default)]
    pub duration_ms: Option<f32>,
    #[serde(default)]
    pub easing: Option<Easing>,
}

impl TransitionSpec {
    /// Apply `over` on top of `self`, field by field.
    pub fn merged(&self, over: &TransitionSpecOverride) -> TransitionSpec {
        TransitionSpec {
            duration_ms: over.duration_ms.unwrap_or(self.duration_ms),
            easing: over.easing.unwrap_or(self.easing),
        }
    }
}

/// Configuration for a transitioner instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionerConfig {
    /// Base spec that `configure_transition` overrides are merged onto.
    pub transition_spec: TransitionSpec,
    /// Drop stale scenes right away when the incoming state is not transitioning.
    pub prune_stale_on_jump: bool,
}

impl Default for TransitionerConfig {
    fn default() -> Self {
        Self {
            transition_spec: TransitionSpec::default(),
            prune_stale_on_jump: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unset_fields() {
        let base = TransitionSpec::default();
        let over = TransitionSpecOverride {
            duration_ms: Some(400.0),
            easing: None,
        };
        let merged = base.merged(&over);
        assert_eq!(merged.duration_ms, 400.0);
        assert_eq!(merged.easing, Easing::EaseInOut);

        let over = TransitionSpecOverride {
            duration_ms: None,
            easing: Some(Easing::Linear),
        };
        let merged = base.merged(&over);
        assert_eq!(merged.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(merged.easing, Easing::Linear);
    }

    #[test]
    fn config_deserializes_partially() {
        let cfg: TransitionerConfig =
            serde_json::from_str(r#"{ "transition_spec": { "duration_ms": 120, "easing": { "kind": "linear" } } }"#)
                .expect("config json");
        assert_eq!(cfg.transition_spec.duration_ms, 120.0);
        assert_eq!(cfg.transition_spec.easing, Easing::Linear);
        assert!(cfg.prune_stale_on_jump);
    }
}
