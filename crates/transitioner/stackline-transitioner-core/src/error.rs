//! Error types for the transitioner

use serde::{Deserialize, Serialize};

/// Failures surfaced by reconciliation, the transitioner and the pointer-events gate.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TransitionError {
    /// A route in the navigation state has no descriptor.
    #[error("No descriptor found for route: {key}")]
    MissingDescriptor { key: String },

    /// No scene in the computed list is active.
    #[error("Could not find active scene (index {index}, {routes} routes)")]
    NoActiveScene { index: usize, routes: usize },

    /// Two routes in one navigation state share a key.
    #[error("Duplicate route key: {key}")]
    DuplicateRouteKey { key: String },

    /// The wrapped view cannot have its pointer events set imperatively.
    #[error("Component must expose native props to set `pointerEvents`")]
    MissingNativeProps,

    /// A navigation change was delivered while the transitioner is not mounted.
    #[error("Transitioner is not mounted")]
    Unmounted,
}

impl TransitionError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingDescriptor { .. }
            | Self::NoActiveScene { .. }
            | Self::DuplicateRouteKey { .. } => "configuration",
            Self::MissingNativeProps => "misuse",
            Self::Unmounted => "lifecycle",
        }
    }
}
