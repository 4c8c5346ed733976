use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    navigation: HashMap<String, String>,
}

/// Read and parse a fixture given its path relative to `fixtures/`.
fn load_relative<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../fixtures")
        .join(rel);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

/// Navigation scenarios: an initial state followed by steps with expectations.
pub mod navigation {
    use super::*;

    /// Scenario names, sorted.
    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.navigation.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = MANIFEST
            .navigation
            .get(name)
            .ok_or_else(|| anyhow!("unknown navigation fixture '{name}'"))?;
        load_relative(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_entries_resolve() {
        let keys = navigation::keys();
        assert!(!keys.is_empty());
        for key in keys {
            let value: serde_json::Value = navigation::load(&key).expect("fixture json");
            assert!(value.get("initial").is_some(), "{key} has no initial state");
            assert!(value["steps"].as_array().is_some_and(|s| !s.is_empty()), "{key} has no steps");
        }
    }

    #[test]
    fn unknown_fixture_is_an_error() {
        let err = navigation::load::<serde_json::Value>("does-not-exist").unwrap_err();
        assert!(err.to_string().contains("unknown navigation fixture"));
    }
}
