//! Navigation data model: routes, navigation state, descriptors and scenes.

use std::ops::Deref;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// One entry of the stack. Identity is `key`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub key: String,
    pub route_name: String,
}

impl Route {
    pub fn new(key: impl Into<String>, route_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            route_name: route_name.into(),
        }
    }
}

/// Ordered routes plus the active index, as published by the navigation store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub index: usize,
    pub routes: Vec<Route>,
    #[serde(default)]
    pub is_transitioning: bool,
}

impl NavigationState {
    pub fn new(index: usize, routes: Vec<Route>) -> Self {
        Self {
            index,
            routes,
            is_transitioning: false,
        }
    }

    /// Same state flagged as transitioning (animated).
    pub fn transitioning(mut self) -> Self {
        self.is_transitioning = true;
        self
    }

    pub fn active_route(&self) -> Option<&Route> {
        self.routes.get(self.index)
    }

    /// Check the invariants reconciliation relies on: the index points at a route
    /// and route keys are unique.
    pub fn validate(&self) -> Result<(), TransitionError> {
        if self.index >= self.routes.len() {
            return Err(TransitionError::NoActiveScene {
                index: self.index,
                routes: self.routes.len(),
            });
        }
        let mut seen = HashSet::with_capacity(self.routes.len());
        for route in &self.routes {
            if !seen.insert(route.key.as_str()) {
                return Err(TransitionError::DuplicateRouteKey {
                    key: route.key.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Per-route configuration supplied by the navigation store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub key: String,
    /// Screen options (header, gestures, ...). Opaque to the transitioner.
    #[serde(default)]
    pub options: serde_json::Value,
    /// Navigation handle of the route's child navigator, when it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationState>,
}

impl SceneDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            options: serde_json::Value::Null,
            navigation: None,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }
}

/// Route key -> descriptor.
pub type Descriptors = HashMap<String, SceneDescriptor>;

/// Build a default descriptor for every route of `state`.
pub fn descriptors_for(state: &NavigationState) -> Descriptors {
    state
        .routes
        .iter()
        .map(|r| (r.key.clone(), SceneDescriptor::new(r.key.clone())))
        .collect()
}

/// A route augmented with its stack index and lifecycle flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub key: String,
    pub index: usize,
    pub is_stale: bool,
    pub is_active: bool,
    pub route: Route,
    pub descriptor: SceneDescriptor,
}

/// Immutable, shared list of scenes.
///
/// Lists are replaced as a whole. Reconciliation hands back the same list
/// (`ptr_eq`) when nothing changed so callers can skip rebuilds.
#[derive(Clone, Debug)]
pub struct SceneList(Rc<[Scene]>);

impl SceneList {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self(scenes.into())
    }

    /// True when both handles point to the same list instance.
    #[inline]
    pub fn ptr_eq(&self, other: &SceneList) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn active(&self) -> Option<&Scene> {
        self.0.iter().find(|s| s.is_active)
    }

    pub fn find(&self, key: &str) -> Option<&Scene> {
        self.0.iter().find(|s| s.key == key)
    }

    pub fn has_stale(&self) -> bool {
        self.0.iter().any(|s| s.is_stale)
    }
}

impl Deref for SceneList {
    type Target = [Scene];

    fn deref(&self) -> &[Scene] {
        &self.0
    }
}

impl PartialEq for SceneList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0[..] == other.0[..]
    }
}

impl FromIterator<Scene> for SceneList {
    fn from_iter<I: IntoIterator<Item = Scene>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
