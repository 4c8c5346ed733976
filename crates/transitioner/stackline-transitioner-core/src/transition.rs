//! Layout and transition descriptors published to renderers and hooks.

use crate::data::{NavigationState, Scene, SceneList};
use crate::error::TransitionError;
use crate::value::{AnimatedValue, AnimatedValueReader};
use crate::Result;

/// Measured container size. `height`/`width` track the latest measurement
/// as animated values; `init_*` hold it as plain numbers.
#[derive(Clone, Debug)]
pub struct TransitionerLayout {
    pub height: AnimatedValueReader,
    pub width: AnimatedValueReader,
    pub init_height: f64,
    pub init_width: f64,
    pub is_measured: bool,
}

/// Write side of the layout values, kept by the transitioner.
#[derive(Debug)]
pub(crate) struct LayoutValues {
    pub height: AnimatedValue,
    pub width: AnimatedValue,
}

impl LayoutValues {
    pub fn new() -> Self {
        Self {
            height: AnimatedValue::new(0.0),
            width: AnimatedValue::new(0.0),
        }
    }

    /// Unmeasured layout over these values.
    pub fn unmeasured(&self) -> TransitionerLayout {
        TransitionerLayout {
            height: self.height.reader(),
            width: self.width.reader(),
            init_height: 0.0,
            init_width: 0.0,
            is_measured: false,
        }
    }
}

/// Snapshot handed to the render callback and lifecycle hooks.
#[derive(Clone, Debug)]
pub struct TransitionProps {
    pub layout: TransitionerLayout,
    pub navigation: NavigationState,
    pub position: AnimatedValueReader,
    pub scenes: SceneList,
    /// The active scene.
    pub scene: Scene,
    pub options: serde_json::Value,
    /// Index of the active scene.
    pub index: usize,
}

pub(crate) fn build_transition_props(
    navigation: &NavigationState,
    options: &serde_json::Value,
    layout: &TransitionerLayout,
    position: &AnimatedValueReader,
    scenes: &SceneList,
) -> Result<TransitionProps> {
    let scene = scenes
        .active()
        .cloned()
        .ok_or(TransitionError::NoActiveScene {
            index: navigation.index,
            routes: navigation.routes.len(),
        })?;
    Ok(TransitionProps {
        layout: layout.clone(),
        navigation: navigation.clone(),
        position: position.clone(),
        scenes: scenes.clone(),
        index: scene.index,
        scene,
        options: options.clone(),
    })
}
