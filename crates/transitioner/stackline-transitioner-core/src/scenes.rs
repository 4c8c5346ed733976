//! Scene reconciliation.
//!
//! Maps (previous scenes, next navigation state, previous navigation state,
//! descriptors) to the next scene list. Pure: no state is kept between calls.

use hashbrown::HashSet;

use crate::data::{Descriptors, NavigationState, Scene, SceneList};
use crate::error::TransitionError;
use crate::Result;

/// Compute the scene list for `next`.
///
/// Fresh scenes come first, in route order. Scenes from `prev_scenes` whose
/// route left the stack follow as stale scenes, in their previous relative
/// order. A stale scene whose key was re-added to the stack is dropped.
///
/// Returns `prev_scenes` itself (same instance) when the composition did not
/// change.
pub fn reconcile(
    prev_scenes: &SceneList,
    next: &NavigationState,
    prev: Option<&NavigationState>,
    descriptors: &Descriptors,
) -> Result<SceneList> {
    next.validate()?;

    if prev.is_some_and(|p| p.index == next.index && p.routes == next.routes)
        && fresh_scenes_match(prev_scenes, next, descriptors)
    {
        return Ok(prev_scenes.clone());
    }

    let mut scenes = Vec::with_capacity(next.routes.len() + prev_scenes.len());
    let mut fresh_keys = HashSet::with_capacity(next.routes.len());

    for (index, route) in next.routes.iter().enumerate() {
        let descriptor = descriptors
            .get(&route.key)
            .ok_or_else(|| TransitionError::MissingDescriptor {
                key: route.key.clone(),
            })?;
        fresh_keys.insert(route.key.as_str());
        scenes.push(Scene {
            key: route.key.clone(),
            index,
            is_stale: false,
            is_active: index == next.index,
            route: route.clone(),
            descriptor: descriptor.clone(),
        });
    }

    for scene in prev_scenes.iter() {
        if fresh_keys.contains(scene.key.as_str()) {
            continue;
        }
        scenes.push(Scene {
            is_stale: true,
            is_active: false,
            ..scene.clone()
        });
    }

    if scenes.len() == prev_scenes.len() && scenes.iter().zip(prev_scenes.iter()).all(|(a, b)| a == b) {
        return Ok(prev_scenes.clone());
    }

    Ok(SceneList::new(scenes))
}

/// True when the fresh prefix of `scenes` already describes `next` with the
/// current descriptors.
fn fresh_scenes_match(scenes: &SceneList, next: &NavigationState, descriptors: &Descriptors) -> bool {
    let fresh = scenes.iter().take_while(|s| !s.is_stale);
    let mut count = 0;
    for (scene, route) in fresh.zip(next.routes.iter()) {
        count += 1;
        let same = scene.route == *route
            && scene.index + 1 == count
            && scene.is_active == (scene.index == next.index)
            && descriptors.get(&route.key) == Some(&scene.descriptor);
        if !same {
            return false;
        }
    }
    count == next.routes.len() && scenes.get(count).map_or(true, |s| s.is_stale)
}

/// Drop stale scenes. Returns `scenes` itself when none are stale.
pub fn filter_stale(scenes: &SceneList) -> SceneList {
    if !scenes.has_stale() {
        return scenes.clone();
    }
    scenes.iter().filter(|s| !s.is_stale).cloned().collect()
}
