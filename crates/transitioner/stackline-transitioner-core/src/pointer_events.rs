//! Pointer-events gating for rendered scenes.
//!
//! A scene only receives input once the progress value has settled on it.
//! The gate subscribes to the shared progress value and pushes changes to the
//! wrapped view imperatively, without a re-render.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::data::{NavigationState, Scene};
use crate::error::TransitionError;
use crate::value::{AnimatedValueReader, ListenerId};
use crate::Result;

/// Distance from the scene index under which the progress value counts as settled.
pub const MIN_POSITION_OFFSET: f64 = 0.01;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerEvents {
    Auto,
    None,
    /// The view itself is hit-testable, its children are not.
    BoxOnly,
}

/// Pointer events for `scene` given the active index and the progress value.
pub fn compute_pointer_events(scene: &Scene, active_index: usize, progress: f64) -> PointerEvents {
    if scene.is_stale || active_index != scene.index {
        // Scenes ahead of the active one stay reachable for swipe gestures.
        return if scene.index > active_index {
            PointerEvents::BoxOnly
        } else {
            PointerEvents::None
        };
    }
    if (progress - scene.index as f64).abs() > MIN_POSITION_OFFSET {
        return PointerEvents::BoxOnly;
    }
    PointerEvents::Auto
}

/// Imperative prop setter exposed by host views.
pub trait NativeProps {
    fn set_pointer_events(&self, value: PointerEvents);
}

/// A rendered view the gate wraps.
pub trait ViewHandle {
    /// `None` when the view cannot be updated imperatively.
    fn native_props(&self) -> Option<&dyn NativeProps>;
}

struct GateState {
    scene: Scene,
    active_index: usize,
    pointer_events: PointerEvents,
    view: Option<Rc<dyn ViewHandle>>,
}

impl GateState {
    fn on_position_change(state: &Weak<RefCell<GateState>>, value: f64) {
        let Some(state) = state.upgrade() else {
            return;
        };
        let (next, view) = {
            let mut s = state.borrow_mut();
            let next = compute_pointer_events(&s.scene, s.active_index, value);
            if next == s.pointer_events {
                return;
            }
            s.pointer_events = next;
            (next, s.view.clone())
        };
        trace!("pointer events -> {next:?} at position {value}");
        if let Some(native) = view.as_deref().and_then(|v| v.native_props()) {
            native.set_pointer_events(next);
        }
    }
}

/// Keeps a scene's pointer events in sync with the shared progress value.
pub struct PointerEventsGate {
    state: Rc<RefCell<GateState>>,
    position: AnimatedValueReader,
    listener: Option<ListenerId>,
}

impl PointerEventsGate {
    pub fn new(scene: Scene, navigation: &NavigationState, position: AnimatedValueReader) -> Self {
        let pointer_events = compute_pointer_events(&scene, navigation.index, position.get());
        Self {
            state: Rc::new(RefCell::new(GateState {
                scene,
                active_index: navigation.index,
                pointer_events,
                view: None,
            })),
            position,
            listener: None,
        }
    }

    /// Attach (or detach, with `None`) the wrapped view.
    pub fn attach_view(&self, view: Option<Rc<dyn ViewHandle>>) -> Result<()> {
        if let Some(v) = &view {
            if v.native_props().is_none() {
                return Err(TransitionError::MissingNativeProps);
            }
        }
        self.state.borrow_mut().view = view;
        Ok(())
    }

    /// Subscribe to the progress value. Mounting again replaces the subscription.
    pub fn mount(&mut self) {
        if let Some(id) = self.listener.take() {
            self.position.remove_listener(id);
        }
        let weak = Rc::downgrade(&self.state);
        self.listener = Some(
            self.position
                .add_listener(move |value| GateState::on_position_change(&weak, value)),
        );
    }

    pub fn unmount(&mut self) {
        if let Some(id) = self.listener.take() {
            self.position.remove_listener(id);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.listener.is_some()
    }

    /// New props from the renderer; returns the recomputed value.
    pub fn update(&self, scene: Scene, navigation: &NavigationState) -> PointerEvents {
        let mut s = self.state.borrow_mut();
        s.pointer_events = compute_pointer_events(&scene, navigation.index, self.position.get());
        s.scene = scene;
        s.active_index = navigation.index;
        s.pointer_events
    }

    pub fn pointer_events(&self) -> PointerEvents {
        self.state.borrow().pointer_events
    }
}

impl Drop for PointerEventsGate {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl fmt::Debug for PointerEventsGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("PointerEventsGate")
            .field("scene", &s.scene.key)
            .field("pointer_events", &s.pointer_events)
            .field("mounted", &self.listener.is_some())
            .finish()
    }
}
