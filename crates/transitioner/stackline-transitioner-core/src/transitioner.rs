//! Transitioner: reconciles navigation changes into scenes and drives the
//! shared progress value across screen transitions.
//!
//! Lifecycle per logical transition:
//!
//! ```text
//! Idle -> Immediate | Animating -> Ending -> Idle
//! ```
//!
//! Navigation changes that arrive while an animated transition is running are
//! coalesced into a single pending slot (latest wins) and drained once when
//! the running transition ends. Every deferred continuation checks the mount
//! flag first, so nothing mutates state after `unmount`. Unmounting is final:
//! a transitioner cannot be mounted again.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, error, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{TransitionSpecOverride, TransitionerConfig};
use crate::data::{Descriptors, NavigationState, SceneList};
use crate::deferred::{after, Deferred};
use crate::error::TransitionError;
use crate::host::{Animator, FrameScheduler, ImmediateHost, TimingConfig};
use crate::scenes::{filter_stale, reconcile};
use crate::transition::{build_transition_props, LayoutValues, TransitionProps, TransitionerLayout};
use crate::value::{AnimatedValue, AnimatedValueReader, ListenerId};
use crate::Result;

pub type LifecycleHook = Rc<dyn Fn(&TransitionProps, Option<&TransitionProps>) -> Option<Deferred>>;
pub type ConfigureTransition =
    Rc<dyn Fn(&TransitionProps, Option<&TransitionProps>) -> TransitionSpecOverride>;
pub type RenderCallback = Rc<dyn Fn(&TransitionProps, Option<&TransitionProps>)>;

/// Inputs the owner passes down on every render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionerProps {
    pub navigation: NavigationState,
    pub descriptors: Descriptors,
    pub options: serde_json::Value,
}

impl TransitionerProps {
    pub fn new(navigation: NavigationState, descriptors: Descriptors) -> Self {
        Self {
            navigation,
            descriptors,
            options: serde_json::Value::Null,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    /// Index in range, unique keys, a descriptor for every route.
    pub fn validate(&self) -> Result<()> {
        self.navigation.validate()?;
        for route in &self.navigation.routes {
            if !self.descriptors.contains_key(&route.key) {
                return Err(TransitionError::MissingDescriptor {
                    key: route.key.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Immediate,
    Animating,
    Ending,
}

#[derive(Clone, Default)]
struct TransitionHooks {
    on_transition_start: Option<LifecycleHook>,
    on_transition_end: Option<LifecycleHook>,
    configure_transition: Option<ConfigureTransition>,
    render: Option<RenderCallback>,
}

/// Coalesced request. `from` is fixed by the first arrival, `to` is overwritten
/// by every later one.
struct PendingTransition {
    from: TransitionerProps,
    to: TransitionerProps,
}

struct Machine {
    props: TransitionerProps,
    layout_values: LayoutValues,
    layout: TransitionerLayout,
    position: AnimatedValue,
    scenes: SceneList,
    current: TransitionProps,
    previous: Option<TransitionProps>,
    phase: Phase,
    transition_running: bool,
    mounted: bool,
    torn_down: bool,
    pending: Option<PendingTransition>,
    position_listener: Option<ListenerId>,
}

struct Shared {
    machine: RefCell<Machine>,
    hooks: TransitionHooks,
    config: TransitionerConfig,
    animator: Rc<dyn Animator>,
    frames: Rc<dyn FrameScheduler>,
}

/// Builder for [`Transitioner`]. Hooks and host services are fixed at build time.
pub struct TransitionerBuilder {
    props: TransitionerProps,
    config: TransitionerConfig,
    hooks: TransitionHooks,
    animator: Option<Rc<dyn Animator>>,
    frames: Option<Rc<dyn FrameScheduler>>,
}

impl TransitionerBuilder {
    pub fn config(mut self, config: TransitionerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn animator(mut self, animator: Rc<dyn Animator>) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn frames(mut self, frames: Rc<dyn FrameScheduler>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Use one host for both animation and frame scheduling.
    pub fn host<H: Animator + FrameScheduler + 'static>(mut self, host: Rc<H>) -> Self {
        let animator: Rc<dyn Animator> = host.clone();
        let frames: Rc<dyn FrameScheduler> = host;
        self.animator = Some(animator);
        self.frames = Some(frames);
        self
    }

    pub fn on_transition_start(
        mut self,
        hook: impl Fn(&TransitionProps, Option<&TransitionProps>) -> Option<Deferred> + 'static,
    ) -> Self {
        self.hooks.on_transition_start = Some(Rc::new(hook));
        self
    }

    pub fn on_transition_end(
        mut self,
        hook: impl Fn(&TransitionProps, Option<&TransitionProps>) -> Option<Deferred> + 'static,
    ) -> Self {
        self.hooks.on_transition_end = Some(Rc::new(hook));
        self
    }

    pub fn configure_transition(
        mut self,
        hook: impl Fn(&TransitionProps, Option<&TransitionProps>) -> TransitionSpecOverride + 'static,
    ) -> Self {
        self.hooks.configure_transition = Some(Rc::new(hook));
        self
    }

    pub fn render(mut self, render: impl Fn(&TransitionProps, Option<&TransitionProps>) + 'static) -> Self {
        self.hooks.render = Some(Rc::new(render));
        self
    }

    /// Reconcile the initial scenes and build the initial descriptor. The
    /// transitioner starts unmounted.
    pub fn build(self) -> Result<Transitioner> {
        let props = self.props;
        props.validate()?;

        let layout_values = LayoutValues::new();
        let layout = layout_values.unmeasured();
        let position = AnimatedValue::new(props.navigation.index as f64);
        let position_listener = position.add_listener(|value| trace!("position -> {value}"));

        let scenes = reconcile(
            &SceneList::new(Vec::new()),
            &props.navigation,
            None,
            &props.descriptors,
        )?;
        let current = build_transition_props(
            &props.navigation,
            &props.options,
            &layout,
            &position.reader(),
            &scenes,
        )?;

        let machine = Machine {
            props,
            layout_values,
            layout,
            position,
            scenes,
            current,
            previous: None,
            phase: Phase::Idle,
            transition_running: false,
            mounted: false,
            torn_down: false,
            pending: None,
            position_listener: Some(position_listener),
        };

        let animator: Rc<dyn Animator> = match self.animator {
            Some(animator) => animator,
            None => Rc::new(ImmediateHost),
        };
        let frames: Rc<dyn FrameScheduler> = match self.frames {
            Some(frames) => frames,
            None => Rc::new(ImmediateHost),
        };
        Ok(Transitioner {
            shared: Rc::new(Shared {
                machine: RefCell::new(machine),
                hooks: self.hooks,
                config: self.config,
                animator,
                frames,
            }),
        })
    }
}

/// Transition orchestrator for one stack.
pub struct Transitioner {
    shared: Rc<Shared>,
}

impl Transitioner {
    pub fn builder(props: TransitionerProps) -> TransitionerBuilder {
        TransitionerBuilder {
            props,
            config: TransitionerConfig::default(),
            hooks: TransitionHooks::default(),
            animator: None,
            frames: None,
        }
    }

    /// Start accepting navigation changes. Ignored once `unmount` has run.
    pub fn mount(&self) {
        let mut m = self.shared.machine.borrow_mut();
        if m.torn_down {
            warn!("mount after unmount; transitioner stays unmounted");
            return;
        }
        m.mounted = true;
    }

    /// Stop accepting changes for good and drop the position keep-alive
    /// listener. An animation in flight is not cancelled; its continuations
    /// become no-ops.
    pub fn unmount(&self) {
        let mut m = self.shared.machine.borrow_mut();
        m.mounted = false;
        m.torn_down = true;
        if let Some(id) = m.position_listener.take() {
            m.position.remove_listener(id);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.machine.borrow().mounted
    }

    /// Record a layout measurement. Repeated sizes are ignored.
    pub fn on_layout(&self, width: f64, height: f64) -> Result<()> {
        let (current, previous, height_value, width_value) = {
            let mut m = self.shared.machine.borrow_mut();
            if !m.mounted {
                return Ok(());
            }
            if m.layout.init_width == width && m.layout.init_height == height {
                return Ok(());
            }
            let layout = TransitionerLayout {
                init_height: height,
                init_width: width,
                is_measured: true,
                ..m.layout.clone()
            };
            let current = build_transition_props(
                &m.props.navigation,
                &m.props.options,
                &layout,
                &m.position.reader(),
                &m.scenes,
            )?;
            m.layout = layout;
            m.current = current.clone();
            (
                current,
                m.previous.clone(),
                m.layout_values.height.share(),
                m.layout_values.width.share(),
            )
        };
        height_value.set_value(height);
        width_value.set_value(width);
        self.shared.notify_render(&current, previous.as_ref());
        Ok(())
    }

    /// Deliver new props from the owner.
    ///
    /// While an animated transition runs, the change is coalesced: only the
    /// latest pending change is kept and it starts once the running one ends.
    pub fn on_navigation_props_change(&self, next: TransitionerProps) -> Result<()> {
        next.validate()?;
        let prev = {
            let mut m = self.shared.machine.borrow_mut();
            if !m.mounted {
                return Err(TransitionError::Unmounted);
            }
            let prev = std::mem::replace(&mut m.props, next.clone());
            if m.transition_running {
                let from = match m.pending.take() {
                    Some(pending) => pending.from,
                    None => prev,
                };
                m.pending = Some(PendingTransition { from, to: next });
                debug!(
                    "transition running; coalesced change to index {}",
                    m.props.navigation.index
                );
                return Ok(());
            }
            prev
        };
        start_transition(&self.shared, prev, next)
    }

    pub fn phase(&self) -> Phase {
        self.shared.machine.borrow().phase
    }

    pub fn is_transition_running(&self) -> bool {
        self.shared.machine.borrow().transition_running
    }

    pub fn has_pending_transition(&self) -> bool {
        self.shared.machine.borrow().pending.is_some()
    }

    pub fn props(&self) -> TransitionerProps {
        self.shared.machine.borrow().props.clone()
    }

    pub fn scenes(&self) -> SceneList {
        self.shared.machine.borrow().scenes.clone()
    }

    pub fn layout(&self) -> TransitionerLayout {
        self.shared.machine.borrow().layout.clone()
    }

    /// Read-only handle onto the shared progress value.
    pub fn position(&self) -> AnimatedValueReader {
        self.shared.machine.borrow().position.reader()
    }

    pub fn transition_props(&self) -> TransitionProps {
        self.shared.machine.borrow().current.clone()
    }

    /// Descriptor being animated from; `None` when no transition is in flight.
    pub fn previous_transition_props(&self) -> Option<TransitionProps> {
        self.shared.machine.borrow().previous.clone()
    }

    /// Call `f` with the current and previous descriptors.
    pub fn render<R>(&self, f: impl FnOnce(&TransitionProps, Option<&TransitionProps>) -> R) -> R {
        let (current, previous) = {
            let m = self.shared.machine.borrow();
            (m.current.clone(), m.previous.clone())
        };
        f(&current, previous.as_ref())
    }
}

impl Drop for Transitioner {
    fn drop(&mut self) {
        if let Ok(mut m) = self.shared.machine.try_borrow_mut() {
            m.mounted = false;
            m.torn_down = true;
            if let Some(id) = m.position_listener.take() {
                m.position.remove_listener(id);
            }
        }
    }
}

impl fmt::Debug for Transitioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.shared.machine.borrow();
        f.debug_struct("Transitioner")
            .field("phase", &m.phase)
            .field("index", &m.props.navigation.index)
            .field("scenes", &m.scenes.len())
            .field("transition_running", &m.transition_running)
            .field("pending", &m.pending.is_some())
            .field("mounted", &m.mounted)
            .finish()
    }
}

impl Shared {
    fn notify_render(&self, current: &TransitionProps, previous: Option<&TransitionProps>) {
        if let Some(render) = &self.hooks.render {
            render(current, previous);
        }
    }

    fn call_hook(
        hook: &Option<LifecycleHook>,
        current: &TransitionProps,
        previous: Option<&TransitionProps>,
    ) -> Option<Deferred> {
        hook.as_ref().and_then(|hook| hook(current, previous))
    }

    /// Return to idle after an error in a deferred continuation.
    fn reset_after_error(&self, err: &TransitionError) {
        error!("transition aborted ({}): {err}", err.category());
        let mut m = self.machine.borrow_mut();
        m.transition_running = false;
        m.phase = Phase::Idle;
    }
}

/// Upgrade a continuation's handle, refusing once unmounted.
fn live(weak: &Weak<Shared>) -> Option<Rc<Shared>> {
    let shared = weak.upgrade()?;
    if !shared.machine.borrow().mounted {
        warn!("transition continuation ran after unmount; ignored");
        return None;
    }
    Some(shared)
}

fn start_transition(shared: &Rc<Shared>, props: TransitionerProps, next: TransitionerProps) -> Result<()> {
    let index_changed = props.navigation.index != next.navigation.index;
    let to_value = next.navigation.index as f64;

    let mut m = shared.machine.borrow_mut();
    let mut next_scenes = reconcile(
        &m.scenes,
        &next.navigation,
        Some(&props.navigation),
        &next.descriptors,
    )?;
    if !next.navigation.is_transitioning && shared.config.prune_stale_on_jump {
        next_scenes = filter_stale(&next_scenes);
    }

    if next_scenes.ptr_eq(&m.scenes) && !index_changed {
        debug!("scenes unchanged; settling position at {to_value}");
        m.previous = Some(m.current.clone());
        let position = m.position.share();
        drop(m);
        position.set_value(to_value);
        transition_end(shared);
        return Ok(());
    }

    let current = build_transition_props(
        &next.navigation,
        &next.options,
        &m.layout,
        &m.position.reader(),
        &next_scenes,
    )?;
    m.previous = Some(std::mem::replace(&mut m.current, current));
    m.scenes = next_scenes;

    let animated = next.navigation.is_transitioning && index_changed;
    if animated {
        m.transition_running = true;
        m.phase = Phase::Animating;
    } else {
        m.phase = Phase::Immediate;
    }
    debug!(
        "transition {} -> {} ({})",
        props.navigation.index,
        next.navigation.index,
        if animated { "animated" } else { "immediate" }
    );

    let current = m.current.clone();
    let previous = m.previous.clone();
    let position = m.position.share();
    drop(m);

    shared.notify_render(&current, previous.as_ref());
    let outcome = Shared::call_hook(&shared.hooks.on_transition_start, &current, previous.as_ref());
    let weak = Rc::downgrade(shared);

    if animated {
        after(outcome, move || {
            if let Some(shared) = live(&weak) {
                run_animation(&shared, position, to_value);
            }
        });
    } else {
        after(outcome, move || {
            if let Some(shared) = live(&weak) {
                if index_changed {
                    position.set_value(to_value);
                }
                transition_end(&shared);
            }
        });
    }
    Ok(())
}

fn run_animation(shared: &Rc<Shared>, position: AnimatedValue, to_value: f64) {
    let (current, previous) = {
        let m = shared.machine.borrow();
        (m.current.clone(), m.previous.clone())
    };
    let spec_override = shared
        .hooks
        .configure_transition
        .as_ref()
        .map(|configure| configure(&current, previous.as_ref()))
        .unwrap_or_default();
    let spec = shared.config.transition_spec.merged(&spec_override);

    // Already at the target, e.g. after a gesture finished the swipe.
    if position.get() == to_value {
        debug!("position already at {to_value}; skipping animation");
        transition_end(shared);
        return;
    }

    debug!(
        "animating position {} -> {to_value} over {}ms",
        position.get(),
        spec.duration_ms
    );
    let weak = Rc::downgrade(shared);
    shared.animator.start_timing(
        position,
        TimingConfig {
            to_value,
            duration_ms: spec.duration_ms,
            easing: spec.easing,
        },
        Box::new(move |end| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            trace!("position animation ended (finished: {})", end.finished);
            // End on the next frame so `on_transition_start` work settles first.
            let weak = Rc::downgrade(&shared);
            shared.frames.request_frame(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    transition_end(&shared);
                }
            }));
        }),
    );
}

fn transition_end(shared: &Rc<Shared>) {
    let (current, previous) = {
        let mut m = shared.machine.borrow_mut();
        if !m.mounted {
            warn!("transition end after unmount; ignored");
            return;
        }
        let previous = m.previous.take();
        let scenes = filter_stale(&m.scenes);
        let current = match build_transition_props(
            &m.props.navigation,
            &m.props.options,
            &m.layout,
            &m.position.reader(),
            &scenes,
        ) {
            Ok(current) => current,
            Err(err) => {
                drop(m);
                shared.reset_after_error(&err);
                return;
            }
        };
        m.scenes = scenes;
        m.current = current.clone();
        m.phase = Phase::Ending;
        (current, previous)
    };
    debug!("transition end at index {}", current.index);

    shared.notify_render(&current, None);
    let outcome = Shared::call_hook(&shared.hooks.on_transition_end, &current, previous.as_ref());
    let weak = Rc::downgrade(shared);
    after(outcome, move || {
        if let Some(shared) = live(&weak) {
            finish_transition(&shared);
        }
    });
}

fn finish_transition(shared: &Rc<Shared>) {
    let pending = {
        let mut m = shared.machine.borrow_mut();
        let pending = m.pending.take();
        if pending.is_none() {
            m.transition_running = false;
            m.phase = Phase::Idle;
        }
        pending
    };
    if let Some(PendingTransition { from, to }) = pending {
        debug!(
            "draining coalesced transition {} -> {}",
            from.navigation.index, to.navigation.index
        );
        if let Err(err) = start_transition(shared, from, to) {
            shared.reset_after_error(&err);
        }
    }
}
