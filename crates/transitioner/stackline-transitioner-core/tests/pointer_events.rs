use std::cell::RefCell;
use std::rc::Rc;

use stackline_transitioner::{
    descriptors_for, NativeProps, NavigationState, PointerEvents, PointerEventsGate, Route,
    SteppedHost, TransitionError, Transitioner, TransitionerProps, ViewHandle,
};

#[derive(Default)]
struct RecordingView {
    pushed: RefCell<Vec<PointerEvents>>,
}

impl NativeProps for RecordingView {
    fn set_pointer_events(&self, value: PointerEvents) {
        self.pushed.borrow_mut().push(value);
    }
}

impl ViewHandle for RecordingView {
    fn native_props(&self) -> Option<&dyn NativeProps> {
        Some(self)
    }
}

struct PlainView;

impl ViewHandle for PlainView {
    fn native_props(&self) -> Option<&dyn NativeProps> {
        None
    }
}

fn props(index: usize, keys: &[&str], transitioning: bool) -> TransitionerProps {
    let mut nav = NavigationState::new(index, keys.iter().map(|k| Route::new(*k, *k)).collect());
    nav.is_transitioning = transitioning;
    let descriptors = descriptors_for(&nav);
    TransitionerProps::new(nav, descriptors)
}

fn pushed() -> (Rc<SteppedHost>, Transitioner) {
    let host = Rc::new(SteppedHost::new());
    let t = Transitioner::builder(props(0, &["A"], false))
        .host(host.clone())
        .build()
        .expect("transitioner");
    t.mount();
    t.on_navigation_props_change(props(1, &["A", "B"], true))
        .expect("push");
    (host, t)
}

#[test]
fn incoming_scene_becomes_interactive_once_settled() {
    let (host, t) = pushed();
    let current = t.transition_props();
    let mut gate = PointerEventsGate::new(current.scene.clone(), &current.navigation, t.position());
    let view = Rc::new(RecordingView::default());
    let handle: Rc<dyn ViewHandle> = view.clone();
    gate.attach_view(Some(handle)).expect("view with native props");
    gate.mount();

    assert_eq!(gate.pointer_events(), PointerEvents::BoxOnly);
    host.advance(125.0);
    assert_eq!(gate.pointer_events(), PointerEvents::BoxOnly);
    assert!(view.pushed.borrow().is_empty());

    host.run_until_idle(16.0, 100);
    assert_eq!(gate.pointer_events(), PointerEvents::Auto);
    assert_eq!(*view.pushed.borrow(), vec![PointerEvents::Auto]);
}

#[test]
fn outgoing_scene_stays_blocked() {
    let (host, t) = pushed();
    let current = t.transition_props();
    let outgoing = current.scenes.find("A").cloned().expect("scene A");
    let mut gate = PointerEventsGate::new(outgoing, &current.navigation, t.position());
    let view = Rc::new(RecordingView::default());
    let handle: Rc<dyn ViewHandle> = view.clone();
    gate.attach_view(Some(handle)).unwrap();
    gate.mount();

    host.run_until_idle(16.0, 100);
    assert_eq!(gate.pointer_events(), PointerEvents::None);
    assert!(view.pushed.borrow().is_empty());
}

#[test]
fn popping_blocks_the_leaving_scene() {
    let (host, t) = pushed();
    host.run_until_idle(16.0, 100);
    let current = t.transition_props();
    let mut gate = PointerEventsGate::new(current.scene.clone(), &current.navigation, t.position());
    let view = Rc::new(RecordingView::default());
    let handle: Rc<dyn ViewHandle> = view.clone();
    gate.attach_view(Some(handle)).unwrap();
    gate.mount();
    assert_eq!(gate.pointer_events(), PointerEvents::Auto);

    t.on_navigation_props_change(props(0, &["A"], true)).unwrap();
    host.advance(125.0);
    assert_eq!(*view.pushed.borrow(), vec![PointerEvents::BoxOnly]);

    // The renderer hands the gate the stale copy of the leaving scene.
    let leaving = t.scenes().find("B").cloned().expect("stale B");
    assert!(leaving.is_stale);
    assert_eq!(gate.update(leaving, &t.props().navigation), PointerEvents::BoxOnly);
}

#[test]
fn gate_holds_one_subscription_while_mounted() {
    let (_host, t) = pushed();
    let position = t.position();
    let base = position.listener_count();
    let current = t.transition_props();
    let mut gate = PointerEventsGate::new(current.scene.clone(), &current.navigation, t.position());

    gate.mount();
    gate.mount();
    assert!(gate.is_mounted());
    assert_eq!(position.listener_count(), base + 1);

    gate.unmount();
    assert!(!gate.is_mounted());
    assert_eq!(position.listener_count(), base);

    gate.mount();
    drop(gate);
    assert_eq!(position.listener_count(), base);
}

#[test]
fn view_without_native_props_is_rejected() {
    let (_host, t) = pushed();
    let current = t.transition_props();
    let gate = PointerEventsGate::new(current.scene.clone(), &current.navigation, t.position());
    let plain: Rc<dyn ViewHandle> = Rc::new(PlainView);
    assert_eq!(gate.attach_view(Some(plain)), Err(TransitionError::MissingNativeProps));
    assert!(gate.attach_view(None).is_ok());
}
