//! Host services the transitioner drives: timed animation and frame callbacks.
//!
//! The transitioner only talks to the `Animator` and `FrameScheduler` traits.
//! Two implementations ship with the crate: `ImmediateHost`, which completes
//! everything synchronously, and `SteppedHost`, which advances in explicit
//! time steps the way an engine tick does.

use std::cell::{Cell, RefCell};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::value::AnimatedValue;

/// Parameters of one timed animation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    pub to_value: f64,
    pub duration_ms: f32,
    pub easing: Easing,
}

/// Reported to the completion callback of a timed animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationEnd {
    /// False when the animation was interrupted before reaching its target.
    pub finished: bool,
}

pub type Completion = Box<dyn FnOnce(AnimationEnd)>;
pub type FrameCallback = Box<dyn FnOnce()>;

/// Timed animation service.
pub trait Animator {
    /// Animate `value` towards `config.to_value` and call `on_complete` once
    /// when done or interrupted. `value` is a write handle lent for the
    /// duration of the animation.
    fn start_timing(&self, value: AnimatedValue, config: TimingConfig, on_complete: Completion);
}

/// Rendering-frame scheduling service.
pub trait FrameScheduler {
    /// Run `callback` on the next rendering frame.
    fn request_frame(&self, callback: FrameCallback);
}

/// Jumps to the target and completes synchronously. Frame callbacks run inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateHost;

impl Animator for ImmediateHost {
    fn start_timing(&self, value: AnimatedValue, config: TimingConfig, on_complete: Completion) {
        value.set_value(config.to_value);
        on_complete(AnimationEnd { finished: true });
    }
}

impl FrameScheduler for ImmediateHost {
    fn request_frame(&self, callback: FrameCallback) {
        callback();
    }
}

struct Running {
    value: AnimatedValue,
    from: f64,
    config: TimingConfig,
    elapsed_ms: f32,
    on_complete: Completion,
}

/// Host driven by explicit time steps.
///
/// `advance(dt_ms)` runs the frame callbacks requested before the call, then
/// steps every running animation, then fires completions of the ones that
/// reached their end. Starting an animation on a value that is already
/// animating interrupts the previous one (`finished = false`).
#[derive(Default)]
pub struct SteppedHost {
    running: RefCell<Vec<Running>>,
    frames: RefCell<Vec<FrameCallback>>,
    started: Cell<usize>,
    last_config: Cell<Option<TimingConfig>>,
}

impl SteppedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `start_timing` calls received so far.
    pub fn timings_started(&self) -> usize {
        self.started.get()
    }

    /// Config of the most recent `start_timing` call.
    pub fn last_config(&self) -> Option<TimingConfig> {
        self.last_config.get()
    }

    pub fn running_count(&self) -> usize {
        self.running.borrow().len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.running_count() == 0 && self.pending_frames() == 0
    }

    /// Advance time by `dt_ms`.
    pub fn advance(&self, dt_ms: f32) {
        let frames = std::mem::take(&mut *self.frames.borrow_mut());
        for frame in frames {
            frame();
        }

        let mut updates = Vec::new();
        let mut done = Vec::new();
        {
            let mut running = self.running.borrow_mut();
            let mut i = 0;
            while i < running.len() {
                let r = &mut running[i];
                r.elapsed_ms += dt_ms.max(0.0);
                let t = if r.config.duration_ms <= 0.0 {
                    1.0
                } else {
                    (r.elapsed_ms / r.config.duration_ms).min(1.0) as f64
                };
                let eased = r.config.easing.apply(t);
                let next = if t >= 1.0 {
                    r.config.to_value
                } else {
                    r.from + (r.config.to_value - r.from) * eased
                };
                updates.push((r.value.share(), next));
                if t >= 1.0 {
                    done.push(running.remove(i).on_complete);
                } else {
                    i += 1;
                }
            }
        }

        for (value, next) in updates {
            value.set_value(next);
        }
        for on_complete in done {
            on_complete(AnimationEnd { finished: true });
        }
    }

    /// Advance in `frame_ms` steps until idle or `max_frames` steps ran.
    /// Returns the number of steps taken.
    pub fn run_until_idle(&self, frame_ms: f32, max_frames: usize) -> usize {
        let mut frames = 0;
        while !self.is_idle() && frames < max_frames {
            self.advance(frame_ms);
            frames += 1;
        }
        frames
    }
}

impl Animator for SteppedHost {
    fn start_timing(&self, value: AnimatedValue, config: TimingConfig, on_complete: Completion) {
        self.started.set(self.started.get() + 1);
        self.last_config.set(Some(config));
        let interrupted = {
            let mut running = self.running.borrow_mut();
            let prior = running
                .iter()
                .position(|r| r.value.same_value(&value))
                .map(|i| running.remove(i).on_complete);
            running.push(Running {
                from: value.get(),
                value,
                config,
                elapsed_ms: 0.0,
                on_complete,
            });
            prior
        };
        if let Some(on_complete) = interrupted {
            on_complete(AnimationEnd { finished: false });
        }
    }
}

impl FrameScheduler for SteppedHost {
    fn request_frame(&self, callback: FrameCallback) {
        self.frames.borrow_mut().push(callback);
    }
}

impl fmt::Debug for SteppedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteppedHost")
            .field("running", &self.running_count())
            .field("pending_frames", &self.pending_frames())
            .field("started", &self.started.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn approx(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn linear(to_value: f64, duration_ms: f32) -> TimingConfig {
        TimingConfig {
            to_value,
            duration_ms,
            easing: Easing::Linear,
        }
    }

    #[test]
    fn immediate_host_jumps_and_completes() {
        let value = AnimatedValue::new(0.0);
        let finished = Rc::new(Cell::new(None));
        let f = finished.clone();
        ImmediateHost.start_timing(value.share(), linear(2.0, 250.0), Box::new(move |end| f.set(Some(end.finished))));
        assert_eq!(value.get(), 2.0);
        assert_eq!(finished.get(), Some(true));
    }

    #[test]
    fn stepped_host_interpolates_over_duration() {
        let host = SteppedHost::new();
        let value = AnimatedValue::new(0.0);
        let finished = Rc::new(Cell::new(false));
        let f = finished.clone();
        host.start_timing(value.share(), linear(1.0, 100.0), Box::new(move |_| f.set(true)));

        host.advance(25.0);
        approx(value.get(), 0.25, 1e-6);
        host.advance(50.0);
        approx(value.get(), 0.75, 1e-6);
        assert!(!finished.get());
        host.advance(50.0);
        assert_eq!(value.get(), 1.0);
        assert!(finished.get());
        assert!(host.is_idle());
    }

    #[test]
    fn frames_run_on_the_following_advance() {
        let host = SteppedHost::new();
        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        host.request_frame(Box::new(move || r.set(true)));
        assert!(!ran.get());
        host.advance(16.0);
        assert!(ran.get());
    }

    #[test]
    fn new_timing_interrupts_running_one_on_same_value() {
        let host = SteppedHost::new();
        let value = AnimatedValue::new(0.0);
        let first = Rc::new(Cell::new(None));
        let f = first.clone();
        host.start_timing(value.share(), linear(1.0, 100.0), Box::new(move |end| f.set(Some(end.finished))));
        host.advance(50.0);
        host.start_timing(value.share(), linear(0.0, 100.0), Box::new(|_| {}));
        assert_eq!(first.get(), Some(false));
        assert_eq!(host.running_count(), 1);
        assert_eq!(host.timings_started(), 2);
    }

    #[test]
    fn zero_duration_completes_on_first_step() {
        let host = SteppedHost::new();
        let value = AnimatedValue::new(3.0);
        host.start_timing(value.share(), linear(1.0, 0.0), Box::new(|_| {}));
        assert_eq!(host.run_until_idle(16.0, 10), 1);
        assert_eq!(value.get(), 1.0);
    }
}
