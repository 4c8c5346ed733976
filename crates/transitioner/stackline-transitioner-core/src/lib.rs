//! stackline-transitioner
//!
//! Transition orchestration for a stacked-screen navigator, independent of any
//! UI toolkit. A `Transitioner` reconciles navigation states into scenes,
//! drives one shared progress value between scene indices through a host
//! `Animator`, and brackets every logical transition with exactly one
//! start/end hook pair. `PointerEventsGate` derives per-scene input gating from
//! the same progress value.

pub mod config;
pub mod data;
pub mod deferred;
pub mod easing;
pub mod error;
pub mod host;
pub mod pointer_events;
pub mod scenes;
pub mod transition;
pub mod transitioner;
pub mod value;

pub use config::{TransitionSpec, TransitionSpecOverride, TransitionerConfig, DEFAULT_DURATION_MS};
pub use data::{descriptors_for, Descriptors, NavigationState, Route, Scene, SceneDescriptor, SceneList};
pub use deferred::Deferred;
pub use easing::Easing;
pub use error::TransitionError;
pub use host::{
    AnimationEnd, Animator, Completion, FrameCallback, FrameScheduler, ImmediateHost, SteppedHost,
    TimingConfig,
};
pub use pointer_events::{
    compute_pointer_events, NativeProps, PointerEvents, PointerEventsGate, ViewHandle,
    MIN_POSITION_OFFSET,
};
pub use scenes::{filter_stale, reconcile};
pub use transition::{TransitionProps, TransitionerLayout};
pub use transitioner::{Phase, Transitioner, TransitionerBuilder, TransitionerProps};
pub use value::{AnimatedValue, AnimatedValueReader, ListenerId};

/// Transitioner result type
pub type Result<T> = core::result::Result<T, TransitionError>;
