//! Mudra - Streaming hand-gesture capture and recognition
//!
//! Turns a stream of per-frame hand-landmark feature vectors into discrete
//! pointer actions: frames accumulate into a fixed-size window, the window
//! is classified off the producer thread, stale results are gated by a
//! session generation counter, confirmed gestures are debounced, and the
//! surviving gesture maps to an abstract swipe or tap for the host's input
//! synthesiser.
//!
//! Landmark detection and OS-level input injection live outside this crate,
//! behind the [`Classifier`] and [`ActionDispatcher`] seams.

pub mod actions;
pub mod capture;
pub mod config;
pub mod debounce;
pub mod gate;
pub mod inference;
pub mod pipeline;
pub mod telemetry;
pub mod timer;

pub use actions::{action_for, AbstractAction, ActionDispatcher, GestureClass, SwipeDirection};
pub use capture::{CaptureError, CaptureState, FeatureVector};
pub use config::PipelineConfig;
pub use inference::{Classifier, GestureResult, InferenceError, WindowTensor};
pub use pipeline::{GesturePipeline, PipelineEvent, PipelineStatus};
