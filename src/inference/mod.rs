//! Inference subsystem
//!
//! The classifier seam and the worker thread that keeps model latency off
//! the frame-producer path.

pub mod classifier;
pub mod dispatcher;

pub use classifier::{Classifier, InferenceError, WindowTensor};
pub use dispatcher::{GestureResult, InferenceDispatcher, InferenceOutcome};
