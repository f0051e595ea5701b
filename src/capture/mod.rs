//! Capture subsystem
//!
//! Accumulates per-frame hand-pose feature vectors into fixed-size
//! classification windows and owns the session lifecycle around them.

pub mod frame;
pub mod session;
pub mod window;

pub use frame::{FeatureVector, COORDS_PER_LANDMARK, DEFAULT_FEATURE_LEN, LANDMARK_COUNT};
pub use session::{
    CaptureError, CaptureState, CaptureStateMachine, FrameOutcome, InferenceRequest,
};
pub use window::CaptureWindow;
