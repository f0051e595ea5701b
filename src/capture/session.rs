//! Capture session state machine
//!
//! Coordinates the lifecycle of one classification window: starting a
//! session, accepting frames until the window is full, the cooperative
//! collection timeout, and manual triggering on a partial window.
//!
//! Every reset path bumps the session generation. The generation is held in
//! an `Arc<AtomicU64>` so the result gate can compare an in-flight
//! inference result against the current generation without taking the
//! session lock. All read-modify-write of {state, generation, window}
//! happens through `&mut self`, which the pipeline guards with a single
//! exclusive lock.

use super::frame::FeatureVector;
use super::window::CaptureWindow;
use crate::config::CaptureConfig;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Capture session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// No window open; waiting for a session to start
    #[default]
    Idle,
    /// Window open and accepting frames
    Collecting,
    /// Window snapshot dispatched for inference; window already cleared
    AwaitingInference,
}

impl CaptureState {
    /// Returns a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Waiting for capture to start",
            CaptureState::Collecting => "Collecting hand-pose frames",
            CaptureState::AwaitingInference => "Window dispatched for classification",
        }
    }

    /// Returns whether frames are accepted in this state
    pub fn is_collecting(&self) -> bool {
        matches!(self, CaptureState::Collecting)
    }
}

/// Errors raised at the frame-ingestion boundary
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    /// The detector supplied a vector of the wrong length (caller bug).
    /// The frame is rejected; the session is unaffected.
    #[error("invalid feature vector length: expected {expected}, got {actual}")]
    InvalidVectorLength { expected: usize, actual: usize },
}

/// A snapshot handed to the inference dispatcher, tagged with the
/// generation that produced it
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Generation current at the moment the snapshot was taken
    pub generation: u64,
    /// Ordered frames, length ≤ N (padded to exactly N by the dispatcher)
    pub snapshot: Vec<FeatureVector>,
    /// When the snapshot was taken
    pub submitted_at: Instant,
}

/// Result of feeding one frame to the session
#[derive(Debug)]
pub enum FrameOutcome {
    /// Frame accepted; window not yet full
    Appended {
        /// Frames collected so far in this window
        current_frame: usize,
        /// Window capacity
        total_frames: usize,
    },
    /// Session was not collecting; frame dropped
    Ignored,
    /// The frame completed the window; submit this request for inference.
    /// The window is already cleared and the session is back to Idle.
    WindowReady(InferenceRequest),
    /// The collection timeout elapsed; session silently reset to Idle.
    /// The incoming frame was dropped along with the stale window.
    TimedOut,
}

/// Capture state machine
///
/// Owns the window and the generation counter. Not internally
/// synchronised; the pipeline wraps it in a `parking_lot::Mutex`.
pub struct CaptureStateMachine {
    state: CaptureState,
    window: CaptureWindow,
    generation: Arc<AtomicU64>,
    started_at: Option<Instant>,
    frame_count: u64,
    feature_len: usize,
    collection_timeout: Duration,
}

impl CaptureStateMachine {
    /// Creates a new state machine in the Idle state
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            state: CaptureState::Idle,
            window: CaptureWindow::new(config.window_frames),
            generation: Arc::new(AtomicU64::new(0)),
            started_at: None,
            frame_count: 0,
            feature_len: config.feature_len,
            collection_timeout: Duration::from_millis(config.collection_timeout_ms),
        }
    }

    /// Returns the current state
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Returns the current generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns a handle to the generation counter for the result gate
    pub fn generation_handle(&self) -> Arc<AtomicU64> {
        self.generation.clone()
    }

    /// Frames collected in the current window
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Total frames accepted by the current session
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Starts a new collection session
    ///
    /// Idle/AwaitingInference → Collecting: allocates a fresh window, bumps
    /// the generation (invalidating any in-flight inference), and resets
    /// the frame count and start timestamp. No-op while already Collecting.
    ///
    /// Returns true if a new session was started.
    pub fn start(&mut self) -> bool {
        if self.state == CaptureState::Collecting {
            return false;
        }

        self.window.clear();
        let generation = self.bump_generation();
        self.state = CaptureState::Collecting;
        self.started_at = Some(Instant::now());
        self.frame_count = 0;

        tracing::info!("Capture session started (generation {})", generation);
        true
    }

    /// Feeds one frame to the session
    ///
    /// Validates the vector length, evaluates the collection timeout, and
    /// appends the frame. When the frame completes the window the snapshot
    /// is taken and the window cleared in this same call, so a concurrent
    /// producer can never append to a window already handed off.
    pub fn add_frame(&mut self, frame: FeatureVector) -> Result<FrameOutcome, CaptureError> {
        if frame.len() != self.feature_len {
            return Err(CaptureError::InvalidVectorLength {
                expected: self.feature_len,
                actual: frame.len(),
            });
        }

        if self.state != CaptureState::Collecting {
            return Ok(FrameOutcome::Ignored);
        }

        if self.is_timed_out() {
            self.abort_timed_out();
            return Ok(FrameOutcome::TimedOut);
        }

        let len = self.window.push(frame);
        self.frame_count += 1;

        if self.window.is_ready() {
            return Ok(FrameOutcome::WindowReady(self.take_snapshot()));
        }

        Ok(FrameOutcome::Appended {
            current_frame: len,
            total_frames: self.window.capacity(),
        })
    }

    /// Evaluates the collection timeout without feeding a frame
    ///
    /// Periodic-tick counterpart of the check in `add_frame`, covering the
    /// case where the hand left the frame and no further frames arrive.
    /// Returns true if the session was aborted.
    pub fn check_timeout(&mut self) -> bool {
        if self.state == CaptureState::Collecting && self.is_timed_out() {
            self.abort_timed_out();
            return true;
        }
        false
    }

    /// Stops the session and invalidates any in-flight inference
    ///
    /// Clears the window and bumps the generation unconditionally: a result
    /// computed from a window snapshotted before this call must never
    /// produce an action. Cooldown state is untouched.
    pub fn stop(&mut self) {
        let was_active = self.state != CaptureState::Idle || !self.window.is_empty();
        self.window.clear();
        let generation = self.bump_generation();
        self.state = CaptureState::Idle;
        self.started_at = None;

        if was_active {
            tracing::info!("Capture session stopped (generation {})", generation);
        } else {
            tracing::debug!("Capture stop with no active session (generation {})", generation);
        }
    }

    /// Forces an immediate snapshot of a partial window
    ///
    /// Returns None when there is nothing to infer. The dispatcher pads the
    /// partial snapshot to a full window before classification.
    pub fn manual_trigger(&mut self) -> Option<InferenceRequest> {
        if self.window.is_empty() {
            tracing::debug!("Manual trigger with empty window; nothing to infer");
            return None;
        }

        let request = self.take_snapshot();
        tracing::info!(
            "Manual trigger: dispatching partial window of {} frames (generation {})",
            request.snapshot.len(),
            request.generation
        );
        Some(request)
    }

    /// Snapshots and clears the window, transitioning through
    /// AwaitingInference back to Idle so the next `start()` can begin
    /// without waiting on the classifier
    fn take_snapshot(&mut self) -> InferenceRequest {
        self.state = CaptureState::AwaitingInference;
        let snapshot = self.window.snapshot_and_clear();
        let request = InferenceRequest {
            generation: self.generation(),
            snapshot,
            submitted_at: Instant::now(),
        };
        self.state = CaptureState::Idle;
        self.started_at = None;
        request
    }

    fn is_timed_out(&self) -> bool {
        self.started_at
            .map(|t| t.elapsed() > self.collection_timeout)
            .unwrap_or(false)
    }

    /// Aborts a session whose collection timeout elapsed: window cleared,
    /// generation bumped, state back to Idle. Routine control flow, not an
    /// error.
    fn abort_timed_out(&mut self) {
        self.window.clear();
        let generation = self.bump_generation();
        self.state = CaptureState::Idle;
        self.started_at = None;
        tracing::debug!(
            "Collection timeout; session reset (generation {})",
            generation
        );
    }

    fn bump_generation(&mut self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}
