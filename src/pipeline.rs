//! Gesture pipeline orchestration
//!
//! Wires together the complete flow from frame ingestion to action output:
//! 1. Capture (frames accumulate into a window via the session machine)
//! 2. Inference (window snapshot classified off the producer thread)
//! 3. Gating (results from superseded sessions dropped)
//! 4. Debounce (suppression window between actions)
//! 5. Mapping (gesture class to abstract action)
//! 6. Dispatch (fire-and-forget to the external input dispatcher)
//!
//! `GesturePipeline` is a single long-lived object constructed once by the
//! hosting process; there is no ambient global instance. Telemetry flows
//! out as `PipelineEvent`s over a bounded channel.

use crate::actions::{action_for, AbstractAction, ActionDispatcher, GestureClass};
use crate::capture::{
    CaptureError, CaptureState, CaptureStateMachine, FeatureVector, FrameOutcome,
};
use crate::config::PipelineConfig;
use crate::debounce::{CooldownGate, Decision};
use crate::gate::ResultGate;
use crate::inference::{
    Classifier, GestureResult, InferenceDispatcher, InferenceError, InferenceOutcome,
};
use crate::timer::DeferredTask;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Event channel depth; events beyond this are dropped, not buffered
const EVENT_QUEUE_DEPTH: usize = 256;

/// How often the result thread wakes to run the timeout watchdog
const WATCHDOG_INTERVAL: Duration = Duration::from_millis(100);

/// Error taxonomy surfaced through the event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The detector supplied a wrong-length vector (caller bug)
    InvalidVectorLength,
    /// The classifier backend is not initialised yet
    ClassifierNotReady,
    /// The classifier violated its output-shape contract
    ClassifierOutputMismatch,
}

/// Telemetry events emitted by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A new capture session began collecting
    CaptureStarted { generation: u64 },
    /// Capture stopped (host request or disable)
    CaptureStopped { generation: u64 },
    /// Window fill progress
    Progress {
        current_frame: usize,
        total_frames: usize,
    },
    /// Hand entered or left the frame
    HandPresence { present: bool },
    /// A window snapshot went to the classifier
    WindowDispatched { generation: u64, frames: usize },
    /// A gesture was classified (before debounce)
    Gesture {
        class: GestureClass,
        result: GestureResult,
    },
    /// An action was handed to the input dispatcher
    ActionDispatched { action: AbstractAction },
    /// A gesture fell inside the suppression window
    GestureSuppressed { class: GestureClass },
    /// A partial window lingered past the collection timeout
    CollectionTimeout { generation: u64 },
    /// Capture paused after a dispatched action
    CapturePaused { resume_in_ms: u64 },
    /// The post-detection cooldown elapsed
    CaptureResumed,
    /// A recoverable fault was surfaced to the host
    Error { kind: ErrorKind, message: String },
}

/// Snapshot of the pipeline's current state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    /// Whether the pipeline accepts frames at all
    pub enabled: bool,
    /// Whether capture is paused for the post-detection cooldown
    pub paused: bool,
    /// Whether a hand is currently in frame
    pub hand_present: bool,
    /// Capture session state
    pub state: CaptureState,
    /// Current session generation
    pub generation: u64,
    /// Frames collected in the open window
    pub window_frames: usize,
    /// Time left in the debounce suppression window
    pub suppression_remaining_ms: u64,
}

/// Streaming gesture recognition pipeline
///
/// Owns the capture session, the inference dispatcher, and the
/// result-handling thread. Construct once, keep alive for the life of the
/// host.
pub struct GesturePipeline {
    inner: Arc<PipelineInner>,
    events_rx: Receiver<PipelineEvent>,
    result_thread: Option<std::thread::JoinHandle<()>>,
}

struct PipelineInner {
    config: PipelineConfig,
    session: Mutex<CaptureStateMachine>,
    dispatcher: InferenceDispatcher,
    gate: ResultGate,
    cooldown: Mutex<CooldownGate>,
    actions: Arc<dyn ActionDispatcher>,
    events_tx: Sender<PipelineEvent>,
    enabled: AtomicBool,
    paused: AtomicBool,
    hand_present: AtomicBool,
    pending_resume: Mutex<Option<DeferredTask>>,
    shutdown: AtomicBool,
}

impl GesturePipeline {
    /// Creates a pipeline around the given classifier and action dispatcher
    pub fn new(
        config: PipelineConfig,
        classifier: Arc<dyn Classifier>,
        actions: Arc<dyn ActionDispatcher>,
    ) -> Self {
        let session = CaptureStateMachine::new(&config.capture);
        let gate = ResultGate::new(session.generation_handle());
        let dispatcher = InferenceDispatcher::new(classifier, &config);
        let cooldown = CooldownGate::new(config.cooldown.suppression_window_ms);
        let (events_tx, events_rx) = bounded(EVENT_QUEUE_DEPTH);

        let inner = Arc::new(PipelineInner {
            config,
            session: Mutex::new(session),
            dispatcher,
            gate,
            cooldown: Mutex::new(cooldown),
            actions,
            events_tx,
            enabled: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            hand_present: AtomicBool::new(false),
            pending_resume: Mutex::new(None),
            shutdown: AtomicBool::new(false),
        });

        let result_inner = inner.clone();
        let outcomes = inner.dispatcher.outcomes();
        let result_thread = std::thread::spawn(move || {
            run_result_loop(result_inner, outcomes);
        });

        Self {
            inner,
            events_rx,
            result_thread: Some(result_thread),
        }
    }

    /// Receiver for pipeline telemetry events
    ///
    /// Clone to consume events on another thread.
    pub fn events(&self) -> Receiver<PipelineEvent> {
        self.events_rx.clone()
    }

    /// Enables or disables the pipeline
    ///
    /// Enabling starts a capture session; disabling stops it, cancels any
    /// pending cooldown resume, and clears the paused state.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.inner.enabled.swap(enabled, Ordering::SeqCst);
        if previous == enabled {
            return;
        }
        tracing::info!(
            "Gesture pipeline {}",
            if enabled { "enabled" } else { "disabled" }
        );

        if enabled {
            self.inner.start_capture();
        } else {
            // Dropping the task cancels the deferred resume
            *self.inner.pending_resume.lock() = None;
            self.inner.paused.store(false, Ordering::SeqCst);
            self.inner.stop_capture();
        }
    }

    /// Whether the pipeline is enabled
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Whether capture is paused for the post-detection cooldown
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Starts a capture session
    ///
    /// Returns false if the pipeline is disabled, paused, or already
    /// collecting.
    pub fn start_capture(&self) -> bool {
        self.inner.start_capture()
    }

    /// Stops the current capture session and invalidates in-flight results
    pub fn stop_capture(&self) {
        self.inner.stop_capture();
    }

    /// Feeds one detector frame to the pipeline
    ///
    /// Frames arriving while paused or disabled are dropped, not buffered.
    /// Returns an error only for wrong-length vectors; the session is
    /// unaffected in that case.
    pub fn on_frame(&self, values: Vec<f32>) -> Result<(), CaptureError> {
        if !self.is_enabled() || self.is_paused() {
            return Ok(());
        }

        let outcome = {
            let mut session = self.inner.session.lock();
            session.add_frame(FeatureVector::new(values))
        };

        match outcome {
            Ok(FrameOutcome::Appended {
                current_frame,
                total_frames,
            }) => {
                self.inner.emit(PipelineEvent::Progress {
                    current_frame,
                    total_frames,
                });
                Ok(())
            }
            Ok(FrameOutcome::WindowReady(request)) => {
                self.inner.emit(PipelineEvent::WindowDispatched {
                    generation: request.generation,
                    frames: request.snapshot.len(),
                });
                self.inner.dispatcher.submit(request);
                Ok(())
            }
            Ok(FrameOutcome::TimedOut) => {
                self.inner.handle_collection_timeout();
                Ok(())
            }
            Ok(FrameOutcome::Ignored) => Ok(()),
            Err(e) => {
                self.inner.emit(PipelineEvent::Error {
                    kind: ErrorKind::InvalidVectorLength,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Reports whether a hand is currently in frame
    pub fn set_hand_present(&self, present: bool) {
        let previous = self.inner.hand_present.swap(present, Ordering::SeqCst);
        if previous != present {
            self.inner.emit(PipelineEvent::HandPresence { present });
        }
    }

    /// Forces classification of the partially collected window
    ///
    /// Returns false if the pipeline is inactive or the window is empty.
    pub fn manual_trigger(&self) -> bool {
        if !self.is_enabled() || self.is_paused() {
            return false;
        }

        let request = self.inner.session.lock().manual_trigger();
        match request {
            Some(request) => {
                self.inner.emit(PipelineEvent::WindowDispatched {
                    generation: request.generation,
                    frames: request.snapshot.len(),
                });
                self.inner.dispatcher.submit(request);
                true
            }
            None => false,
        }
    }

    /// Returns the current pipeline status
    pub fn status(&self) -> PipelineStatus {
        let session = self.inner.session.lock();
        PipelineStatus {
            enabled: self.is_enabled(),
            paused: self.is_paused(),
            hand_present: self.inner.hand_present.load(Ordering::SeqCst),
            state: session.state(),
            generation: session.generation(),
            window_frames: session.window_len(),
            suppression_remaining_ms: self
                .inner
                .cooldown
                .lock()
                .suppression_remaining()
                .as_millis() as u64,
        }
    }
}

impl Drop for GesturePipeline {
    fn drop(&mut self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
        *self.inner.pending_resume.lock() = None;
        if let Some(handle) = self.result_thread.take() {
            let _ = handle.join();
        }
    }
}

impl PipelineInner {
    fn start_capture(&self) -> bool {
        if !self.enabled.load(Ordering::SeqCst) || self.paused.load(Ordering::SeqCst) {
            return false;
        }

        let started = {
            let mut session = self.session.lock();
            if session.start() {
                Some(session.generation())
            } else {
                None
            }
        };

        match started {
            Some(generation) => {
                self.emit(PipelineEvent::CaptureStarted { generation });
                true
            }
            None => false,
        }
    }

    fn stop_capture(&self) {
        let generation = {
            let mut session = self.session.lock();
            session.stop();
            session.generation()
        };
        self.emit(PipelineEvent::CaptureStopped { generation });
    }

    /// Applies one classifier outcome that passed the result gate
    fn handle_outcome(self: &Arc<Self>, outcome: InferenceOutcome) {
        let outcome = match self.gate.check(outcome) {
            Some(outcome) => outcome,
            None => return, // stale; routine drop
        };

        match outcome.result {
            Ok(result) => self.handle_gesture(result),
            Err(e) => self.handle_inference_error(e),
        }
    }

    fn handle_gesture(self: &Arc<Self>, result: GestureResult) {
        let class = GestureClass::from_index(result.gesture_class);
        tracing::info!(
            "Gesture classified: {:?} (confidence {:.3}, {} ms)",
            class,
            result.confidence,
            result.latency_ms
        );
        self.emit(PipelineEvent::Gesture {
            class,
            result: result.clone(),
        });

        if !class.is_actionable() {
            // Idle/unknown gestures never reach the debounce gate or the
            // dispatcher; keep scanning.
            self.start_capture();
            return;
        }

        match self.cooldown.lock().consider() {
            Decision::Suppressed => {
                self.emit(PipelineEvent::GestureSuppressed { class });
                self.start_capture();
            }
            Decision::Dispatch => {
                if let Some(action) = action_for(class) {
                    self.actions.dispatch(action);
                    self.emit(PipelineEvent::ActionDispatched { action });
                    self.pause_for_cooldown();
                }
            }
        }
    }

    fn handle_inference_error(&self, error: InferenceError) {
        let kind = match error {
            InferenceError::NotReady => ErrorKind::ClassifierNotReady,
            InferenceError::OutputMismatch { .. } => ErrorKind::ClassifierOutputMismatch,
        };
        self.emit(PipelineEvent::Error {
            kind,
            message: error.to_string(),
        });

        match error {
            // Backend not initialised: session left as-is, the host can
            // retry via manual_trigger once the model loads.
            InferenceError::NotReady => {}
            // Contract violation: reset so a corrupt window cannot fail
            // repeatedly.
            InferenceError::OutputMismatch { .. } => {
                self.session.lock().stop();
            }
        }
    }

    /// Suspends capture for the post-detection cooldown
    ///
    /// Frames arriving while paused are dropped, not buffered. The deferred
    /// resume is the only path back to capturing; scheduling a new pause
    /// replaces a pending resume rather than stacking a second timer.
    fn pause_for_cooldown(self: &Arc<Self>) {
        let cooldown_ms = self.config.cooldown.post_detection_cooldown_ms;
        self.paused.store(true, Ordering::SeqCst);
        self.session.lock().stop();
        tracing::info!("Capture paused for {} ms cooldown", cooldown_ms);
        self.emit(PipelineEvent::CapturePaused {
            resume_in_ms: cooldown_ms,
        });

        let weak = Arc::downgrade(self);
        let task = DeferredTask::schedule(Duration::from_millis(cooldown_ms), move || {
            if let Some(inner) = weak.upgrade() {
                inner.resume_capture();
            }
        });
        *self.pending_resume.lock() = Some(task);
    }

    fn resume_capture(&self) {
        *self.pending_resume.lock() = None;
        self.paused.store(false, Ordering::SeqCst);
        self.emit(PipelineEvent::CaptureResumed);

        if self.enabled.load(Ordering::SeqCst) {
            let generation = {
                let mut session = self.session.lock();
                session.start();
                session.generation()
            };
            tracing::info!("Cooldown elapsed; capture resumed");
            self.emit(PipelineEvent::CaptureStarted { generation });
        }
    }

    /// Timeout reset path shared by `on_frame` and the watchdog tick
    fn handle_collection_timeout(&self) {
        let generation = self.session.lock().generation();
        self.emit(PipelineEvent::CollectionTimeout { generation });

        // The producer has no signal to restart capture itself, so the
        // pipeline re-opens the session when it is still active.
        if self.enabled.load(Ordering::SeqCst) && !self.paused.load(Ordering::SeqCst) {
            let generation = {
                let mut session = self.session.lock();
                session.start();
                session.generation()
            };
            self.emit(PipelineEvent::CaptureStarted { generation });
        }
    }

    fn emit(&self, event: PipelineEvent) {
        if self.events_tx.try_send(event).is_err() {
            tracing::debug!("Event queue full; dropping pipeline event");
        }
    }
}

/// Result-handling loop: consumes classifier outcomes and runs the timeout
/// watchdog while idle
fn run_result_loop(inner: Arc<PipelineInner>, outcomes: Receiver<InferenceOutcome>) {
    loop {
        match outcomes.recv_timeout(WATCHDOG_INTERVAL) {
            Ok(outcome) => inner.handle_outcome(outcome),
            Err(RecvTimeoutError::Timeout) => {
                if inner.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                // Periodic tick: catches a session whose hand left the
                // frame and stopped producing frames entirely.
                let timed_out = inner.session.lock().check_timeout();
                if timed_out {
                    inner.handle_collection_timeout();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::debug!("Result-handling thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::WindowTensor;

    struct FixedClassifier(Vec<f32>);

    impl Classifier for FixedClassifier {
        fn classify(&self, _tensor: &WindowTensor) -> Result<Vec<f32>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    struct RecordingDispatcher(Mutex<Vec<AbstractAction>>);

    impl ActionDispatcher for RecordingDispatcher {
        fn dispatch(&self, action: AbstractAction) {
            self.0.lock().push(action);
        }
    }

    fn test_pipeline(probabilities: Vec<f32>) -> (GesturePipeline, Arc<RecordingDispatcher>) {
        let mut config = PipelineConfig::default();
        config.capture.window_frames = 5;
        config.capture.feature_len = 3;

        let recorder = Arc::new(RecordingDispatcher(Mutex::new(Vec::new())));
        let pipeline = GesturePipeline::new(
            config,
            Arc::new(FixedClassifier(probabilities)),
            recorder.clone(),
        );
        (pipeline, recorder)
    }

    #[test]
    fn test_disabled_pipeline_drops_frames() {
        let (pipeline, _) = test_pipeline(vec![0.9, 0.05, 0.03, 0.02]);
        assert!(!pipeline.is_enabled());

        pipeline.on_frame(vec![0.0; 3]).unwrap();
        assert_eq!(pipeline.status().window_frames, 0);
    }

    #[test]
    fn test_enable_starts_capture() {
        let (pipeline, _) = test_pipeline(vec![0.9, 0.05, 0.03, 0.02]);
        let events = pipeline.events();

        pipeline.set_enabled(true);
        assert!(pipeline.is_enabled());
        assert_eq!(pipeline.status().state, CaptureState::Collecting);

        let event = events.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(matches!(event, PipelineEvent::CaptureStarted { .. }));
    }

    #[test]
    fn test_invalid_length_surfaces_error_and_keeps_session() {
        let (pipeline, _) = test_pipeline(vec![0.9, 0.05, 0.03, 0.02]);
        pipeline.set_enabled(true);

        let result = pipeline.on_frame(vec![0.0; 10]);
        assert!(matches!(
            result,
            Err(CaptureError::InvalidVectorLength { .. })
        ));
        assert_eq!(pipeline.status().state, CaptureState::Collecting);
    }

    #[test]
    fn test_hand_presence_emits_on_change_only() {
        let (pipeline, _) = test_pipeline(vec![0.9, 0.05, 0.03, 0.02]);
        let events = pipeline.events();

        pipeline.set_hand_present(true);
        pipeline.set_hand_present(true);
        pipeline.set_hand_present(false);

        let mut presence_events = 0;
        while let Ok(event) = events.recv_timeout(Duration::from_millis(100)) {
            if matches!(event, PipelineEvent::HandPresence { .. }) {
                presence_events += 1;
            }
        }
        assert_eq!(presence_events, 2);
    }

    #[test]
    fn test_manual_trigger_with_empty_window_returns_false() {
        let (pipeline, _) = test_pipeline(vec![0.9, 0.05, 0.03, 0.02]);
        pipeline.set_enabled(true);
        assert!(!pipeline.manual_trigger());
    }

    #[test]
    fn test_disable_clears_paused_state() {
        let (pipeline, _) = test_pipeline(vec![0.9, 0.05, 0.03, 0.02]);
        pipeline.set_enabled(true);
        pipeline.set_enabled(false);

        assert!(!pipeline.is_enabled());
        assert!(!pipeline.is_paused());
        assert_eq!(pipeline.status().state, CaptureState::Idle);
    }

    #[test]
    fn test_status_serialisation() {
        let (pipeline, _) = test_pipeline(vec![0.9, 0.05, 0.03, 0.02]);
        let status = pipeline.status();

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"enabled\":false"));
        assert!(json.contains("\"windowFrames\":0"));
    }
}
