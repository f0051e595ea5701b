//! Asynchronous inference dispatch
//!
//! Runs the classifier on a dedicated worker thread so frame ingestion is
//! never blocked by model latency. Requests arrive through a bounded
//! channel; each outcome carries the generation of the window that produced
//! it so the result gate can discard results from superseded sessions.

use super::classifier::{Classifier, InferenceError, WindowTensor};
use crate::capture::InferenceRequest;
use crate::config::PipelineConfig;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long the worker waits for a request before re-checking the stop flag
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A classified gesture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureResult {
    /// Winning class index, in [0, K)
    pub gesture_class: usize,
    /// Probability of the winning class
    pub confidence: f32,
    /// Full probability vector (K entries; summing to 1 is the
    /// classifier's contract, not enforced here)
    pub probabilities: Vec<f32>,
    /// End-to-end latency from snapshot to classification, in milliseconds
    pub latency_ms: u64,
    /// When the classification completed
    pub detected_at: DateTime<Utc>,
}

/// A classification outcome tagged with its originating generation
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    /// Generation of the session that produced the window
    pub generation: u64,
    /// The result, or the typed failure forwarded to the caller
    pub result: Result<GestureResult, InferenceError>,
}

/// Inference dispatcher
///
/// Owns the worker thread and the request/outcome channels. `submit` is
/// non-blocking; outcomes are consumed from the receiver returned by
/// `outcomes()`, typically by the pipeline's result-handling thread.
pub struct InferenceDispatcher {
    request_tx: Sender<InferenceRequest>,
    outcome_rx: Receiver<InferenceOutcome>,
    stop_signal: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl InferenceDispatcher {
    /// Creates a dispatcher and spawns its worker thread
    pub fn new(classifier: Arc<dyn Classifier>, config: &PipelineConfig) -> Self {
        let (request_tx, request_rx) = bounded::<InferenceRequest>(config.inference.queue_depth);
        let (outcome_tx, outcome_rx) = bounded::<InferenceOutcome>(config.inference.queue_depth);
        let stop_signal = Arc::new(AtomicBool::new(false));

        let rows = config.capture.window_frames;
        let cols = config.capture.feature_len;
        let class_count = config.inference.class_count;
        let stop = stop_signal.clone();

        let worker = std::thread::spawn(move || {
            run_worker(
                classifier,
                request_rx,
                outcome_tx,
                stop,
                rows,
                cols,
                class_count,
            );
        });

        Self {
            request_tx,
            outcome_rx,
            stop_signal,
            worker: Some(worker),
        }
    }

    /// Submits a request for classification without blocking
    ///
    /// Returns false if the queue is full, which means the classifier has
    /// fallen far behind; the window is dropped rather than buffered.
    pub fn submit(&self, request: InferenceRequest) -> bool {
        let generation = request.generation;
        match self.request_tx.try_send(request) {
            Ok(()) => {
                tracing::debug!("Inference request queued (generation {})", generation);
                true
            }
            Err(_) => {
                tracing::warn!(
                    "Inference queue full; dropping request (generation {})",
                    generation
                );
                false
            }
        }
    }

    /// Receiver for classification outcomes
    ///
    /// Clone this to consume outcomes on another thread.
    pub fn outcomes(&self) -> Receiver<InferenceOutcome> {
        self.outcome_rx.clone()
    }
}

impl Drop for InferenceDispatcher {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// Worker loop: normalise, classify, time, tag, deliver
fn run_worker(
    classifier: Arc<dyn Classifier>,
    request_rx: Receiver<InferenceRequest>,
    outcome_tx: Sender<InferenceOutcome>,
    stop_signal: Arc<AtomicBool>,
    rows: usize,
    cols: usize,
    class_count: usize,
) {
    loop {
        let request = match request_rx.recv_timeout(WORKER_POLL_INTERVAL) {
            Ok(request) => request,
            Err(RecvTimeoutError::Timeout) => {
                if stop_signal.load(Ordering::SeqCst) {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let generation = request.generation;
        let tensor = WindowTensor::from_snapshot(&request.snapshot, rows, cols);

        let result = classifier
            .classify(&tensor)
            .and_then(|probabilities| score(probabilities, class_count))
            .map(|(gesture_class, confidence, probabilities)| {
                let latency_ms = request.submitted_at.elapsed().as_millis() as u64;
                tracing::debug!(
                    "Classified generation {} as class {} (confidence {:.3}, {} ms)",
                    generation,
                    gesture_class,
                    confidence,
                    latency_ms
                );
                GestureResult {
                    gesture_class,
                    confidence,
                    probabilities,
                    latency_ms,
                    detected_at: Utc::now(),
                }
            });

        if let Err(ref e) = result {
            tracing::warn!("Inference failed (generation {}): {}", generation, e);
        }

        if outcome_tx
            .send(InferenceOutcome { generation, result })
            .is_err()
        {
            break;
        }
    }

    tracing::debug!("Inference worker exiting");
}

/// Validates the probability vector shape and picks the winning class
///
/// First index wins on ties.
fn score(
    probabilities: Vec<f32>,
    class_count: usize,
) -> Result<(usize, f32, Vec<f32>), InferenceError> {
    if probabilities.len() != class_count {
        return Err(InferenceError::OutputMismatch {
            expected: class_count,
            actual: probabilities.len(),
        });
    }

    let mut best_index = 0;
    let mut best_value = probabilities[0];
    for (i, &p) in probabilities.iter().enumerate().skip(1) {
        if p > best_value {
            best_index = i;
            best_value = p;
        }
    }

    Ok((best_index, best_value, probabilities))
}
