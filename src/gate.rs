//! Result gate: staleness-safe application of classifier outcomes
//!
//! An inference outcome is only valid while the session that produced its
//! window is still the current one. Every reset, stop, or restart bumps the
//! generation counter, so a slow classification from a superseded session
//! arrives carrying an old generation and is dropped here — silently, since
//! stale results are routine control flow, not errors. This is the only
//! cancellation mechanism: in-flight classifier calls run to completion and
//! their results are discarded at this gate.

use crate::inference::InferenceOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation check in front of the debounce controller
pub struct ResultGate {
    current_generation: Arc<AtomicU64>,
}

impl ResultGate {
    /// Creates a gate reading from the session's generation counter
    pub fn new(current_generation: Arc<AtomicU64>) -> Self {
        Self { current_generation }
    }

    /// Passes the outcome through if its generation is current
    ///
    /// Stale outcomes are logged at debug level and dropped.
    pub fn check(&self, outcome: InferenceOutcome) -> Option<InferenceOutcome> {
        let current = self.current_generation.load(Ordering::SeqCst);
        if outcome.generation != current {
            tracing::debug!(
                "Dropping stale inference outcome (generation {} != current {})",
                outcome.generation,
                current
            );
            return None;
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{GestureResult, InferenceError};
    use chrono::Utc;

    fn outcome(generation: u64) -> InferenceOutcome {
        InferenceOutcome {
            generation,
            result: Ok(GestureResult {
                gesture_class: 0,
                confidence: 0.9,
                probabilities: vec![0.9, 0.05, 0.03, 0.02],
                latency_ms: 10,
                detected_at: Utc::now(),
            }),
        }
    }

    #[test]
    fn test_current_generation_passes() {
        let generation = Arc::new(AtomicU64::new(7));
        let gate = ResultGate::new(generation);
        assert!(gate.check(outcome(7)).is_some());
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let generation = Arc::new(AtomicU64::new(8));
        let gate = ResultGate::new(generation);
        assert!(gate.check(outcome(7)).is_none());
    }

    #[test]
    fn test_generation_bump_invalidates_in_flight() {
        let generation = Arc::new(AtomicU64::new(3));
        let gate = ResultGate::new(generation.clone());

        // Outcome dispatched at generation 3, session stopped before delivery
        let pending = outcome(3);
        generation.fetch_add(1, Ordering::SeqCst);
        assert!(gate.check(pending).is_none());
    }

    #[test]
    fn test_errors_are_gated_too() {
        let generation = Arc::new(AtomicU64::new(2));
        let gate = ResultGate::new(generation);

        let stale_error = InferenceOutcome {
            generation: 1,
            result: Err(InferenceError::NotReady),
        };
        assert!(gate.check(stale_error).is_none());
    }
}
