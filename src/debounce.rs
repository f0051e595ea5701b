//! Debounce / cooldown controller
//!
//! Enforces minimum spacing between two dispatched actions. A result
//! arriving within the suppression window of the previous dispatch is
//! suppressed — no action, no state change, regardless of confidence. The
//! last-action timestamp only ever advances, and only on a confirmed
//! dispatch.
//!
//! The longer post-detection pause (capture suspended for the full
//! cooldown after an action fires) is handled by the pipeline with a
//! deferred resume task; this gate is just the timestamp check.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Decision for one classified gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Dispatch the action; the suppression window restarts now
    Dispatch,
    /// Too soon after the previous action; drop without side effects
    Suppressed,
}

/// Suppression-window gate in front of the action mapper
pub struct CooldownGate {
    suppression_window: Duration,
    last_action_at: Option<Instant>,
}

impl CooldownGate {
    /// Creates a gate with the given suppression window
    pub fn new(suppression_window_ms: u64) -> Self {
        Self {
            suppression_window: Duration::from_millis(suppression_window_ms),
            last_action_at: None,
        }
    }

    /// Decides whether a confirmed gesture may dispatch an action
    ///
    /// Advances the last-action timestamp only on `Dispatch`. Callers must
    /// filter out idle/unknown classes before consulting the gate so that
    /// non-actionable gestures never consume the window.
    pub fn consider(&mut self) -> Decision {
        let now = Instant::now();

        if let Some(last) = self.last_action_at {
            let since = now.duration_since(last);
            if since < self.suppression_window {
                tracing::debug!(
                    "Gesture suppressed: {} ms since last action (window {} ms)",
                    since.as_millis(),
                    self.suppression_window.as_millis()
                );
                return Decision::Suppressed;
            }
        }

        self.last_action_at = Some(now);
        Decision::Dispatch
    }

    /// When the last action was dispatched, if any
    pub fn last_action_at(&self) -> Option<Instant> {
        self.last_action_at
    }

    /// Time left in the suppression window, zero when clear
    pub fn suppression_remaining(&self) -> Duration {
        match self.last_action_at {
            Some(last) => self.suppression_window.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }
}
