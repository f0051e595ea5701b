//! Gesture-to-action mapping
//!
//! A stateless lookup from classifier output index to an abstract pointer
//! action. Idle and unknown classes map to nothing and never reach the
//! external input dispatcher. Each action carries the geometry the host's
//! input synthesiser needs to build a pointer path.

use serde::{Deserialize, Serialize};

/// Synthetic swipe path duration in milliseconds
const SWIPE_DURATION_MS: u64 = 300;

/// Synthetic tap press duration in milliseconds
const TAP_DURATION_MS: u64 = 120;

/// Closed enumeration of recognised gesture classes
///
/// Indices match the classifier's output head; anything outside the
/// trained range maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureClass {
    /// Class 0: hand swipes upward
    SwipeUp,
    /// Class 1: hand swipes downward
    SwipeDown,
    /// Class 2: confirm/tap gesture
    ConfirmTap,
    /// Class 3: no deliberate gesture
    Idle,
    /// Out-of-range class index
    Unknown,
}

impl GestureClass {
    /// Maps a classifier output index to a gesture class
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => GestureClass::SwipeUp,
            1 => GestureClass::SwipeDown,
            2 => GestureClass::ConfirmTap,
            3 => GestureClass::Idle,
            _ => GestureClass::Unknown,
        }
    }

    /// Returns whether this class produces an action
    pub fn is_actionable(&self) -> bool {
        !matches!(self, GestureClass::Idle | GestureClass::Unknown)
    }
}

/// Swipe direction for pointer-path synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Up,
    Down,
}

/// Abstract pointer action handed to the external input dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbstractAction {
    /// A directional swipe along the pointer path
    Swipe {
        direction: SwipeDirection,
        /// Duration of the synthesised path in milliseconds
        duration_ms: u64,
    },
    /// A tap at the current pointer position
    Tap {
        /// Press duration in milliseconds
        duration_ms: u64,
    },
}

/// Maps a gesture class to its action, if any
///
/// Pure function; `Idle` and `Unknown` return None.
pub fn action_for(class: GestureClass) -> Option<AbstractAction> {
    match class {
        GestureClass::SwipeUp => Some(AbstractAction::Swipe {
            direction: SwipeDirection::Up,
            duration_ms: SWIPE_DURATION_MS,
        }),
        GestureClass::SwipeDown => Some(AbstractAction::Swipe {
            direction: SwipeDirection::Down,
            duration_ms: SWIPE_DURATION_MS,
        }),
        GestureClass::ConfirmTap => Some(AbstractAction::Tap {
            duration_ms: TAP_DURATION_MS,
        }),
        GestureClass::Idle | GestureClass::Unknown => None,
    }
}

/// External input dispatcher seam
///
/// Fire-and-forget: the pipeline never retries a dispatch. Implementations
/// should log failures rather than propagate them.
pub trait ActionDispatcher: Send + Sync {
    /// Synthesises the OS-level input for one action
    fn dispatch(&self, action: AbstractAction);
}

/// Dispatcher that only logs, for hosts without input synthesis wired up
pub struct LoggingDispatcher;

impl ActionDispatcher for LoggingDispatcher {
    fn dispatch(&self, action: AbstractAction) {
        tracing::info!("Action dispatched: {:?}", action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_from_index() {
        assert_eq!(GestureClass::from_index(0), GestureClass::SwipeUp);
        assert_eq!(GestureClass::from_index(1), GestureClass::SwipeDown);
        assert_eq!(GestureClass::from_index(2), GestureClass::ConfirmTap);
        assert_eq!(GestureClass::from_index(3), GestureClass::Idle);
        assert_eq!(GestureClass::from_index(99), GestureClass::Unknown);
    }

    #[test]
    fn test_idle_and_unknown_are_not_actionable() {
        assert!(!GestureClass::Idle.is_actionable());
        assert!(!GestureClass::Unknown.is_actionable());
        assert!(GestureClass::SwipeUp.is_actionable());
        assert!(GestureClass::ConfirmTap.is_actionable());
    }

    #[test]
    fn test_idle_maps_to_no_action() {
        assert!(action_for(GestureClass::Idle).is_none());
        assert!(action_for(GestureClass::Unknown).is_none());
    }

    #[test]
    fn test_swipe_mapping_carries_geometry() {
        match action_for(GestureClass::SwipeUp) {
            Some(AbstractAction::Swipe {
                direction,
                duration_ms,
            }) => {
                assert_eq!(direction, SwipeDirection::Up);
                assert!(duration_ms > 0);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_action_serialisation() {
        let action = action_for(GestureClass::SwipeDown).unwrap();
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"type\":\"swipe\""));
        assert!(json.contains("\"direction\":\"down\""));
    }
}
