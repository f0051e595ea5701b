//! Capture window: the buffer forming one classification unit
//!
//! A `CaptureWindow` accumulates up to N feature vectors while a session is
//! collecting. It is owned exclusively by the capture state machine; the
//! only thing that ever leaves it is a snapshot taken by
//! `snapshot_and_clear`, which drains the buffer in a single operation so a
//! frame can never be appended to a window already handed off for inference.

use super::frame::FeatureVector;

/// Append-only buffer of feature vectors with a fixed capacity
#[derive(Debug)]
pub struct CaptureWindow {
    frames: Vec<FeatureVector>,
    capacity: usize,
}

impl CaptureWindow {
    /// Creates an empty window with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Window capacity (N)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of frames currently collected
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if no frames have been collected
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns true once the window holds exactly N frames
    pub fn is_ready(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    /// Appends a frame, returning the new length
    ///
    /// A full window rejects further frames; the state machine drains the
    /// window the moment it becomes ready, so this only triggers if a
    /// caller bypasses the session.
    pub fn push(&mut self, frame: FeatureVector) -> usize {
        if self.is_ready() {
            tracing::warn!("Capture window is full; dropping frame");
            return self.frames.len();
        }
        self.frames.push(frame);
        self.frames.len()
    }

    /// Drains the window, returning its contents as one atomic operation
    ///
    /// The window is empty afterwards and may immediately begin a new
    /// collection.
    pub fn snapshot_and_clear(&mut self) -> Vec<FeatureVector> {
        std::mem::take(&mut self.frames)
    }

    /// Discards all collected frames
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(v: f32) -> FeatureVector {
        FeatureVector::new(vec![v; 3])
    }

    #[test]
    fn test_new_window_is_empty() {
        let window = CaptureWindow::new(30);
        assert_eq!(window.capacity(), 30);
        assert_eq!(window.len(), 0);
        assert!(window.is_empty());
        assert!(!window.is_ready());
    }

    #[test]
    fn test_push_until_ready() {
        let mut window = CaptureWindow::new(3);
        assert_eq!(window.push(frame(1.0)), 1);
        assert_eq!(window.push(frame(2.0)), 2);
        assert!(!window.is_ready());
        assert_eq!(window.push(frame(3.0)), 3);
        assert!(window.is_ready());
    }

    #[test]
    fn test_push_beyond_capacity_is_dropped() {
        let mut window = CaptureWindow::new(2);
        window.push(frame(1.0));
        window.push(frame(2.0));
        assert_eq!(window.push(frame(3.0)), 2);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_snapshot_and_clear_drains() {
        let mut window = CaptureWindow::new(3);
        window.push(frame(1.0));
        window.push(frame(2.0));

        let snapshot = window.snapshot_and_clear();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0], frame(1.0));
        assert!(window.is_empty());

        // The window accepts new frames immediately after draining
        assert_eq!(window.push(frame(4.0)), 1);
    }

    #[test]
    fn test_clear() {
        let mut window = CaptureWindow::new(3);
        window.push(frame(1.0));
        window.clear();
        assert!(window.is_empty());
    }
}
