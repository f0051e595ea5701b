//! Classifier contract
//!
//! The neural classifier is an external collaborator: a fixed-shape tensor
//! goes in, a probability vector comes out. This module defines the seam —
//! the `Classifier` trait plus the `WindowTensor` normalisation that turns
//! a (possibly partial) window snapshot into the exact N×L shape the model
//! expects.

use crate::capture::FeatureVector;

/// Errors raised by the classifier seam
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    /// The classifier backend is not initialised or its model is not
    /// loaded. The session is left as-is; the caller may retry via a
    /// manual trigger once the backend is ready.
    #[error("classifier is not ready")]
    NotReady,

    /// The classifier violated its output contract. Fatal for this
    /// request; the session is reset to avoid repeated failures on a
    /// corrupt window.
    #[error("classifier output mismatch: expected {expected} probabilities, got {actual}")]
    OutputMismatch { expected: usize, actual: usize },
}

/// Fixed-shape row-major tensor handed to the classifier
///
/// Always exactly `rows` × `cols`, regardless of how many frames the
/// originating snapshot held.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl WindowTensor {
    /// Normalises a window snapshot to exactly `rows` rows of `cols` values
    ///
    /// Snapshots shorter than `rows` (manual triggers on a partial window)
    /// are padded by repeating the last collected vector; an entirely empty
    /// snapshot pads with zero vectors. Longer snapshots are truncated.
    /// Rows with the wrong length are zero-filled past their end and
    /// truncated — that indicates a caller bug upstream, but the tensor
    /// shape contract holds regardless.
    pub fn from_snapshot(snapshot: &[FeatureVector], rows: usize, cols: usize) -> Self {
        let mut data = Vec::with_capacity(rows * cols);

        let pad_row = snapshot
            .last()
            .cloned()
            .unwrap_or_else(|| FeatureVector::zeroed(cols));

        for i in 0..rows {
            let row = snapshot.get(i).unwrap_or(&pad_row);
            let values = row.as_slice();
            for j in 0..cols {
                data.push(values.get(j).copied().unwrap_or(0.0));
            }
        }

        Self { rows, cols, data }
    }

    /// Number of rows (frames)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (features per frame)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// One row of the tensor
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// The full tensor in row-major order
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Opaque gesture classifier
///
/// Implementations wrap whatever model runtime the host uses. The pipeline
/// calls `classify` from its dispatcher thread, never from the frame
/// producer, so a slow model cannot block ingestion.
pub trait Classifier: Send + Sync {
    /// Classifies one normalised window tensor into class probabilities
    ///
    /// The returned vector must hold exactly K probabilities. Shape
    /// violations are caught by the dispatcher and surfaced as
    /// `InferenceError::OutputMismatch`.
    fn classify(&self, tensor: &WindowTensor) -> Result<Vec<f32>, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(v: f32) -> FeatureVector {
        FeatureVector::new(vec![v; 3])
    }

    #[test]
    fn test_full_snapshot_passes_through() {
        let snapshot: Vec<_> = (0..4).map(|i| frame(i as f32)).collect();
        let tensor = WindowTensor::from_snapshot(&snapshot, 4, 3);

        assert_eq!(tensor.rows(), 4);
        assert_eq!(tensor.cols(), 3);
        for i in 0..4 {
            assert_eq!(tensor.row(i), &[i as f32; 3]);
        }
    }

    #[test]
    fn test_partial_snapshot_pads_with_last_row() {
        let snapshot: Vec<_> = (0..5).map(|i| frame(i as f32)).collect();
        let tensor = WindowTensor::from_snapshot(&snapshot, 30, 3);

        assert_eq!(tensor.rows(), 30);
        // Rows 5..29 all repeat row 4
        for i in 5..30 {
            assert_eq!(tensor.row(i), tensor.row(4));
        }
        assert_eq!(tensor.row(4), &[4.0; 3]);
    }

    #[test]
    fn test_empty_snapshot_pads_with_zeros() {
        let tensor = WindowTensor::from_snapshot(&[], 30, 3);
        assert_eq!(tensor.rows(), 30);
        assert!(tensor.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_oversized_snapshot_is_truncated() {
        let snapshot: Vec<_> = (0..10).map(|i| frame(i as f32)).collect();
        let tensor = WindowTensor::from_snapshot(&snapshot, 4, 3);
        assert_eq!(tensor.rows(), 4);
        assert_eq!(tensor.row(3), &[3.0; 3]);
    }

    #[test]
    fn test_short_row_is_zero_filled() {
        let snapshot = vec![FeatureVector::new(vec![1.0])];
        let tensor = WindowTensor::from_snapshot(&snapshot, 2, 3);
        assert_eq!(tensor.row(0), &[1.0, 0.0, 0.0]);
    }
}
