//! Per-frame hand-pose feature vectors
//!
//! A `FeatureVector` is the fixed-length numeric summary of one camera
//! frame's hand pose, produced by the external landmark detector. It is
//! immutable once constructed; the capture session validates its length
//! against the configured feature dimension before accepting it.

use serde::{Deserialize, Serialize};

/// Number of tracked hand landmarks (MediaPipe-style hand topology)
pub const LANDMARK_COUNT: usize = 21;

/// Coordinates per landmark (x, y, z)
pub const COORDS_PER_LANDMARK: usize = 3;

/// Default feature vector length: 21 landmarks × 3 coordinates
pub const DEFAULT_FEATURE_LEN: usize = LANDMARK_COUNT * COORDS_PER_LANDMARK;

/// Fixed-length numeric summary of one frame's hand pose
///
/// Immutable once produced. Length validation happens at the capture
/// session boundary, not here, so the detector adapter can construct
/// vectors without knowing the pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Creates a feature vector from raw detector output
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Creates a feature vector from landmark points (x, y, z triples)
    ///
    /// Flattens in landmark order, matching the layout the classifier
    /// was trained on.
    pub fn from_landmarks(points: &[[f32; COORDS_PER_LANDMARK]]) -> Self {
        let mut values = Vec::with_capacity(points.len() * COORDS_PER_LANDMARK);
        for point in points {
            values.extend_from_slice(point);
        }
        Self(values)
    }

    /// Creates an all-zero vector of the given length
    ///
    /// Used as the pad row when a partial window is normalised for
    /// inference and no real frame was ever collected.
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Number of values in the vector
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the vector holds no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying values in detector order
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_feature_len() {
        assert_eq!(DEFAULT_FEATURE_LEN, 63);
    }

    #[test]
    fn test_from_landmarks_flattens_in_order() {
        let points = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let v = FeatureVector::from_landmarks(&points);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_zeroed() {
        let v = FeatureVector::zeroed(63);
        assert_eq!(v.len(), 63);
        assert!(v.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_serialisation_roundtrip() {
        let v = FeatureVector::new(vec![0.5, -0.25, 1.0]);
        let json = serde_json::to_string(&v).unwrap();
        let back: FeatureVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
