//! Facial landmark containers.
//!
//! A [`LandmarkSet`] only exists for a frame whose landmarks are all present
//! and finite; anything else is rejected as a whole.

use crate::{
    constants::{landmark_index, NUM_FACE_LANDMARKS, NUM_LANDMARKS_WITH_IRIS},
    features::FrameRejection,
};
use serde::{Deserialize, Serialize};

/// A single normalized facial point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0 = left edge of the image
    pub x: f64,
    /// Vertical position, 0 = top edge of the image
    pub y: f64,
    /// Relative depth, same scale as `x`, smaller is closer to the camera
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    /// Create a landmark
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether every coordinate is a finite number
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Mirror horizontally within the normalized image
    #[must_use]
    pub fn mirrored(self) -> Self {
        Self::new(1.0 - self.x, self.y, self.z)
    }
}

/// One detected face: an ordered, validated landmark sequence
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// Validate raw detector landmarks
    ///
    /// # Errors
    ///
    /// Returns a [`FrameRejection`] if:
    /// - fewer than 468 landmarks were reported
    /// - any coordinate is NaN or infinite
    pub fn new(points: Vec<Landmark>) -> std::result::Result<Self, FrameRejection> {
        if points.len() < NUM_FACE_LANDMARKS {
            return Err(FrameRejection::TooFewLandmarks {
                expected: NUM_FACE_LANDMARKS,
                actual: points.len(),
            });
        }

        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(FrameRejection::NonFiniteLandmark { index });
        }

        Ok(Self { points })
    }

    /// Validate raw landmarks, optionally mirroring them horizontally first
    ///
    /// # Errors
    ///
    /// Same as [`LandmarkSet::new`].
    pub fn from_observation(points: &[Landmark], mirror: bool) -> std::result::Result<Self, FrameRejection> {
        let points = if mirror {
            points.iter().map(|p| p.mirrored()).collect()
        } else {
            points.to_vec()
        };
        Self::new(points)
    }

    /// Landmark at `index`, if the detector reported it
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    /// All landmarks in detector order
    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Number of landmarks
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a validated set; provided for API completeness
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether iris center landmarks are part of this set
    #[must_use]
    pub fn has_iris(&self) -> bool {
        self.points.len() >= NUM_LANDMARKS_WITH_IRIS
    }

    /// Both iris centers, in `(first, second)` order
    #[must_use]
    pub fn iris_centers(&self) -> Option<(&Landmark, &Landmark)> {
        if !self.has_iris() {
            return None;
        }
        Some((
            self.get(landmark_index::RIGHT_IRIS_CENTER)?,
            self.get(landmark_index::LEFT_IRIS_CENTER)?,
        ))
    }
}
