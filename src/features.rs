//! Per-frame face metrics derived from landmarks.
//!
//! The extractor turns a validated [`LandmarkSet`] (and, when available, the
//! decomposed [`HeadPose`]) into [`FaceMetrics`]: size proxies for the scale
//! estimator, head angles for the compensation terms, and the two reference
//! points the compositor anchors to.

use crate::{
    constants::{landmark_index, EYE_LINE_DROP_FACTOR, INTEROCULAR_SENTINEL, MIN_NOSE_DEPTH},
    geometry::{distance_2d, lerp, line_angle, midpoint},
    landmarks::{Landmark, LandmarkSet},
    pose_estimation::HeadPose,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason a frame was not used for estimation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameRejection {
    /// The detector found no face in this frame
    #[error("no face detected")]
    NoFace,

    /// The detector returned a truncated mesh
    #[error("expected at least {expected} landmarks, got {actual}")]
    TooFewLandmarks {
        /// Minimum landmark count
        expected: usize,
        /// Reported landmark count
        actual: usize,
    },

    /// A landmark coordinate is NaN or infinite
    #[error("landmark {index} has non-finite coordinates")]
    NonFiniteLandmark {
        /// Offending landmark index
        index: usize,
    },

    /// The face is implausibly small or large
    #[error("interocular distance {distance:.4} outside [{min}, {max}]")]
    InterocularOutOfRange {
        /// Measured distance
        distance: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

/// Which landmark drives the centered placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorLandmark {
    /// Tip of the nose
    NoseTip,
    /// Nose bridge between the eyes, where a frame rests
    #[default]
    NoseBridge,
    /// Midpoint of the outer eye corners, nudged toward the bridge
    EyeLine,
}

/// Frame-scoped measurements of one face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMetrics {
    /// Distance between outer eye corners (normalized units)
    pub interocular: f64,
    /// Horizontal landmark span
    pub face_width: f64,
    /// Vertical landmark span
    pub face_height: f64,
    /// `max(face_width, face_height)`
    pub face_size: f64,
    /// Rotation about the vertical axis (radians)
    pub yaw: f64,
    /// Rotation about the lateral axis (radians)
    pub pitch: f64,
    /// Rotation about the forward axis (radians)
    pub roll: f64,
    /// Midpoint of the ear landmarks
    pub pivot: Landmark,
    /// Primary position target
    pub anchor: Landmark,
    /// Yaw and pitch came from the detector's transform
    pub from_transform: bool,
    /// Roll came from iris landmarks (otherwise it is zero)
    pub iris_available: bool,
}

impl FaceMetrics {
    /// Blend this frame's roll with the previous frame's
    #[must_use]
    pub fn with_roll_continuity(mut self, previous: Option<&Self>, alpha: f64) -> Self {
        if let Some(prev) = previous {
            self.roll = lerp(prev.roll, self.roll, alpha.clamp(0.0, 1.0));
        }
        self
    }

    /// Combined magnitude of the three head angles
    #[must_use]
    pub fn rotation_magnitude(&self) -> f64 {
        (self.yaw.powi(2) + self.pitch.powi(2) + self.roll.powi(2)).sqrt()
    }
}

/// Landmark feature extractor
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    min_interocular: f64,
    max_interocular: f64,
    anchor: AnchorLandmark,
}

impl FeatureExtractor {
    /// Create an extractor with the sane interocular band and anchor choice
    #[must_use]
    pub fn new(min_interocular: f64, max_interocular: f64, anchor: AnchorLandmark) -> Self {
        Self {
            min_interocular,
            max_interocular,
            anchor,
        }
    }

    /// Derive metrics for one frame
    ///
    /// # Errors
    ///
    /// Returns [`FrameRejection::InterocularOutOfRange`] when the eye corners
    /// are implausibly close or far apart (including the missing-landmark
    /// sentinel).
    pub fn extract(
        &self,
        landmarks: &LandmarkSet,
        head: Option<&HeadPose>,
    ) -> std::result::Result<FaceMetrics, FrameRejection> {
        let interocular = interocular_distance(landmarks.points());
        if !(self.min_interocular..=self.max_interocular).contains(&interocular) {
            return Err(FrameRejection::InterocularOutOfRange {
                distance: interocular,
                min: self.min_interocular,
                max: self.max_interocular,
            });
        }

        let (face_width, face_height) = bounding_box(landmarks.points());

        let (yaw, pitch) = match head {
            Some(pose) => {
                let (pitch, yaw, _) = pose.euler_angles();
                (yaw, pitch)
            }
            None => landmark_yaw_pitch(landmarks),
        };

        let (roll, iris_available) = match landmarks.iris_centers() {
            Some((first, second)) => (iris_roll(first, second), true),
            None => (0.0, false),
        };

        let pivot = match (
            landmarks.get(landmark_index::RIGHT_EAR),
            landmarks.get(landmark_index::LEFT_EAR),
        ) {
            (Some(right), Some(left)) => midpoint(right, left),
            _ => Landmark::new(0.5, 0.5, 0.0),
        };

        let anchor = self.anchor_point(landmarks, interocular);

        Ok(FaceMetrics {
            interocular,
            face_width,
            face_height,
            face_size: face_width.max(face_height),
            yaw,
            pitch,
            roll,
            pivot,
            anchor,
            from_transform: head.is_some(),
            iris_available,
        })
    }

    fn anchor_point(&self, landmarks: &LandmarkSet, interocular: f64) -> Landmark {
        let fallback = Landmark::new(0.5, 0.5, 0.0);
        match self.anchor {
            AnchorLandmark::NoseTip => landmarks.get(landmark_index::NOSE_TIP).copied().unwrap_or(fallback),
            AnchorLandmark::NoseBridge => landmarks.get(landmark_index::NOSE_BRIDGE).copied().unwrap_or(fallback),
            AnchorLandmark::EyeLine => match eye_center(landmarks) {
                Some(center) => Landmark::new(center.x, interocular.mul_add(EYE_LINE_DROP_FACTOR, center.y), center.z),
                None => fallback,
            },
        }
    }
}

/// Distance between the outer eye corners in normalized image space
///
/// Returns [`INTEROCULAR_SENTINEL`] when either corner is missing so callers
/// never divide by zero.
#[must_use]
pub fn interocular_distance(landmarks: &[Landmark]) -> f64 {
    match (
        landmarks.get(landmark_index::LEFT_EYE_OUTER),
        landmarks.get(landmark_index::RIGHT_EYE_OUTER),
    ) {
        (Some(left), Some(right)) => distance_2d(left, right),
        _ => INTEROCULAR_SENTINEL,
    }
}

/// Width and height of the landmark bounding box
#[must_use]
pub fn bounding_box(landmarks: &[Landmark]) -> (f64, f64) {
    if landmarks.is_empty() {
        return (0.0, 0.0);
    }

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in landmarks {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    (max_x - min_x, max_y - min_y)
}

/// Signed roll from the two iris centers
///
/// Measured along the iris line from its left end to its right end in the
/// image, so mirrored input yields the mirrored tilt rather than a half turn.
/// Positive when the right-hand iris sits lower in the image.
#[must_use]
pub fn iris_roll(first: &Landmark, second: &Landmark) -> f64 {
    let (left, right) = if first.x <= second.x {
        (first, second)
    } else {
        (second, first)
    };
    -line_angle(left, right)
}

fn eye_center(landmarks: &LandmarkSet) -> Option<Landmark> {
    let right = landmarks.get(landmark_index::RIGHT_EYE_OUTER)?;
    let left = landmarks.get(landmark_index::LEFT_EYE_OUTER)?;
    Some(midpoint(right, left))
}

/// Yaw and pitch from the nose bridge's offset in front of the eye line
fn landmark_yaw_pitch(landmarks: &LandmarkSet) -> (f64, f64) {
    let (Some(eye), Some(nose)) = (eye_center(landmarks), landmarks.get(landmark_index::NOSE_BRIDGE)) else {
        return (0.0, 0.0);
    };

    let depth = eye.z - nose.z;
    if depth <= MIN_NOSE_DEPTH {
        return (0.0, 0.0);
    }

    let yaw = (nose.x - eye.x).atan2(depth);
    let pitch = (nose.y - eye.y).atan2(depth);
    (yaw, pitch)
}
