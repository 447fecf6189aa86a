//! Target scale estimation.
//!
//! One estimator, one strategy switch. Each strategy is a product of clamped
//! terms:
//!
//! | strategy               | device | face (measure)     | rotation |
//! |------------------------|--------|--------------------|----------|
//! | `InterocularDistance`  |   -    | interocular        |    -     |
//! | `BoundingBox`          |   -    | bounding-box size  |    -     |
//! | `Combined`             |  yes   | bounding-box size  |   yes    |
//!
//! The rotation term is produced here as a *target*; the orchestrator smooths
//! it in its own filter channel and hands the smoothed factor back to
//! [`ScaleEstimator::estimate`].

use crate::{
    config::{RotationCompensationConfig, ScaleConfig},
    constants::{DEVICE_TERM_MAX, DEVICE_TERM_MIN, FACE_TERM_MAX, FACE_TERM_MIN, ROTATION_TERM_MAX, ROTATION_TERM_MIN},
    features::FaceMetrics,
    geometry::{clamp_total, FrameSize},
};
use serde::{Deserialize, Serialize};

/// Scale estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStrategy {
    /// Face term from the outer eye corner distance only
    InterocularDistance,
    /// Face term from the landmark bounding box only
    #[default]
    BoundingBox,
    /// Device term, bounding-box face term and yaw compensation
    Combined,
}

impl ScaleStrategy {
    /// Whether the device-adaptive term participates
    #[must_use]
    pub fn uses_device_term(self) -> bool {
        matches!(self, Self::Combined)
    }

    /// Whether yaw compensation participates
    #[must_use]
    pub fn uses_rotation_term(self) -> bool {
        matches!(self, Self::Combined)
    }
}

/// Breakdown of one estimate, kept for diagnostics and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTerms {
    /// Device-adaptive term (1.0 when inactive)
    pub device: f64,
    /// Face-proportional term
    pub face: f64,
    /// Applied rotation compensation (1.0 when inactive)
    pub rotation: f64,
    /// Clamped final scale
    pub scale: f64,
}

/// Scale estimator for a settings snapshot
#[derive(Debug, Clone)]
pub struct ScaleEstimator {
    scale: ScaleConfig,
    compensation: RotationCompensationConfig,
}

impl ScaleEstimator {
    /// Create an estimator
    #[must_use]
    pub fn new(scale: ScaleConfig, compensation: RotationCompensationConfig) -> Self {
        Self { scale, compensation }
    }

    /// Ratio of the frame resolution to the reference resolution
    #[must_use]
    pub fn device_term(&self, frame: FrameSize) -> f64 {
        let width_ratio = frame.width_f64() / self.scale.reference_width;
        let height_ratio = frame.height_f64() / self.scale.reference_height;
        clamp_total((width_ratio * height_ratio).sqrt(), DEVICE_TERM_MIN, DEVICE_TERM_MAX)
    }

    /// Ratio of the measured face size to the reference face size
    #[must_use]
    pub fn face_term(&self, metrics: &FaceMetrics) -> f64 {
        let ratio = match self.scale.strategy {
            ScaleStrategy::InterocularDistance => metrics.interocular / self.scale.reference_interocular,
            ScaleStrategy::BoundingBox | ScaleStrategy::Combined => {
                metrics.face_size / self.scale.reference_face_size
            }
        };
        clamp_total(ratio, FACE_TERM_MIN, FACE_TERM_MAX)
    }

    /// Unsmoothed yaw compensation factor for this frame
    ///
    /// Returns 1.0 (neutral) when compensation is disabled, the strategy does
    /// not use it, or `|yaw|` is within the threshold.
    #[must_use]
    pub fn compensation_target(&self, yaw: f64) -> f64 {
        if !self.compensation.enabled || !self.scale.strategy.uses_rotation_term() {
            return 1.0;
        }

        let magnitude = yaw.abs();
        if magnitude <= self.compensation.threshold {
            return 1.0;
        }

        let factor = magnitude.sin().mul_add(self.compensation.strength, 1.0);
        clamp_total(factor, ROTATION_TERM_MIN, ROTATION_TERM_MAX)
    }

    /// Combine the active terms into a clamped target scale
    ///
    /// `compensation` is the already-smoothed rotation factor; it is ignored
    /// by strategies without a rotation term.
    #[must_use]
    pub fn estimate(&self, metrics: &FaceMetrics, frame: FrameSize, compensation: f64) -> ScaleTerms {
        let strategy = self.scale.strategy;

        let device = if strategy.uses_device_term() {
            self.device_term(frame)
        } else {
            1.0
        };
        let face = self.face_term(metrics);
        let rotation = if strategy.uses_rotation_term() {
            clamp_total(compensation, ROTATION_TERM_MIN, ROTATION_TERM_MAX)
        } else {
            1.0
        };

        let raw = self.scale.base_multiplier * device * face * rotation * self.scale.user_base_scale;
        let scale = clamp_total(raw, self.scale.min_scale, self.scale.max_scale);

        ScaleTerms {
            device,
            face,
            rotation,
            scale,
        }
    }
}
