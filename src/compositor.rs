//! Anchor composition.
//!
//! Turns the filtered channel state into the pose handed to the renderer:
//! placement (centered or pivot-based), roll correction, depth offset and
//! the manual child rotation. Also produces the per-frame position,
//! orientation and roll-correction targets the filters chase.

use crate::{
    config::{Config, ManualOverrideConfig, PlacementConfig, PlacementMode, RollCompensationConfig},
    constants::{DYNAMIC_DEPTH_FULL_ROTATION, ROLL_EPSILON},
    features::FaceMetrics,
    filters::{PoseFilters, Smoother},
    geometry::{normalized_to_world, quaternion_from_euler_yxz, yaw_flip, FrameSize},
    pose_estimation::HeadPose,
};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Transform of the attached object relative to the anchor node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildTransform {
    /// Local offset (world units)
    pub offset: Vector3<f64>,
    /// Manual rotation override
    pub rotation: UnitQuaternion<f64>,
}

impl Default for ChildTransform {
    fn default() -> Self {
        Self {
            offset: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

/// Output of one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorPose {
    /// Anchor node position on the video plane
    pub position: Vector3<f64>,
    /// Anchor node orientation
    pub orientation: UnitQuaternion<f64>,
    /// Uniform scale
    pub scale: f64,
    /// Child node transform
    pub child: ChildTransform,
    /// Whether the object should be drawn
    pub visible: bool,
}

impl Default for AnchorPose {
    /// The resting pose: origin, identity, unit scale, hidden
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            scale: 1.0,
            child: ChildTransform::default(),
            visible: false,
        }
    }
}

/// Anchor compositor for a settings snapshot
#[derive(Debug, Clone)]
pub struct Compositor {
    placement: PlacementConfig,
    roll: RollCompensationConfig,
    manual: ManualOverrideConfig,
}

impl Compositor {
    /// Create a compositor
    #[must_use]
    pub fn new(placement: PlacementConfig, roll: RollCompensationConfig, manual: ManualOverrideConfig) -> Self {
        Self { placement, roll, manual }
    }

    /// Create a compositor from a full configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.placement.clone(),
            config.roll_compensation.clone(),
            config.manual.clone(),
        )
    }

    /// Point the position channel tracks
    ///
    /// Centered placement follows the anchor landmark, pivot placement the
    /// ear midpoint.
    #[must_use]
    pub fn position_target(&self, metrics: &FaceMetrics, frame: FrameSize) -> Vector3<f64> {
        match self.placement.mode {
            PlacementMode::Centered => normalized_to_world(&metrics.anchor, frame),
            PlacementMode::Pivot => normalized_to_world(&metrics.pivot, frame),
        }
    }

    /// Orientation the orientation channel tracks
    ///
    /// Uses the detector transform when there is one, otherwise rebuilds a
    /// rotation from the landmark angles with the same basis correction.
    /// Image roll is clockwise-positive, the opposite of a +Z rotation in the
    /// Y-up world.
    #[must_use]
    pub fn orientation_target(&self, metrics: &FaceMetrics, head: Option<&HeadPose>) -> UnitQuaternion<f64> {
        match head {
            Some(pose) => pose.orientation,
            None => quaternion_from_euler_yxz(metrics.pitch, metrics.yaw, -metrics.roll) * yaw_flip(),
        }
    }

    /// Unsmoothed vertical roll correction for this frame
    #[must_use]
    pub fn roll_correction_target(&self, roll: f64) -> f64 {
        if !self.roll.enabled || roll.abs() <= ROLL_EPSILON {
            return 0.0;
        }
        roll.sin() * self.roll.object_half_height * self.roll.strength
    }

    /// Forward depth offset after dynamic falloff
    #[must_use]
    pub fn depth_offset(&self, metrics: &FaceMetrics) -> f64 {
        if !self.placement.dynamic_depth {
            return self.placement.depth_offset;
        }
        let turned = (metrics.rotation_magnitude() / DYNAMIC_DEPTH_FULL_ROTATION).min(1.0);
        self.placement.depth_offset * turned.mul_add(-self.placement.depth_falloff, 1.0)
    }

    /// Child offset and manual rotation; never smoothed
    #[must_use]
    pub fn child_transform(&self, metrics: &FaceMetrics) -> ChildTransform {
        ChildTransform {
            offset: Vector3::new(
                self.placement.offset_x,
                self.placement.offset_y,
                self.placement.offset_z + self.depth_offset(metrics),
            ),
            rotation: quaternion_from_euler_yxz(
                self.manual.rotation_x,
                self.manual.rotation_y,
                self.manual.rotation_z,
            ),
        }
    }

    /// Build the visible pose from the current filter state
    #[must_use]
    pub fn compose(&self, filters: &PoseFilters, metrics: &FaceMetrics) -> AnchorPose {
        let orientation = filters.orientation.value();
        let scale = filters.scale.value();

        let mut position = filters.position.value();
        if self.placement.mode == PlacementMode::Pivot {
            let attachment = Vector3::new(0.0, 0.0, -self.placement.attachment_distance);
            position -= orientation * (attachment * scale);
        }
        position.y -= filters.roll_correction.value();

        AnchorPose {
            position,
            orientation,
            scale,
            child: self.child_transform(metrics),
            visible: true,
        }
    }
}
