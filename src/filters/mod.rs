//! Temporal smoothing of the anchor channels.
//!
//! Every channel is a first-order filter that owns its last value and moves
//! a fixed fraction `alpha` toward each new target. `alpha` in `(0, 1)`:
//! higher is more responsive, lower is smoother with more latency.

/// Exponential smoothing for scalars and vectors
pub mod exponential;

/// Spherical smoothing for orientations
pub mod slerp;

use exponential::ExponentialSmoother;
use nalgebra::{UnitQuaternion, Vector3};
use slerp::SlerpSmoother;

/// Trait for all channel smoothers
pub trait Smoother {
    /// Smoothed quantity
    type Value;

    /// Blend toward `target` and return the new value
    fn update(&mut self, target: &Self::Value, alpha: f64) -> Self::Value;

    /// Current value
    fn value(&self) -> Self::Value;

    /// Jump straight to `value`
    fn reset(&mut self, value: Self::Value);

    /// Get smoother name
    fn name(&self) -> &str;
}

/// Targets for one update of every channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTargets {
    /// World-space position target
    pub position: Vector3<f64>,
    /// Orientation target
    pub orientation: UnitQuaternion<f64>,
    /// Scale target
    pub scale: f64,
    /// Yaw compensation factor target
    pub compensation: f64,
    /// Vertical roll correction target
    pub roll_correction: f64,
}

/// Smoothing coefficients for one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelAlphas {
    /// Position coefficient
    pub position: f64,
    /// Orientation coefficient
    pub rotation: f64,
    /// Scale coefficient
    pub scale: f64,
    /// Compensation coefficient (yaw factor and roll correction)
    pub compensation: f64,
}

/// The per-session filter state
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFilters {
    /// Anchor position
    pub position: ExponentialSmoother<Vector3<f64>>,
    /// Anchor orientation
    pub orientation: SlerpSmoother,
    /// Anchor scale
    pub scale: ExponentialSmoother<f64>,
    /// Yaw compensation factor, neutral at 1.0
    pub compensation: ExponentialSmoother<f64>,
    /// Vertical roll correction, neutral at 0.0
    pub roll_correction: ExponentialSmoother<f64>,
}

impl Default for PoseFilters {
    fn default() -> Self {
        Self {
            position: ExponentialSmoother::new(Vector3::zeros()),
            orientation: SlerpSmoother::default(),
            scale: ExponentialSmoother::new(1.0),
            compensation: ExponentialSmoother::new(1.0),
            roll_correction: ExponentialSmoother::new(0.0),
        }
    }
}

impl PoseFilters {
    /// Jump every channel to its target
    pub fn seed(&mut self, targets: &ChannelTargets) {
        self.position.reset(targets.position);
        self.orientation.reset(targets.orientation);
        self.scale.reset(targets.scale);
        self.compensation.reset(targets.compensation);
        self.roll_correction.reset(targets.roll_correction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resting_state() {
        let filters = PoseFilters::default();
        assert_eq!(filters.position.value(), Vector3::zeros());
        assert_eq!(filters.orientation.value(), UnitQuaternion::identity());
        assert_eq!(filters.scale.value(), 1.0);
        assert_eq!(filters.compensation.value(), 1.0);
        assert_eq!(filters.roll_correction.value(), 0.0);
    }

    #[test]
    fn test_seed() {
        let mut filters = PoseFilters::default();
        let targets = ChannelTargets {
            position: Vector3::new(1.0, 2.0, 3.0),
            orientation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.4),
            scale: 1.7,
            compensation: 1.2,
            roll_correction: -3.0,
        };
        filters.seed(&targets);
        assert_eq!(filters.position.value(), targets.position);
        assert_eq!(filters.orientation.value(), targets.orientation);
        assert_eq!(filters.scale.value(), 1.7);
        assert_eq!(filters.compensation.value(), 1.2);
        assert_eq!(filters.roll_correction.value(), -3.0);
        assert_eq!(filters.scale.name(), "ExponentialSmoother");
    }
}
