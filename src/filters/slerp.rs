use super::Smoother;
use nalgebra::UnitQuaternion;

/// Spherical smoothing filter for orientations
///
/// Blends along the shortest arc and re-normalizes after every update so the
/// stored quaternion never drifts off the unit sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct SlerpSmoother {
    value: UnitQuaternion<f64>,
}

impl SlerpSmoother {
    /// Create a smoother resting at `initial`
    #[must_use]
    pub fn new(initial: UnitQuaternion<f64>) -> Self {
        Self { value: initial }
    }
}

impl Default for SlerpSmoother {
    fn default() -> Self {
        Self::new(UnitQuaternion::identity())
    }
}

impl Smoother for SlerpSmoother {
    type Value = UnitQuaternion<f64>;

    fn update(&mut self, target: &UnitQuaternion<f64>, alpha: f64) -> UnitQuaternion<f64> {
        let alpha = alpha.clamp(0.0, 1.0);
        // try_slerp only gives up when both ends are (numerically) the same rotation
        let blended = self.value.try_slerp(target, alpha, 1e-12).unwrap_or(*target);
        self.value = UnitQuaternion::new_normalize(blended.into_inner());
        self.value
    }

    fn value(&self) -> UnitQuaternion<f64> {
        self.value
    }

    fn reset(&mut self, value: UnitQuaternion<f64>) {
        self.value = value;
    }

    fn name(&self) -> &str {
        "SlerpSmoother"
    }
}
