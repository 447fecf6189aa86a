//! Geometry helpers shared by the estimation stages.
//!
//! Everything here is a pure function. Angles are radians, image-space points
//! are normalized `[0, 1]` landmarks, world space is the orthographic video
//! plane measured in pixels with +Y up and the origin at the frame center.

use crate::landmarks::Landmark;
use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Video frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl FrameSize {
    /// Create a frame size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width as a float
    #[must_use]
    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    /// Height as a float
    #[must_use]
    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }
}

/// Linear interpolation from `a` to `b`
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    t.mul_add(b - a, a)
}

/// Clamp that is defined for every input: NaN maps to `lo`.
///
/// `f64::clamp` propagates NaN, which would let a bad landmark frame leak an
/// unbounded scale into the filters.
#[must_use]
pub fn clamp_total(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Euclidean distance between two landmarks in the image plane
#[must_use]
pub fn distance_2d(a: &Landmark, b: &Landmark) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Midpoint of two landmarks (all three coordinates)
#[must_use]
pub fn midpoint(a: &Landmark, b: &Landmark) -> Landmark {
    Landmark::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
}

/// Angle of the line from `from` to `to`, measured in a Y-up frame
#[must_use]
pub fn line_angle(from: &Landmark, to: &Landmark) -> f64 {
    let dx = to.x - from.x;
    // image Y grows downward
    let dy = from.y - to.y;
    dy.atan2(dx)
}

/// Map a normalized landmark onto the orthographic video plane
#[must_use]
pub fn normalized_to_world(point: &Landmark, frame: FrameSize) -> Vector3<f64> {
    Vector3::new(
        (point.x - 0.5) * frame.width_f64(),
        (0.5 - point.y) * frame.height_f64(),
        0.0,
    )
}

/// Build an orientation from YXZ Euler angles (yaw about Y, then pitch about X, then roll about Z)
#[must_use]
pub fn quaternion_from_euler_yxz(pitch: f64, yaw: f64, roll: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch)
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), roll)
}

/// Extract YXZ Euler angles `(pitch, yaw, roll)` from a rotation matrix
#[must_use]
pub fn euler_yxz_from_rotation(m: &Matrix3<f64>) -> (f64, f64, f64) {
    let m23 = m[(1, 2)];
    let pitch = (-m23).clamp(-1.0, 1.0).asin();

    if m23.abs() < 0.999_999_9 {
        let yaw = m[(0, 2)].atan2(m[(2, 2)]);
        let roll = m[(1, 0)].atan2(m[(1, 1)]);
        (pitch, yaw, roll)
    } else {
        // gimbal lock: roll folds into yaw
        let yaw = (-m[(2, 0)]).atan2(m[(0, 0)]);
        (pitch, yaw, 0.0)
    }
}

/// Fixed correction from the detector's head frame to the scene: 180° about +Y
#[must_use]
pub fn yaw_flip() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::PI)
}
