//! Synthetic face meshes with known geometry.
//!
//! Generates full 478-point landmark sets whose interocular distance,
//! bounding box, head angles and iris line are known exactly. Drives the
//! binary's demo mode, the tests and the benches.

use crate::{
    constants::{landmark_index, NUM_LANDMARKS_WITH_IRIS},
    geometry::quaternion_from_euler_yxz,
    landmarks::Landmark,
    pose_estimation::{compose_head_transform, MatrixLayout},
};
use nalgebra::Vector3;
use std::f64::consts::TAU;

/// Face width relative to the interocular distance
const WIDTH_RATIO: f64 = 2.2;

/// Face height relative to the interocular distance
const HEIGHT_RATIO: f64 = 3.0;

/// Depth of the nose bridge in front of the eye line
const NOSE_DEPTH: f64 = 0.04;

/// Number of distinct positions on the face outline
const OUTLINE_POINTS: usize = 64;

/// Parameters of one synthetic face
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticFace {
    /// Horizontal center (normalized)
    pub center_x: f64,
    /// Vertical center (normalized), also the eye line
    pub center_y: f64,
    /// Outer eye corner distance
    pub interocular: f64,
    /// Rotation about the vertical axis (radians)
    pub yaw: f64,
    /// Rotation about the lateral axis (radians)
    pub pitch: f64,
    /// Rotation about the forward axis (radians)
    pub roll: f64,
    /// Include the ten iris landmarks
    pub with_iris: bool,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.5,
            interocular: 0.2,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            with_iris: true,
        }
    }
}

impl SyntheticFace {
    /// Width of the landmark bounding box
    #[must_use]
    pub fn face_width(&self) -> f64 {
        self.interocular * WIDTH_RATIO
    }

    /// Height of the landmark bounding box
    #[must_use]
    pub fn face_height(&self) -> f64 {
        self.interocular * HEIGHT_RATIO
    }

    /// Landmarks in detector order
    ///
    /// Eye corners and iris centers are rotated by `roll` about the face
    /// center. The nose is pushed sideways by `tan(yaw)` and vertically by
    /// `tan(pitch)` so the depth-based angle estimate recovers both exactly.
    #[must_use]
    pub fn landmarks(&self) -> Vec<Landmark> {
        let count = if self.with_iris {
            NUM_LANDMARKS_WITH_IRIS
        } else {
            crate::constants::NUM_FACE_LANDMARKS
        };
        let (half_w, half_h) = (self.face_width() / 2.0, self.face_height() / 2.0);

        // outline ellipse; every mesh point starts on it
        let mut points: Vec<Landmark> = (0..count)
            .map(|i| {
                let angle = TAU * (i % OUTLINE_POINTS) as f64 / OUTLINE_POINTS as f64;
                Landmark::new(
                    half_w.mul_add(angle.cos(), self.center_x),
                    half_h.mul_add(angle.sin(), self.center_y),
                    0.0,
                )
            })
            .collect();

        let half_ipd = self.interocular / 2.0;
        points[landmark_index::RIGHT_EYE_OUTER] = self.rolled(-half_ipd);
        points[landmark_index::LEFT_EYE_OUTER] = self.rolled(half_ipd);

        points[landmark_index::RIGHT_EAR] = Landmark::new(self.center_x - half_w, self.center_y, 0.0);
        points[landmark_index::LEFT_EAR] = Landmark::new(self.center_x + half_w, self.center_y, 0.0);

        points[landmark_index::NOSE_BRIDGE] = Landmark::new(
            NOSE_DEPTH.mul_add(self.yaw.tan(), self.center_x),
            NOSE_DEPTH.mul_add(self.pitch.tan(), self.center_y),
            -NOSE_DEPTH,
        );
        points[landmark_index::NOSE_TIP] = Landmark::new(
            (1.5 * NOSE_DEPTH).mul_add(self.yaw.tan(), self.center_x),
            self.interocular.mul_add(0.35, self.center_y),
            -1.5 * NOSE_DEPTH,
        );

        if self.with_iris {
            let iris_offset = self.interocular * 0.35;
            points[landmark_index::RIGHT_IRIS_CENTER] = self.rolled(-iris_offset);
            points[landmark_index::LEFT_IRIS_CENTER] = self.rolled(iris_offset);
        }

        points
    }

    /// Column-major detector transform matching this face's angles
    ///
    /// A positive `roll` lowers the right-hand eye in the image, which is a
    /// clockwise tilt and therefore a negative rotation about +Z.
    #[must_use]
    pub fn head_transform(&self) -> [f64; 16] {
        compose_head_transform(
            &Vector3::new(0.0, 0.0, -50.0),
            &quaternion_from_euler_yxz(self.pitch, self.yaw, -self.roll),
            1.0,
            MatrixLayout::ColumnMajor,
        )
    }

    /// Point on the eye line at horizontal offset `offset`, rotated by roll
    fn rolled(&self, offset: f64) -> Landmark {
        let (sin, cos) = self.roll.sin_cos();
        Landmark::new(
            offset.mul_add(cos, self.center_x),
            offset.mul_add(sin, self.center_y),
            0.0,
        )
    }
}

/// A head sweeping left and right with a slow nod and tilt
///
/// Returns `frames` faces; yaw follows one full sine period reaching
/// `max_yaw`.
#[must_use]
pub fn yaw_sweep(frames: usize, max_yaw: f64) -> Vec<SyntheticFace> {
    (0..frames)
        .map(|i| {
            let phase = TAU * i as f64 / frames.max(1) as f64;
            SyntheticFace {
                center_x: 0.03f64.mul_add(phase.sin(), 0.5),
                yaw: max_yaw * phase.sin(),
                pitch: 0.1 * (phase * 0.5).sin(),
                roll: 0.15 * (phase * 2.0).sin(),
                ..SyntheticFace::default()
            }
        })
        .collect()
}
