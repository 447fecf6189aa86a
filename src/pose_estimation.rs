//! Decomposition of the detector's 4×4 head transform.

use crate::{
    constants::MIN_AXIS_SCALE,
    geometry::{euler_yxz_from_rotation, yaw_flip},
};
use nalgebra::{Matrix3, Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Memory layout of the 16-element transform array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixLayout {
    /// Columns stored contiguously (translation in elements 12..15)
    #[default]
    ColumnMajor,
    /// Rows stored contiguously (translation in elements 3, 7, 11)
    RowMajor,
}

/// Head transform split into its rigid parts
#[derive(Debug, Clone, PartialEq)]
pub struct HeadPose {
    /// Translation reported by the detector
    pub position: Vector3<f64>,
    /// Rotation in the detector's head frame
    pub rotation: UnitQuaternion<f64>,
    /// Rotation aligned to the scene's forward axis
    pub orientation: UnitQuaternion<f64>,
    /// Per-axis scale
    pub scale: Vector3<f64>,
    /// Mean absolute axis scale
    pub reference_scale: f64,
}

impl HeadPose {
    /// Euler angles `(pitch, yaw, roll)` of the uncorrected head rotation
    #[must_use]
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        euler_yxz_from_rotation(self.rotation.to_rotation_matrix().matrix())
    }
}

/// Decompose a detector head transform
///
/// Returns `None` when the transform is unusable (non-finite entries or a
/// collapsed axis). The caller then falls back to landmark-only estimation,
/// exactly as if the detector had reported no transform.
#[must_use]
pub fn decompose_head_transform(data: &[f64; 16], layout: MatrixLayout) -> Option<HeadPose> {
    if data.iter().any(|v| !v.is_finite()) {
        log::debug!("Head transform has non-finite entries, ignoring it");
        return None;
    }

    let matrix = match layout {
        MatrixLayout::ColumnMajor => Matrix4::from_column_slice(data),
        MatrixLayout::RowMajor => Matrix4::from_row_slice(data),
    };

    let position = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
    let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();

    let mut scale = Vector3::new(
        linear.column(0).norm(),
        linear.column(1).norm(),
        linear.column(2).norm(),
    );
    if scale.iter().any(|s| *s < MIN_AXIS_SCALE) {
        log::debug!("Head transform has a collapsed axis (scale {scale:?}), ignoring it");
        return None;
    }
    if linear.determinant() < 0.0 {
        scale.x = -scale.x;
    }

    let mut rotation_matrix = linear;
    for (i, s) in scale.iter().enumerate() {
        rotation_matrix.column_mut(i).unscale_mut(*s);
    }

    let rotation = UnitQuaternion::from_matrix(&rotation_matrix);
    let orientation = rotation * yaw_flip();
    let reference_scale = scale.iter().map(|s| s.abs()).sum::<f64>() / 3.0;

    Some(HeadPose {
        position,
        rotation,
        orientation,
        scale,
        reference_scale,
    })
}

/// Compose a transform array from parts; the inverse of [`decompose_head_transform`]
/// without the correction. Used by recordings and tests to describe head motion.
#[must_use]
pub fn compose_head_transform(
    position: &Vector3<f64>,
    rotation: &UnitQuaternion<f64>,
    scale: f64,
    layout: MatrixLayout,
) -> [f64; 16] {
    let mut matrix = rotation.to_homogeneous();
    for c in 0..3 {
        for r in 0..3 {
            matrix[(r, c)] *= scale;
        }
    }
    matrix[(0, 3)] = position.x;
    matrix[(1, 3)] = position.y;
    matrix[(2, 3)] = position.z;

    let source = match layout {
        MatrixLayout::ColumnMajor => matrix,
        MatrixLayout::RowMajor => matrix.transpose(),
    };
    let mut out = [0.0; 16];
    out.copy_from_slice(source.as_slice());
    out
}

/// Reflect a transform across the vertical image axis
///
/// Conjugates by `diag(-1, 1, 1, 1)`: negates the X translation and flips
/// the sign of yaw and roll. Entries in exactly one of the first row or first
/// column change sign, which holds for either layout.
#[must_use]
pub fn mirror_head_transform(data: &[f64; 16]) -> [f64; 16] {
    let mut out = *data;
    for (i, value) in out.iter_mut().enumerate() {
        if (i / 4 == 0) != (i % 4 == 0) {
            *value = -*value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::quaternion_from_euler_yxz;

    #[test]
    fn test_identity_transform() {
        let identity: [f64; 16] = Matrix4::<f64>::identity().as_slice().try_into().unwrap();
        let pose = decompose_head_transform(&identity, MatrixLayout::ColumnMajor).unwrap();

        assert_eq!(pose.position, Vector3::zeros());
        assert!((pose.reference_scale - 1.0).abs() < 1e-12);
        assert!(pose.rotation.angle() < 1e-6);
        // the correction is a half turn about Y
        assert!((pose.orientation.angle() - std::f64::consts::PI).abs() < 1e-9);

        let (pitch, yaw, roll) = pose.euler_angles();
        assert!(pitch.abs() < 1e-12 && yaw.abs() < 1e-12 && roll.abs() < 1e-12);
    }

    #[test]
    fn test_recovers_parts() {
        let rotation = quaternion_from_euler_yxz(0.1, 0.6, -0.2);
        let position = Vector3::new(1.5, -2.0, -40.0);
        let data = compose_head_transform(&position, &rotation, 2.5, MatrixLayout::ColumnMajor);

        let pose = decompose_head_transform(&data, MatrixLayout::ColumnMajor).unwrap();
        assert!((pose.position - position).norm() < 1e-9);
        assert!((pose.reference_scale - 2.5).abs() < 1e-9);
        assert!(pose.rotation.angle_to(&rotation) < 1e-6);

        let (pitch, yaw, roll) = pose.euler_angles();
        assert!((pitch - 0.1).abs() < 1e-9);
        assert!((yaw - 0.6).abs() < 1e-9);
        assert!((roll + 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_row_major_layout() {
        let rotation = quaternion_from_euler_yxz(0.0, -0.4, 0.0);
        let position = Vector3::new(3.0, 4.0, 5.0);
        let data = compose_head_transform(&position, &rotation, 1.0, MatrixLayout::RowMajor);
        assert_eq!(data[3], 3.0);

        let pose = decompose_head_transform(&data, MatrixLayout::RowMajor).unwrap();
        assert!((pose.position - position).norm() < 1e-9);
        assert!((pose.euler_angles().1 + 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_mirror_flips_yaw_and_roll() {
        let rotation = quaternion_from_euler_yxz(0.15, 0.5, 0.2);
        let position = Vector3::new(4.0, 1.0, -30.0);

        for layout in [MatrixLayout::ColumnMajor, MatrixLayout::RowMajor] {
            let data = mirror_head_transform(&compose_head_transform(&position, &rotation, 1.0, layout));
            let pose = decompose_head_transform(&data, layout).unwrap();
            let (pitch, yaw, roll) = pose.euler_angles();
            assert!((pitch - 0.15).abs() < 1e-9);
            assert!((yaw + 0.5).abs() < 1e-9);
            assert!((roll + 0.2).abs() < 1e-9);
            assert!((pose.position.x + 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_degenerate_transforms() {
        let mut data = [0.0; 16];
        assert!(decompose_head_transform(&data, MatrixLayout::ColumnMajor).is_none());

        data = compose_head_transform(&Vector3::zeros(), &UnitQuaternion::identity(), 1.0, MatrixLayout::ColumnMajor);
        data[5] = f64::NAN;
        assert!(decompose_head_transform(&data, MatrixLayout::ColumnMajor).is_none());
    }

    #[test]
    fn test_mirrored_transform_keeps_positive_reference_scale() {
        let mut data = compose_head_transform(&Vector3::zeros(), &UnitQuaternion::identity(), 1.0, MatrixLayout::ColumnMajor);
        data[0] = -1.0;
        let pose = decompose_head_transform(&data, MatrixLayout::ColumnMajor).unwrap();
        assert!(pose.scale.x < 0.0);
        assert!((pose.reference_scale - 1.0).abs() < 1e-12);
    }
}
