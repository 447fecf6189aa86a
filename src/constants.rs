//! Constants used throughout the library

/// Minimum number of landmarks in a face mesh result
pub const NUM_FACE_LANDMARKS: usize = 468;

/// Number of landmarks when the detector also reports iris points
pub const NUM_LANDMARKS_WITH_IRIS: usize = 478;

/// Face mesh landmark indices (canonical topology)
pub mod landmark_index {
    /// Outer corner of the subject's right eye
    pub const RIGHT_EYE_OUTER: usize = 33;
    /// Outer corner of the subject's left eye
    pub const LEFT_EYE_OUTER: usize = 263;
    /// Tip of the nose
    pub const NOSE_TIP: usize = 4;
    /// Nose bridge, between the eyes
    pub const NOSE_BRIDGE: usize = 6;
    /// Right tragion (ear) approximation
    pub const RIGHT_EAR: usize = 234;
    /// Left tragion (ear) approximation
    pub const LEFT_EAR: usize = 454;
    /// Center of the first iris ring
    pub const RIGHT_IRIS_CENTER: usize = 468;
    /// Center of the second iris ring
    pub const LEFT_IRIS_CENTER: usize = 473;
}

/// Interocular distance reported when an eye corner is missing
pub const INTEROCULAR_SENTINEL: f64 = 1.0;

/// Default sane band for the interocular distance (normalized units)
pub const DEFAULT_MIN_INTEROCULAR: f64 = 0.1;
pub const DEFAULT_MAX_INTEROCULAR: f64 = 0.5;

/// Clamp band of the device-adaptive scale term
pub const DEVICE_TERM_MIN: f64 = 0.3;
pub const DEVICE_TERM_MAX: f64 = 2.5;

/// Clamp band of the face-proportional scale term
pub const FACE_TERM_MIN: f64 = 0.6;
pub const FACE_TERM_MAX: f64 = 1.8;

/// Clamp band of the rotation compensation factor
pub const ROTATION_TERM_MIN: f64 = 1.0;
pub const ROTATION_TERM_MAX: f64 = 2.0;

/// Roll below this magnitude (radians) gets no vertical correction
pub const ROLL_EPSILON: f64 = 0.01;

/// Eye-line anchor sits this fraction of the interocular distance below the eyes
pub const EYE_LINE_DROP_FACTOR: f64 = 0.14;

/// Nose depth (normalized z) below which landmark-only yaw/pitch are zeroed
pub const MIN_NOSE_DEPTH: f64 = 1e-4;

/// Axis scale below which a head transform is treated as degenerate
pub const MIN_AXIS_SCALE: f64 = 1e-9;

/// Rotation magnitude at which dynamic depth reaches its full falloff
pub const DYNAMIC_DEPTH_FULL_ROTATION: f64 = std::f64::consts::FRAC_PI_2;
