//! Configuration management for the anchoring engine
//!
//! One fully-populated [`Config`] value drives a session. Every field has a
//! default, so a YAML file only needs to name what it overrides. The
//! engine never mutates its configuration; a new snapshot replaces the old
//! one between frames.

use crate::{
    features::{AnchorLandmark, FeatureExtractor},
    filters::ChannelAlphas,
    pose_estimation::MatrixLayout,
    scale::{ScaleEstimator, ScaleStrategy},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter coefficients
    pub smoothing: SmoothingConfig,

    /// Scale estimation
    pub scale: ScaleConfig,

    /// Perspective scale growth under yaw
    pub rotation_compensation: RotationCompensationConfig,

    /// Vertical drift correction under roll
    pub roll_compensation: RollCompensationConfig,

    /// Anchor placement and child offsets
    pub placement: PlacementConfig,

    /// Manual rotation override of the attached object
    pub manual: ManualOverrideConfig,

    /// Frame validation and tracking policy
    pub tracking: TrackingConfig,
}

/// Settings consumed by the orchestrator; the name used throughout the API
pub type Settings = Config;

/// Smoothing coefficients, each in (0, 1); higher is snappier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Position channel
    pub position: f64,

    /// Orientation channel
    pub rotation: f64,

    /// Scale channel
    pub scale: f64,

    /// Yaw compensation factor and roll correction channels
    pub compensation: f64,

    /// Frame-to-frame roll continuity
    pub roll: f64,
}

/// Scale estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Which terms participate
    pub strategy: ScaleStrategy,

    /// Fixed multiplier tuned to the object model
    pub base_multiplier: f64,

    /// User-facing size adjustment
    pub user_base_scale: f64,

    /// Reference frame width for the device term
    pub reference_width: f64,

    /// Reference frame height for the device term
    pub reference_height: f64,

    /// Interocular distance that maps to a face term of 1.0
    pub reference_interocular: f64,

    /// Bounding-box face size that maps to a face term of 1.0
    pub reference_face_size: f64,

    /// Lower bound of the final scale
    pub min_scale: f64,

    /// Upper bound of the final scale
    pub max_scale: f64,
}

/// Yaw compensation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationCompensationConfig {
    /// Enable compensation (smoothly returns to neutral when disabled)
    pub enabled: bool,

    /// |yaw| (radians) below which no compensation applies
    pub threshold: f64,

    /// Gain applied to sin(|yaw|)
    pub strength: f64,
}

/// Roll correction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollCompensationConfig {
    /// Enable correction (smoothly returns to neutral when disabled)
    pub enabled: bool,

    /// Gain applied to the vertical correction
    pub strength: f64,

    /// Half the object's height in world units
    pub object_half_height: f64,
}

/// Placement policy for the anchor node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Anchor sits on the projected anchor landmark
    #[default]
    Centered,
    /// Object rotates about the ear pivot, attachment point pinned to it
    Pivot,
}

/// Anchor placement and child offset parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Centered or pivot-based placement
    pub mode: PlacementMode,

    /// Landmark used for centered placement
    pub anchor: AnchorLandmark,

    /// Distance from object origin back to its attachment point (world units)
    pub attachment_distance: f64,

    /// Child offset along X (world units)
    pub offset_x: f64,

    /// Child offset along Y (world units)
    pub offset_y: f64,

    /// Child offset along Z (world units)
    pub offset_z: f64,

    /// Forward depth offset added to `offset_z`
    pub depth_offset: f64,

    /// Shorten the depth offset as the head rotates
    pub dynamic_depth: bool,

    /// Fraction of the depth offset removed at full rotation
    pub depth_falloff: f64,

    /// Input frames are horizontally mirrored (selfie view)
    pub mirror_input: bool,
}

/// Manual rotation override in radians, never smoothed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualOverrideConfig {
    /// Rotation about X
    pub rotation_x: f64,

    /// Rotation about Y
    pub rotation_y: f64,

    /// Rotation about Z
    pub rotation_z: f64,
}

/// Frame validation and tracking policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Smallest plausible interocular distance
    pub min_interocular: f64,

    /// Largest plausible interocular distance
    pub max_interocular: f64,

    /// Consecutive held frames after which the filters are re-seeded (0 = never)
    pub reseed_after_held_frames: u32,

    /// Layout of the detector's transform array
    pub matrix_layout: MatrixLayout,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            position: 0.35,
            rotation: 0.35,
            scale: 0.35,
            compensation: 0.2,
            roll: 0.5,
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            strategy: ScaleStrategy::BoundingBox,
            base_multiplier: 1.3,
            user_base_scale: 1.0,
            reference_width: 1280.0,
            reference_height: 720.0,
            reference_interocular: 0.13,
            reference_face_size: 0.55,
            min_scale: 0.25,
            max_scale: 4.0,
        }
    }
}

impl Default for RotationCompensationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.1,
            strength: 0.5,
        }
    }
}

impl Default for RollCompensationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 1.0,
            object_half_height: 30.0,
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            mode: PlacementMode::Centered,
            anchor: AnchorLandmark::NoseBridge,
            attachment_distance: 60.0,
            offset_x: 0.0,
            offset_y: 0.0,
            offset_z: -68.0,
            depth_offset: 100.0,
            dynamic_depth: false,
            depth_falloff: 0.5,
            mirror_input: false,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            min_interocular: crate::constants::DEFAULT_MIN_INTEROCULAR,
            max_interocular: crate::constants::DEFAULT_MAX_INTEROCULAR,
            reseed_after_held_frames: 30,
            matrix_layout: MatrixLayout::ColumnMajor,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// [`Config::validate`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or fails validation.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        // Validate smoothing coefficients
        let alphas = [
            ("smoothing.position", self.smoothing.position),
            ("smoothing.rotation", self.smoothing.rotation),
            ("smoothing.scale", self.smoothing.scale),
            ("smoothing.compensation", self.smoothing.compensation),
            ("smoothing.roll", self.smoothing.roll),
        ];
        for (name, alpha) in alphas {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(Error::ConfigError(format!(
                    "{name} must be between 0.0 and 1.0 (exclusive), got {alpha}"
                )));
            }
        }

        // Validate scale parameters
        let positive = [
            ("scale.base_multiplier", self.scale.base_multiplier),
            ("scale.user_base_scale", self.scale.user_base_scale),
            ("scale.reference_width", self.scale.reference_width),
            ("scale.reference_height", self.scale.reference_height),
            ("scale.reference_interocular", self.scale.reference_interocular),
            ("scale.reference_face_size", self.scale.reference_face_size),
            ("scale.min_scale", self.scale.min_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::ConfigError(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.scale.max_scale.is_finite() && self.scale.max_scale >= self.scale.min_scale) {
            return Err(Error::ConfigError(format!(
                "scale.max_scale ({}) must not be below scale.min_scale ({})",
                self.scale.max_scale, self.scale.min_scale
            )));
        }

        // Validate compensation parameters
        if !(self.rotation_compensation.threshold >= 0.0) {
            return Err(Error::ConfigError(
                "rotation_compensation.threshold must be non-negative".to_string(),
            ));
        }
        if !(self.rotation_compensation.strength >= 0.0) {
            return Err(Error::ConfigError(
                "rotation_compensation.strength must be non-negative".to_string(),
            ));
        }
        if !(self.roll_compensation.strength >= 0.0 && self.roll_compensation.object_half_height >= 0.0) {
            return Err(Error::ConfigError(
                "roll_compensation strength and object_half_height must be non-negative".to_string(),
            ));
        }

        // Validate placement
        if !(0.0..=1.0).contains(&self.placement.depth_falloff) {
            return Err(Error::ConfigError(
                "placement.depth_falloff must be between 0.0 and 1.0".to_string(),
            ));
        }
        let offsets = [
            self.placement.attachment_distance,
            self.placement.offset_x,
            self.placement.offset_y,
            self.placement.offset_z,
            self.placement.depth_offset,
            self.manual.rotation_x,
            self.manual.rotation_y,
            self.manual.rotation_z,
        ];
        if offsets.iter().any(|v| !v.is_finite()) {
            return Err(Error::ConfigError(
                "placement offsets and manual rotations must be finite".to_string(),
            ));
        }

        // Validate tracking band
        if !(self.tracking.min_interocular > 0.0 && self.tracking.max_interocular > self.tracking.min_interocular) {
            return Err(Error::ConfigError(format!(
                "tracking interocular band [{}, {}] is empty",
                self.tracking.min_interocular, self.tracking.max_interocular
            )));
        }

        Ok(())
    }

    /// Feature extractor for this snapshot
    #[must_use]
    pub fn feature_extractor(&self) -> FeatureExtractor {
        FeatureExtractor::new(
            self.tracking.min_interocular,
            self.tracking.max_interocular,
            self.placement.anchor,
        )
    }

    /// Scale estimator for this snapshot
    #[must_use]
    pub fn scale_estimator(&self) -> ScaleEstimator {
        ScaleEstimator::new(self.scale.clone(), self.rotation_compensation.clone())
    }
}

impl SmoothingConfig {
    /// Per-channel filter coefficients
    #[must_use]
    pub fn channel_alphas(&self) -> ChannelAlphas {
        ChannelAlphas {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
            compensation: self.compensation,
        }
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Head Anchor Configuration

# Filter coefficients in (0, 1); higher = snappier, lower = smoother
smoothing:
  position: 0.35
  rotation: 0.35
  scale: 0.35
  compensation: 0.2
  roll: 0.5

# Scale estimation (strategy: interocular_distance, bounding_box, combined)
scale:
  strategy: "bounding_box"
  base_multiplier: 1.3
  user_base_scale: 1.0
  reference_width: 1280.0
  reference_height: 720.0
  reference_interocular: 0.13
  reference_face_size: 0.55
  min_scale: 0.25
  max_scale: 4.0

# Perspective scale growth as the head turns toward profile
rotation_compensation:
  enabled: true
  threshold: 0.1
  strength: 0.5

# Vertical correction as the head tilts
roll_compensation:
  enabled: true
  strength: 1.0
  object_half_height: 30.0

# Placement (mode: centered, pivot; anchor: nose_tip, nose_bridge, eye_line)
placement:
  mode: "centered"
  anchor: "nose_bridge"
  attachment_distance: 60.0
  offset_x: 0.0
  offset_y: 0.0
  offset_z: -68.0
  depth_offset: 100.0
  dynamic_depth: false
  depth_falloff: 0.5
  mirror_input: false

# Manual rotation override (radians)
manual:
  rotation_x: 0.0
  rotation_y: 0.0
  rotation_z: 0.0

# Frame validation (matrix_layout: column_major, row_major)
tracking:
  min_interocular: 0.1
  max_interocular: 0.5
  reseed_after_held_frames: 30
  matrix_layout: "column_major"
"#;
