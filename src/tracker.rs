//! Per-frame orchestration.
//!
//! [`AnchorTracker`] owns every piece of cross-frame state: the filter
//! channels, the previous frame's metrics and the last emitted pose. Each
//! call to [`AnchorTracker::process_frame`] runs the stages in order
//! (decompose, extract, estimate scale, filter, compose) or holds the
//! previous pose when the frame is unusable.

use crate::{
    compositor::{AnchorPose, Compositor},
    config::Settings,
    features::{FaceMetrics, FeatureExtractor, FrameRejection},
    filters::{ChannelAlphas, ChannelTargets, PoseFilters, Smoother},
    geometry::FrameSize,
    landmarks::{Landmark, LandmarkSet},
    pose_estimation::{decompose_head_transform, mirror_head_transform},
    scale::ScaleEstimator,
    Result,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Raw detector output for one face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Normalized landmarks in detector order
    pub landmarks: Vec<Landmark>,
    /// Optional 4×4 head transform
    #[serde(default)]
    pub transform: Option<[f64; 16]>,
}

/// Tracking state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingState {
    /// No valid frame seen yet; the resting pose is emitted
    Uninitialized,
    /// The last frame ran the full pipeline
    Tracking,
    /// The last frame was unusable; the previous pose was re-emitted
    Held,
}

/// Frame orchestrator for one tracked face
#[derive(Debug, Clone)]
pub struct AnchorTracker {
    settings: Settings,
    pending: Option<Settings>,
    extractor: FeatureExtractor,
    estimator: ScaleEstimator,
    compositor: Compositor,
    alphas: ChannelAlphas,
    filters: PoseFilters,
    state: TrackingState,
    previous_metrics: Option<FaceMetrics>,
    last_pose: AnchorPose,
    last_rejection: Option<FrameRejection>,
    needs_seed: bool,
    held_frames: u32,
    frame_count: u64,
}

impl AnchorTracker {
    /// Create a tracker
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail validation.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        info!(
            "Anchor tracker created (strategy {:?}, placement {:?})",
            settings.scale.strategy, settings.placement.mode
        );

        Ok(Self {
            extractor: settings.feature_extractor(),
            estimator: settings.scale_estimator(),
            compositor: Compositor::from_config(&settings),
            alphas: settings.smoothing.channel_alphas(),
            settings,
            pending: None,
            filters: PoseFilters::default(),
            state: TrackingState::Uninitialized,
            previous_metrics: None,
            last_pose: AnchorPose::default(),
            last_rejection: None,
            needs_seed: true,
            held_frames: 0,
            frame_count: 0,
        })
    }

    /// Queue a settings snapshot; it takes effect at the start of the next frame
    ///
    /// A later snapshot replaces one that has not been applied yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail validation; the queue is left
    /// untouched.
    pub fn update_settings(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.pending = Some(settings);
        Ok(())
    }

    /// Re-seed every smoother to its target on the next tracking frame
    pub fn reinitialize(&mut self) {
        info!("Tracker reinitialization requested");
        self.needs_seed = true;
    }

    /// Process one frame
    ///
    /// `face` is `None` when the detector found nothing (or failed). Never
    /// fails: an unusable frame re-emits the previous pose.
    pub fn process_frame(&mut self, frame: FrameSize, face: Option<&FaceObservation>) -> AnchorPose {
        self.apply_pending_settings();
        self.frame_count += 1;

        let result = match face {
            Some(observation) => self.track(frame, observation),
            None => Err(FrameRejection::NoFace),
        };

        match result {
            Ok(pose) => {
                if self.state != TrackingState::Tracking {
                    info!("Tracking acquired at frame {}", self.frame_count);
                }
                self.state = TrackingState::Tracking;
                self.held_frames = 0;
                self.last_rejection = None;
                self.last_pose = pose;
            }
            Err(reason) => self.hold(reason),
        }

        self.last_pose.clone()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> TrackingState {
        self.state
    }

    /// Most recently emitted pose
    #[must_use]
    pub fn last_pose(&self) -> &AnchorPose {
        &self.last_pose
    }

    /// Why the last frame was held, if it was
    #[must_use]
    pub fn last_rejection(&self) -> Option<&FrameRejection> {
        self.last_rejection.as_ref()
    }

    /// Smoothed yaw compensation factor
    #[must_use]
    pub fn compensation_factor(&self) -> f64 {
        self.filters.compensation.value()
    }

    /// Frames processed so far
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Settings currently in effect
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn apply_pending_settings(&mut self) {
        let Some(settings) = self.pending.take() else {
            return;
        };

        debug!("Applying settings snapshot at frame {}", self.frame_count + 1);
        self.extractor = settings.feature_extractor();
        self.estimator = settings.scale_estimator();
        self.compositor = Compositor::from_config(&settings);
        self.alphas = settings.smoothing.channel_alphas();
        self.settings = settings;
    }

    fn track(&mut self, frame: FrameSize, observation: &FaceObservation) -> std::result::Result<AnchorPose, FrameRejection> {
        let mirror = self.settings.placement.mirror_input;
        let head = observation.transform.as_ref().and_then(|data| {
            let data = if mirror { mirror_head_transform(data) } else { *data };
            decompose_head_transform(&data, self.settings.tracking.matrix_layout)
        });

        let landmarks = LandmarkSet::from_observation(&observation.landmarks, mirror)?;

        let seeding = self.needs_seed;
        let previous = if seeding { None } else { self.previous_metrics.as_ref() };
        let metrics = self
            .extractor
            .extract(&landmarks, head.as_ref())?
            .with_roll_continuity(previous, self.settings.smoothing.roll);

        let compensation_target = self.estimator.compensation_target(metrics.yaw);
        let compensation = if seeding {
            compensation_target
        } else {
            self.filters.compensation.update(&compensation_target, self.alphas.compensation)
        };

        let terms = self.estimator.estimate(&metrics, frame, compensation);
        let targets = ChannelTargets {
            position: self.compositor.position_target(&metrics, frame),
            orientation: self.compositor.orientation_target(&metrics, head.as_ref()),
            scale: terms.scale,
            compensation: compensation_target,
            roll_correction: self.compositor.roll_correction_target(metrics.roll),
        };

        if seeding {
            debug!("Seeding filters at frame {}", self.frame_count);
            self.filters.seed(&targets);
            self.needs_seed = false;
        } else {
            self.filters.position.update(&targets.position, self.alphas.position);
            self.filters.orientation.update(&targets.orientation, self.alphas.rotation);
            self.filters.scale.update(&targets.scale, self.alphas.scale);
            self.filters.roll_correction.update(&targets.roll_correction, self.alphas.compensation);
        }

        let pose = self.compositor.compose(&self.filters, &metrics);
        self.previous_metrics = Some(metrics);
        Ok(pose)
    }

    fn hold(&mut self, reason: FrameRejection) {
        debug!("Frame {} held: {reason}", self.frame_count);

        if self.state == TrackingState::Tracking {
            info!("Tracking lost at frame {}", self.frame_count);
            self.state = TrackingState::Held;
        }
        self.last_rejection = Some(reason);

        if self.state == TrackingState::Held {
            self.held_frames = self.held_frames.saturating_add(1);
            let limit = self.settings.tracking.reseed_after_held_frames;
            if limit > 0 && self.held_frames == limit {
                debug!("Held for {limit} frames, filters will re-seed on reacquisition");
                self.needs_seed = true;
            }
        }
    }
}
