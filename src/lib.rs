//! Head anchoring library for attaching rigid 3D objects to a tracked face.
//!
//! This library turns a noisy per-frame stream of facial landmarks and head
//! transforms into a smooth, plausibly sized anchor pose for a rigid object
//! such as a pair of glasses:
//! - Decomposition of the detector's 4×4 head transform
//! - Face metrics (interocular distance, bounding box, head angles) from landmarks
//! - Scale estimation with interchangeable strategies
//! - Exponential and spherical smoothing of every pose channel
//!
//! The per-frame pipeline consists of:
//! 1. Pose decomposition of the optional head transform
//! 2. Landmark validation and feature extraction
//! 3. Scale estimation, including the smoothed yaw compensation factor
//! 4. Temporal filtering of position, orientation, scale and roll correction
//! 5. Composition of the anchor pose (placement, depth offset, manual rotation)
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use head_anchor::{
//!     config::Settings,
//!     geometry::FrameSize,
//!     synthetic::SyntheticFace,
//!     tracker::{AnchorTracker, FaceObservation},
//! };
//!
//! # fn main() -> head_anchor::Result<()> {
//! let mut tracker = AnchorTracker::new(Settings::default())?;
//!
//! let face = SyntheticFace::default();
//! let observation = FaceObservation {
//!     landmarks: face.landmarks(),
//!     transform: Some(face.head_transform()),
//! };
//!
//! let pose = tracker.process_frame(FrameSize::new(1280, 720), Some(&observation));
//! assert!(pose.visible);
//! println!("Anchor at {:?}, scale {:.3}", pose.position, pose.scale);
//! # Ok(())
//! # }
//! ```
//!
//! ## Replaying a Recorded Session
//!
//! ```no_run
//! use head_anchor::{
//!     app::AnchorApp,
//!     config::Config,
//!     replay::{JsonLinesSink, ReplayDetector, ReplaySource},
//! };
//!
//! # fn main() -> head_anchor::Result<()> {
//! let config = Config::from_file("anchor.yaml")?;
//! let source = ReplaySource::open("session.jsonl")?;
//! let sink = JsonLinesSink::new(std::io::stdout().lock());
//!
//! let mut app = AnchorApp::new(config, source, ReplayDetector, sink)?;
//! let summary = app.run()?;
//! println!("{} frames, {} held", summary.frames, summary.held);
//! # Ok(())
//! # }
//! ```

/// Geometry helpers: interpolation, clamping, Euler conversions
pub mod geometry;

/// Decomposition of the detector's head transform
pub mod pose_estimation;

/// Facial landmark containers and validation
pub mod landmarks;

/// Per-frame face metrics
pub mod features;

/// Target scale estimation strategies
pub mod scale;

/// Temporal smoothing of pose channels
pub mod filters;

/// Anchor pose composition
pub mod compositor;

/// Per-frame state machine
pub mod tracker;

/// Error types and result handling
pub mod error;

/// Session loop and collaborator traits
pub mod app;

/// Recorded sessions and JSON-lines output
pub mod replay;

/// Synthetic faces with known geometry
pub mod synthetic;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
