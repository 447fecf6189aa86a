//! Session loop driving the tracker from external collaborators.

use crate::{
    compositor::AnchorPose,
    config::Settings,
    geometry::FrameSize,
    tracker::{AnchorTracker, FaceObservation, TrackingState},
    Result,
};
use log::{debug, info, warn};
use std::{
    sync::mpsc::Receiver,
    time::{Duration, Instant},
};

/// A video frame as seen by the engine
pub trait Frame {
    /// Frame dimensions in pixels
    fn size(&self) -> FrameSize;

    /// Capture time in milliseconds
    fn timestamp_ms(&self) -> u64;
}

/// Source of video frames
pub trait FrameSource {
    /// Frame type produced
    type Frame: Frame;

    /// Next frame, or `None` when the session ends
    ///
    /// # Errors
    ///
    /// Any error ends the session.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;
}

/// Landmark and pose detector
pub trait FaceDetector<F> {
    /// Detect the tracked face in `frame`
    ///
    /// # Errors
    ///
    /// An error is treated like a frame without a face.
    fn detect(&mut self, frame: &F) -> Result<Option<FaceObservation>>;
}

/// Consumer of anchor poses (the renderer)
pub trait RenderSink {
    /// Accept the pose for the current frame
    ///
    /// # Errors
    ///
    /// Any error ends the session.
    fn submit(&mut self, pose: &AnchorPose) -> Result<()>;

    /// Flush buffered output at the end of a session
    ///
    /// # Errors
    ///
    /// Returns an error if buffered output cannot be written.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Producer of settings snapshots, polled between frames
pub trait SettingsSource {
    /// Latest pending snapshot, if any
    fn poll(&mut self) -> Option<Settings>;
}

impl SettingsSource for Receiver<Settings> {
    fn poll(&mut self) -> Option<Settings> {
        // only the newest snapshot matters
        self.try_iter().last()
    }
}

impl RenderSink for Vec<AnchorPose> {
    fn submit(&mut self, pose: &AnchorPose) -> Result<()> {
        self.push(pose.clone());
        Ok(())
    }
}

/// Counters for a finished session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Frames processed
    pub frames: u64,
    /// Frames that ran the full pipeline
    pub tracked: u64,
    /// Frames that re-emitted a previous or resting pose
    pub held: u64,
    /// Frames where the detector returned an error
    pub detector_errors: u64,
    /// Settings snapshots applied
    pub settings_updates: u64,
    /// Wall-clock duration of the loop
    pub elapsed: Duration,
}

impl RunSummary {
    /// Average processing rate
    #[must_use]
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Main application struct
pub struct AnchorApp<S, D, R>
where
    S: FrameSource,
    D: FaceDetector<S::Frame>,
    R: RenderSink,
{
    source: S,
    detector: D,
    sink: R,
    settings_source: Option<Box<dyn SettingsSource>>,
    tracker: AnchorTracker,
}

impl<S, D, R> AnchorApp<S, D, R>
where
    S: FrameSource,
    D: FaceDetector<S::Frame>,
    R: RenderSink,
{
    /// Create a new application instance
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail validation.
    pub fn new(settings: Settings, source: S, detector: D, sink: R) -> Result<Self> {
        Ok(Self {
            source,
            detector,
            sink,
            settings_source: None,
            tracker: AnchorTracker::new(settings)?,
        })
    }

    /// Attach a source of settings snapshots
    #[must_use]
    pub fn with_settings_source(mut self, settings_source: impl SettingsSource + 'static) -> Self {
        self.settings_source = Some(Box::new(settings_source));
        self
    }

    /// The tracker driven by this session
    #[must_use]
    pub fn tracker(&self) -> &AnchorTracker {
        &self.tracker
    }

    /// Consume the application and return the render sink
    pub fn into_sink(self) -> R {
        self.sink
    }

    /// Run the main application loop until the frame source ends
    ///
    /// # Errors
    ///
    /// Returns the first frame source or render sink error.
    pub fn run(&mut self) -> Result<RunSummary> {
        info!("Starting session loop");

        let mut summary = RunSummary::default();
        let start_time = Instant::now();
        let mut last_fps_update = Instant::now();
        let mut frames_since_update = 0u64;

        loop {
            self.poll_settings(&mut summary);

            let Some(frame) = self.source.next_frame()? else {
                info!("End of frame source reached");
                break;
            };

            let face = match self.detector.detect(&frame) {
                Ok(face) => face,
                Err(e) => {
                    warn!("Detector failed at {} ms: {e}", frame.timestamp_ms());
                    summary.detector_errors += 1;
                    None
                }
            };

            let pose = self.tracker.process_frame(frame.size(), face.as_ref());
            if self.tracker.state() == TrackingState::Tracking {
                summary.tracked += 1;
            } else {
                summary.held += 1;
            }

            self.sink.submit(&pose)?;

            summary.frames += 1;
            frames_since_update += 1;
            if last_fps_update.elapsed() >= Duration::from_secs(1) {
                let fps = frames_since_update as f64 / last_fps_update.elapsed().as_secs_f64();
                info!("{fps:.1} fps, state {:?}", self.tracker.state());
                frames_since_update = 0;
                last_fps_update = Instant::now();
            }
        }

        self.sink.flush()?;
        summary.elapsed = start_time.elapsed();

        info!(
            "Session finished: {} frames ({} tracked, {} held) in {:.2?}",
            summary.frames, summary.tracked, summary.held, summary.elapsed
        );
        Ok(summary)
    }

    fn poll_settings(&mut self, summary: &mut RunSummary) {
        let Some(settings) = self.settings_source.as_mut().and_then(|source| source.poll()) else {
            return;
        };

        match self.tracker.update_settings(settings) {
            Ok(()) => {
                debug!("Settings snapshot queued");
                summary.settings_updates += 1;
            }
            Err(e) => warn!("Ignoring invalid settings snapshot: {e}"),
        }
    }
}
