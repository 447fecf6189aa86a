//! Recorded detector sessions and JSON-lines output.
//!
//! A recording is one JSON object per line:
//!
//! ```text
//! {"index":1,"timestamp_ms":33,"size":{"width":1280,"height":720},"face":{"landmarks":[...],"transform":[...]}}
//! ```
//!
//! `face` is `null` for frames where the detector found nothing. Replaying a
//! recording stands in for both the camera and the detector.

use crate::{
    app::{FaceDetector, Frame, FrameSource, RenderSink},
    compositor::AnchorPose,
    geometry::FrameSize,
    synthetic::yaw_sweep,
    tracker::FaceObservation,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

/// One recorded frame with its detector output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// 1-based frame number
    pub index: u64,
    /// Capture time in milliseconds
    #[serde(default)]
    pub timestamp_ms: u64,
    /// Frame dimensions
    pub size: FrameSize,
    /// Detector output, absent when no face was found
    #[serde(default)]
    pub face: Option<FaceObservation>,
}

impl Frame for RecordedFrame {
    fn size(&self) -> FrameSize {
        self.size
    }

    fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

/// Frame source reading a JSON-lines recording
pub struct ReplaySource<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl ReplaySource<BufReader<File>> {
    /// Open a recording file
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameSource`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::FrameSource(format!("cannot open recording {}: {e}", path.display())))?;
        log::info!("Replaying recording {}", path.display());
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    /// Read a recording from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    type Frame = RecordedFrame;

    fn next_frame(&mut self) -> Result<Option<RecordedFrame>> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buffer.trim();
            if text.is_empty() {
                continue;
            }

            let frame = serde_json::from_str(text)
                .map_err(|e| Error::FrameSource(format!("recording line {}: {e}", self.line)))?;
            return Ok(Some(frame));
        }
    }
}

/// In-memory frame source
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    frames: VecDeque<RecordedFrame>,
}

impl FrameQueue {
    /// Queue the given frames
    #[must_use]
    pub fn new(frames: Vec<RecordedFrame>) -> Self {
        Self { frames: frames.into() }
    }

    /// Frames not yet consumed
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether every frame was consumed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for FrameQueue {
    type Frame = RecordedFrame;

    fn next_frame(&mut self) -> Result<Option<RecordedFrame>> {
        Ok(self.frames.pop_front())
    }
}

/// Detector that returns the recorded observation of each frame
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayDetector;

impl FaceDetector<RecordedFrame> for ReplayDetector {
    fn detect(&mut self, frame: &RecordedFrame) -> Result<Option<FaceObservation>> {
        Ok(frame.face.clone())
    }
}

/// Build a synthetic session of a head sweeping left and right
///
/// Frames are spaced for 30 fps. With `with_transform` each frame carries a
/// detector transform, otherwise only landmarks.
#[must_use]
pub fn synthetic_session(frames: usize, size: FrameSize, max_yaw: f64, with_transform: bool) -> Vec<RecordedFrame> {
    yaw_sweep(frames, max_yaw)
        .iter()
        .zip(1u64..)
        .map(|(face, index)| RecordedFrame {
            index,
            timestamp_ms: index * 1000 / 30,
            size,
            face: Some(FaceObservation {
                landmarks: face.landmarks(),
                transform: with_transform.then(|| face.head_transform()),
            }),
        })
        .collect()
}

/// Write frames as a JSON-lines recording
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_recording<W: Write>(mut writer: W, frames: &[RecordedFrame]) -> Result<()> {
    for frame in frames {
        serde_json::to_writer(&mut writer, frame)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// One line of pose output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// 1-based frame number
    pub frame: u64,
    /// Emitted pose
    #[serde(flatten)]
    pub pose: AnchorPose,
}

/// Render sink writing one [`PoseRecord`] per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    frame: u64,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer, frame: 0 }
    }

    /// Poses written so far
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frame
    }

    /// Return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn submit(&mut self, pose: &AnchorPose) -> Result<()> {
        self.frame += 1;
        let record = PoseRecord {
            frame: self.frame,
            pose: pose.clone(),
        };
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| Error::RenderSink(format!("frame {}: {e}", self.frame)))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| Error::RenderSink(format!("frame {}: {e}", self.frame)))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::RenderSink(format!("flush failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_recording_round_trip() {
        let frames = synthetic_session(4, FrameSize::new(640, 480), 0.5, true);
        let mut buffer = Vec::new();
        write_recording(&mut buffer, &frames).unwrap();

        let mut source = ReplaySource::from_reader(Cursor::new(buffer));
        let mut replayed = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            replayed.push(frame);
        }
        assert_eq!(replayed.len(), frames.len());
        for (got, want) in replayed.iter().zip(&frames) {
            assert_eq!(got.index, want.index);
            assert_eq!(got.size, want.size);
            let (got, want) = (got.face.as_ref().unwrap(), want.face.as_ref().unwrap());
            assert_eq!(got.landmarks.len(), want.landmarks.len());
            assert!(got
                .landmarks
                .iter()
                .zip(&want.landmarks)
                .all(|(a, b)| (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12 && (a.z - b.z).abs() < 1e-12));
            assert!(got.transform.is_some());
        }
    }

    #[test]
    fn test_blank_lines_and_missing_faces() {
        let text = "\n{\"index\":1,\"size\":{\"width\":640,\"height\":480},\"face\":null}\n\n";
        let mut source = ReplaySource::from_reader(Cursor::new(text));
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.size(), FrameSize::new(640, 480));
        assert!(frame.face.is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_is_frame_source_error() {
        let mut source = ReplaySource::from_reader(Cursor::new("{\"index\": }\n"));
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, Error::FrameSource(msg) if msg.contains("line 1")));
    }

    #[test]
    fn test_sink_numbers_frames() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.submit(&AnchorPose::default()).unwrap();
        sink.submit(&AnchorPose::default()).unwrap();
        assert_eq!(sink.frames_written(), 2);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let records: Vec<PoseRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(records[1].frame, 2);
        assert_eq!(records[1].pose, AnchorPose::default());
    }
}
