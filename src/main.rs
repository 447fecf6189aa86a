//! Head anchoring driver: replays a detector session and writes anchor poses.

use anyhow::{Context, Result};
use clap::Parser;
use head_anchor::{
    app::{AnchorApp, FrameSource, RenderSink},
    config::{Config, EXAMPLE_CONFIG},
    geometry::FrameSize,
    replay::{synthetic_session, write_recording, FrameQueue, JsonLinesSink, ReplayDetector, ReplaySource},
};
use log::info;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded detector session to replay (JSON lines)
    #[arg(short, long, conflicts_with = "synthetic")]
    recording: Option<PathBuf>,

    /// Number of frames of a synthetic head sweep to run instead of a recording
    #[arg(short, long, default_value = "120")]
    synthetic: usize,

    /// Peak yaw of the synthetic sweep in radians
    #[arg(long, default_value = "1.0")]
    max_yaw: f64,

    /// Omit head transforms from the synthetic sweep (landmark-only estimation)
    #[arg(long)]
    landmarks_only: bool,

    /// Frame width for the synthetic sweep
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Frame height for the synthetic sweep
    #[arg(long, default_value = "720")]
    height: u32,

    /// Write the synthetic sweep as a recording to this path and exit
    #[arg(long)]
    save_recording: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Output file for anchor poses (JSON lines, default stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Head Anchor");

    // Load configuration if provided
    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let sink = JsonLinesSink::new(sink);

    if let Some(path) = &args.recording {
        let source = ReplaySource::open(path)?;
        return run(config, source, sink);
    }

    let frames = synthetic_session(
        args.synthetic,
        FrameSize::new(args.width, args.height),
        args.max_yaw,
        !args.landmarks_only,
    );

    if let Some(path) = &args.save_recording {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_recording(BufWriter::new(file), &frames)?;
        info!("Wrote {} synthetic frames to {}", frames.len(), path.display());
        return Ok(());
    }

    info!("Running synthetic sweep of {} frames", frames.len());
    run(config, FrameQueue::new(frames), sink)
}

fn run<S, R>(config: Config, source: S, sink: R) -> Result<()>
where
    S: FrameSource<Frame = head_anchor::replay::RecordedFrame>,
    R: RenderSink,
{
    let mut app = AnchorApp::new(config, source, ReplayDetector, sink)?;
    let summary = app.run()?;

    info!(
        "{} frames, {} tracked, {} held, {} detector errors, {:.0} fps",
        summary.frames,
        summary.tracked,
        summary.held,
        summary.detector_errors,
        summary.fps()
    );
    Ok(())
}
