//! stereo_live - feed a side-by-side stereo camera into a tracking engine.
//!
//! This binary:
//! 1. Validates the capture width against the two stereo profiles
//! 2. Opens and configures the camera, aborting on a resolution mismatch
//! 3. Builds the tracking engine from the vocabulary and settings files
//! 4. Tracks frames until capture fails, Ctrl-C, or the frame limit
//! 5. Shuts the engine down, prints latency statistics and saves the
//!    trajectory on every one of those exits

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stereo_live::camera::{CameraError, CameraSession, DeviceSpec};
use stereo_live::config::LiveConfig;
use stereo_live::pipeline::{AcquisitionLoop, FrameReport};
use stereo_live::profile::StereoProfile;
use stereo_live::tracker::{EngineConfig, TrackerRegistry};

const USAGE: &str =
    "Usage: ./stereo_live [path_to_vocabulary] [path_to_settings] [camera_index] [resolution] [viewer]";

/// Exit status for fatal runtime and configuration failures.
const EXIT_FATAL: u8 = 255;
const EXIT_USAGE: u8 = 1;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Track a live side-by-side stereo camera with a visual SLAM engine"
)]
struct Args {
    /// Feature vocabulary file.
    vocabulary: PathBuf,

    /// Camera/engine settings file.
    settings: PathBuf,

    /// Camera index, /dev/video* path, or stub:// URL.
    camera: DeviceSpec,

    /// Combined capture width: 1280 or 2560.
    resolution: String,

    /// "1" opens the engine's viewer.
    viewer: String,

    /// Tracking engine.
    #[arg(long)]
    engine: Option<String>,

    /// Trajectory output file.
    #[arg(long)]
    trajectory: Option<PathBuf>,

    /// Stop after this many tracked frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// JSON config file.
    #[arg(long, env = "STEREO_LIVE_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("{}", USAGE);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{:#}", err);
            eprintln!("{:#}", err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let profile = match args
        .resolution
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|width| StereoProfile::for_width(width).ok())
    {
        Some(profile) => profile,
        None => {
            println!("Not allowed resolution, set it to 1280 or 2560");
            return Ok(ExitCode::from(EXIT_FATAL));
        }
    };

    let mut config = LiveConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(engine) = args.engine {
        config.engine = engine;
    }
    if let Some(path) = args.trajectory {
        config.trajectory_path = path;
    }
    if let Some(frames) = args.max_frames {
        config.max_frames = Some(frames);
    }
    config.validate().context("invalid configuration")?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .context("error setting Ctrl-C handler")?;

    let mut camera = CameraSession::open(&args.camera, config.camera_options())?;
    match camera.configure(profile.width()) {
        Ok(height) => log::info!("capturing {}x{}", profile.width(), height),
        Err(err @ CameraError::ResolutionMismatch { .. }) => {
            println!("{}", err);
            return Ok(ExitCode::from(EXIT_FATAL));
        }
        Err(err) => return Err(err.into()),
    }

    let engine_config = EngineConfig {
        vocabulary: args.vocabulary,
        settings: args.settings,
        viewer: args.viewer.trim().parse::<i64>().ok() == Some(1),
    };
    let registry = TrackerRegistry::with_builtin();
    let tracker = registry
        .build(Some(&config.engine), &engine_config)
        .context("starting tracking engine")?;

    let acquisition =
        AcquisitionLoop::new(camera, tracker, config.loop_options()).with_stop_flag(stop);

    println!("-------");
    println!("Start processing live camera {} ...", args.camera);
    let report = acquisition.run(print_frame);

    println!("-------");
    match &report.latency {
        Some(summary) => println!("{}", summary),
        None => println!("no frames tracked"),
    }
    match &report.trajectory {
        Ok(path) => println!("trajectory saved to {}", path.display()),
        Err(err) => eprintln!("failed to save trajectory: {:#}", err),
    }
    if report.stop.is_failure() {
        eprintln!("{}", report.stop);
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_FATAL))
    }
}

fn print_frame(frame: &FrameReport) {
    println!("time step: {}", frame.latency.as_secs_f64());
    match &frame.pose {
        Some(pose) => println!("{}", pose.rotation),
        None => println!("no pose"),
    }
}
