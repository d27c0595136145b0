use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{CameraOptions, DEFAULT_CAPTURE_TIMEOUT, DEFAULT_STREAM_BUFFERS};
use crate::pipeline::LoopOptions;
use crate::trajectory::DEFAULT_TRAJECTORY_PATH;

const DEFAULT_ENGINE: &str = "stub";

#[derive(Debug, Deserialize, Default)]
struct LiveConfigFile {
    trajectory_path: Option<PathBuf>,
    engine: Option<String>,
    max_frames: Option<u64>,
    camera: Option<CameraConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    stream_buffers: Option<u32>,
    capture_timeout_ms: Option<u64>,
}

/// Runtime settings that are not positional arguments.
///
/// Resolved in order: built-in defaults, JSON config file
/// (`STEREO_LIVE_CONFIG`), environment overrides, then command-line flags
/// applied by the caller. `validate` runs once, after the last layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
    pub trajectory_path: PathBuf,
    pub engine: String,
    pub max_frames: Option<u64>,
    pub stream_buffers: u32,
    pub capture_timeout: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            trajectory_path: PathBuf::from(DEFAULT_TRAJECTORY_PATH),
            engine: DEFAULT_ENGINE.to_string(),
            max_frames: None,
            stream_buffers: DEFAULT_STREAM_BUFFERS,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }
}

impl LiveConfig {
    /// Load from `path`, or from `STEREO_LIVE_CONFIG` when `path` is `None`.
    /// Without either, defaults plus environment overrides are used.
    /// Values are not validated here.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("STEREO_LIVE_CONFIG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let file_cfg = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Some(read_config_file(&path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn from_file(file: LiveConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            trajectory_path: file.trajectory_path.unwrap_or(defaults.trajectory_path),
            engine: file.engine.unwrap_or(defaults.engine),
            max_frames: file.max_frames.or(defaults.max_frames),
            stream_buffers: file
                .camera
                .as_ref()
                .and_then(|camera| camera.stream_buffers)
                .unwrap_or(defaults.stream_buffers),
            capture_timeout: file
                .camera
                .and_then(|camera| camera.capture_timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.capture_timeout),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("STEREO_LIVE_TRAJECTORY") {
            if !path.trim().is_empty() {
                self.trajectory_path = PathBuf::from(path);
            }
        }
        if let Ok(engine) = std::env::var("STEREO_LIVE_ENGINE") {
            if !engine.trim().is_empty() {
                self.engine = engine.trim().to_string();
            }
        }
        if let Ok(frames) = std::env::var("STEREO_LIVE_MAX_FRAMES") {
            let frames: u64 = frames
                .trim()
                .parse()
                .map_err(|_| anyhow!("STEREO_LIVE_MAX_FRAMES must be a positive integer"))?;
            self.max_frames = Some(frames);
        }
        if let Ok(buffers) = std::env::var("STEREO_LIVE_BUFFERS") {
            self.stream_buffers = buffers
                .trim()
                .parse()
                .map_err(|_| anyhow!("STEREO_LIVE_BUFFERS must be a positive integer"))?;
        }
        if let Ok(millis) = std::env::var("STEREO_LIVE_CAPTURE_TIMEOUT_MS") {
            let millis: u64 = millis.trim().parse().map_err(|_| {
                anyhow!("STEREO_LIVE_CAPTURE_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.capture_timeout = Duration::from_millis(millis);
        }
        Ok(())
    }

    /// Reject values the loop or camera cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.trajectory_path.as_os_str().is_empty() {
            return Err(anyhow!("trajectory_path must not be empty"));
        }
        if self.engine.trim().is_empty() {
            return Err(anyhow!("engine must not be empty"));
        }
        if self.max_frames == Some(0) {
            return Err(anyhow!("max_frames must be greater than zero"));
        }
        if self.stream_buffers == 0 {
            return Err(anyhow!("stream_buffers must be at least 1"));
        }
        if self.capture_timeout.is_zero() {
            return Err(anyhow!("capture_timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    pub fn camera_options(&self) -> CameraOptions {
        CameraOptions {
            stream_buffers: self.stream_buffers,
            capture_timeout: self.capture_timeout,
        }
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            trajectory_path: self.trajectory_path.clone(),
            max_frames: self.max_frames,
        }
    }
}

fn read_config_file(path: &Path) -> Result<LiveConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
