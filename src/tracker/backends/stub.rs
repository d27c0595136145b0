use std::path::Path;

use anyhow::{anyhow, Result};

use crate::trajectory::{save_kitti, Pose};
use crate::tracker::backend::{EngineConfig, StereoSample, Tracker};

/// Dry-run engine. Checks that both views agree in geometry and reports a
/// stationary camera at the origin, so the acquisition path can be run and
/// timed without a SLAM engine attached.
pub struct StubTracker {
    config: EngineConfig,
    warmup_frames: u64,
    frames: u64,
    trajectory: Vec<Pose>,
    stopped: bool,
}

impl StubTracker {
    pub const NAME: &'static str = "stub";

    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            warmup_frames: 0,
            frames: 0,
            trajectory: Vec::new(),
            stopped: false,
        }
    }

    /// `TrackerFactory` for the registry.
    pub fn factory(config: &EngineConfig) -> Result<Box<dyn Tracker>> {
        Ok(Box::new(Self::new(config.clone())))
    }

    /// Report no pose for the first `frames` samples, like an engine that
    /// is still initializing its map.
    pub fn with_warmup(mut self, frames: u64) -> Self {
        self.warmup_frames = frames;
        self
    }

    pub fn frames_tracked(&self) -> u64 {
        self.frames
    }

    pub fn trajectory(&self) -> &[Pose] {
        &self.trajectory
    }
}

impl Tracker for StubTracker {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn track(&mut self, sample: StereoSample) -> Result<Option<Pose>> {
        if self.stopped {
            return Err(anyhow!("stub tracker already shut down"));
        }
        let (left, right) = (&sample.left, &sample.right);
        if left.width() != right.width()
            || left.height() != right.height()
            || left.format() != right.format()
        {
            return Err(anyhow!(
                "stereo views disagree: left {}x{} {:?}, right {}x{} {:?}",
                left.width(),
                left.height(),
                left.format(),
                right.width(),
                right.height(),
                right.format()
            ));
        }

        self.frames += 1;
        if self.frames <= self.warmup_frames {
            return Ok(None);
        }
        let pose = Pose::identity();
        self.trajectory.push(pose);
        Ok(Some(pose))
    }

    fn shutdown(&mut self) -> Result<()> {
        self.stopped = true;
        log::info!(
            "stub tracker for {} stopped after {} frames ({} poses)",
            self.config.settings.display(),
            self.frames,
            self.trajectory.len()
        );
        Ok(())
    }

    fn export_trajectory(&mut self, path: &Path) -> Result<()> {
        save_kitti(path, &self.trajectory)?;
        log::info!(
            "stub tracker wrote {} poses to {}",
            self.trajectory.len(),
            path.display()
        );
        Ok(())
    }
}
