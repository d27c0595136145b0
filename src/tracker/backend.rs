use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::frame::StereoImage;
use crate::trajectory::Pose;

/// Everything a stereo tracking engine needs to start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Feature vocabulary file.
    pub vocabulary: PathBuf,
    /// Camera/engine settings file.
    pub settings: PathBuf,
    /// Ask the engine to open its own visualization.
    pub viewer: bool,
}

/// One timestamped stereo sample. Consumed by the tracker, never retained
/// by the loop.
#[derive(Clone, Debug)]
pub struct StereoSample {
    pub left: StereoImage,
    pub right: StereoImage,
    /// Seconds since the acquisition loop started.
    pub timestamp: f64,
}

/// Stereo tracking engine boundary.
///
/// Calls are blocking and non-reentrant. Engines may run their own worker
/// threads internally; `shutdown` is where those are stopped and joined.
/// The acquisition loop calls `shutdown` at most once and then
/// `export_trajectory` at most once.
pub trait Tracker {
    /// Engine identifier.
    fn name(&self) -> &str;

    /// Track one sample. Returns the latest pose, or `None` while the engine
    /// is initializing or has lost tracking.
    fn track(&mut self, sample: StereoSample) -> Result<Option<Pose>>;

    /// Stop all engine activity.
    fn shutdown(&mut self) -> Result<()>;

    /// Persist the estimated trajectory (KITTI format).
    fn export_trajectory(&mut self, path: &Path) -> Result<()>;
}

impl<T: Tracker + ?Sized> Tracker for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn track(&mut self, sample: StereoSample) -> Result<Option<Pose>> {
        (**self).track(sample)
    }

    fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown()
    }

    fn export_trajectory(&mut self, path: &Path) -> Result<()> {
        (**self).export_trajectory(path)
    }
}

impl<T: Tracker + ?Sized> Tracker for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn track(&mut self, sample: StereoSample) -> Result<Option<Pose>> {
        (**self).track(sample)
    }

    fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown()
    }

    fn export_trajectory(&mut self, path: &Path) -> Result<()> {
        (**self).export_trajectory(path)
    }
}
