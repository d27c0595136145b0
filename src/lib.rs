//! Live stereo tracking front end.
//!
//! This crate feeds a side-by-side stereo camera into a visual SLAM
//! tracking engine, one frame at a time, and records how long each
//! tracking call takes.
//!
//! # Architecture
//!
//! The pipeline is strictly lock-step:
//!
//! 1. **Camera session**: negotiates one of the two stereo profiles and
//!    captures combined frames. Unsupported widths are rejected before any
//!    device I/O; a device that reports a different width aborts startup.
//! 2. **Acquisition loop**: splits each frame into independently owned
//!    left/right views, timestamps it relative to loop start, hands it to
//!    the tracker and times the call. Every exit path shuts the tracker
//!    down once and exports the trajectory once.
//!
//! # Module Structure
//!
//! - `profile`: the fixed width to height stereo profiles
//! - `frame`: combined frames and the left/right split
//! - `camera`: camera session, device specs, synthetic and V4L2 backends
//! - `clock`: loop clock and monotonic frame timestamps
//! - `tracker`: tracking engine trait, registry and the stub engine
//! - `pipeline`: the acquisition-dispatch loop
//! - `stats`: latency log and median/mean summary
//! - `trajectory`: poses and the KITTI trajectory writer
//! - `config`: JSON config file with environment overrides

pub mod camera;
pub mod clock;
pub mod config;
pub mod frame;
pub mod pipeline;
pub mod profile;
pub mod stats;
pub mod tracker;
pub mod trajectory;

pub use camera::{
    CameraError, CameraOptions, CameraSession, CameraStats, CaptureError, DeviceSpec, FrameSource,
};
pub use clock::{Clock, ClockError, MonotonicClock, Timestamper};
pub use config::LiveConfig;
pub use frame::{CombinedFrame, FrameError, PixelFormat, StereoImage, StereoPair};
pub use pipeline::{AcquisitionLoop, FrameReport, LoopOptions, RunReport, StopReason};
pub use profile::{StereoProfile, UnsupportedResolution, SUPPORTED_PROFILES};
pub use stats::{LatencyLog, LatencySummary};
pub use tracker::{EngineConfig, StereoSample, StubTracker, Tracker, TrackerRegistry};
pub use trajectory::{Pose, DEFAULT_TRAJECTORY_PATH};
