//! Camera session for side-by-side stereo devices.
//!
//! A session owns one capture device and produces combined frames:
//! - `stub://` URLs select an in-process synthetic camera (tests, dry runs)
//! - device indices and `/dev/video*` paths use V4L2 (feature: camera-v4l2)
//!
//! The session is responsible for:
//! - Rejecting unsupported widths before any device I/O
//! - Verifying that the device actually accepted the requested width
//! - Treating an empty capture as a fatal end of stream
//!
//! The session MUST NOT:
//! - Retry a failed configuration or capture
//! - Hand out views into the device's capture buffers

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::frame::{CombinedFrame, FrameError};
use crate::profile::{StereoProfile, UnsupportedResolution};

#[cfg(any(feature = "camera-v4l2", test))]
mod normalize;
mod synthetic;
#[cfg(feature = "camera-v4l2")]
mod v4l2;

use synthetic::SyntheticCamera;
#[cfg(feature = "camera-v4l2")]
use v4l2::V4l2Camera;

/// Default number of driver buffers for streaming capture.
pub const DEFAULT_STREAM_BUFFERS: u32 = 4;

/// Default wait for a frame before the device is declared stalled.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

// ----------------------------------------------------------------------------
// Errors
// ----------------------------------------------------------------------------

/// Failures while opening or configuring a camera.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open camera {device}: {reason}")]
    DeviceOpen { device: String, reason: String },
    #[error(transparent)]
    UnsupportedResolution(#[from] UnsupportedResolution),
    #[error("Couldn't set camera resolution {requested}. Current resolution is {reported}")]
    ResolutionMismatch { requested: u32, reported: u32 },
    #[error("failed to configure camera {device}: {reason}")]
    Configure { device: String, reason: String },
}

/// Failures while capturing a frame. All of them end the acquisition loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Error getting images! camera returned an empty frame")]
    EmptyFrame,
    #[error("camera is not configured")]
    NotConfigured,
    #[error("capture failed on {device}: {reason}")]
    Device { device: String, reason: String },
    #[error("no frame from {device} within {after:?}")]
    Timeout { device: String, after: Duration },
    #[error("capture on {device} interrupted by a signal")]
    Interrupted { device: String },
    #[error("malformed frame: {0}")]
    Geometry(#[from] FrameError),
}

// ----------------------------------------------------------------------------
// Device selection
// ----------------------------------------------------------------------------

/// Which capture device to open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceSpec {
    /// `/dev/video<N>`.
    Index(u32),
    /// Explicit device node.
    Path(PathBuf),
    /// `stub://name[?frames=N&clamp=W]`.
    Synthetic(String),
}

impl DeviceSpec {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DeviceSpec::Synthetic(_))
    }
}

impl FromStr for DeviceSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.starts_with("stub://") {
            return Ok(DeviceSpec::Synthetic(value.to_string()));
        }
        if value.starts_with('/') {
            return Ok(DeviceSpec::Path(PathBuf::from(value)));
        }
        value
            .parse::<u32>()
            .map(DeviceSpec::Index)
            .map_err(|_| format!("invalid camera device '{}': expected an index, a /dev path or stub://", value))
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSpec::Index(index) => write!(f, "/dev/video{}", index),
            DeviceSpec::Path(path) => write!(f, "{}", path.display()),
            DeviceSpec::Synthetic(url) => write!(f, "{}", url),
        }
    }
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// Options for opening a session.
#[derive(Clone, Debug)]
pub struct CameraOptions {
    /// Driver buffers for streaming capture.
    pub stream_buffers: u32,
    /// Longest wait for a single frame.
    pub capture_timeout: Duration,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            stream_buffers: DEFAULT_STREAM_BUFFERS,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }
}

/// Capture statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CameraStats {
    pub device: String,
    pub frames_captured: u64,
    /// Format negotiations sent to the device.
    pub format_requests: u64,
    /// A capture stream is running.
    pub streaming: bool,
}

/// Anything the acquisition loop can pull combined frames from.
pub trait FrameSource {
    /// Block until the next frame is available.
    fn capture(&mut self) -> Result<CombinedFrame, CaptureError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn capture(&mut self) -> Result<CombinedFrame, CaptureError> {
        (**self).capture()
    }
}

/// An open stereo camera.
pub struct CameraSession {
    backend: CameraBackend,
    profile: Option<StereoProfile>,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "camera-v4l2")]
    Device(V4l2Camera),
}

impl fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSession")
            .field("device", &self.stats().device)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl CameraSession {
    /// Open the capture device.
    #[cfg_attr(not(feature = "camera-v4l2"), allow(unused_variables))]
    pub fn open(device: &DeviceSpec, options: CameraOptions) -> Result<Self, CameraError> {
        let backend = match device {
            DeviceSpec::Synthetic(url) => CameraBackend::Synthetic(SyntheticCamera::new(url)?),
            #[cfg(feature = "camera-v4l2")]
            DeviceSpec::Index(_) | DeviceSpec::Path(_) => {
                let path = PathBuf::from(device.to_string());
                CameraBackend::Device(V4l2Camera::open(path, &options)?)
            }
            #[cfg(not(feature = "camera-v4l2"))]
            DeviceSpec::Index(_) | DeviceSpec::Path(_) => {
                return Err(CameraError::DeviceOpen {
                    device: device.to_string(),
                    reason: "device capture requires the camera-v4l2 feature".to_string(),
                });
            }
        };
        log::info!("camera {} opened", device);
        Ok(Self {
            backend,
            profile: None,
        })
    }

    /// Negotiate the stereo profile for `width`; returns the derived height.
    ///
    /// Unsupported widths fail before the device is touched. If the device
    /// reports a different width than requested the session stays
    /// unconfigured, no stream is started and the caller must abort.
    /// Streaming starts only once the reported width is accepted.
    pub fn configure(&mut self, width: u32) -> Result<u32, CameraError> {
        let profile = StereoProfile::for_width(width)?;

        let reported = match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.apply_format(profile.width(), profile.height()),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.apply_format(profile.width(), profile.height())?,
        };
        if reported != profile.width() {
            self.profile = None;
            return Err(CameraError::ResolutionMismatch {
                requested: profile.width(),
                reported,
            });
        }
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.start_stream(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.start_stream()?,
        }

        log::info!(
            "camera {} configured for {}x{} ({}x{} per view)",
            self.stats().device,
            profile.width(),
            profile.height(),
            profile.view_width(),
            profile.height()
        );
        self.profile = Some(profile);
        Ok(profile.height())
    }

    /// Profile accepted by the last successful `configure`.
    pub fn profile(&self) -> Option<StereoProfile> {
        self.profile
    }

    /// Capture the next combined frame. A zero-row frame is an error.
    pub fn capture(&mut self) -> Result<CombinedFrame, CaptureError> {
        if self.profile.is_none() {
            return Err(CaptureError::NotConfigured);
        }
        let frame = match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.next_frame()?,
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.next_frame()?,
        };
        if frame.rows() == 0 {
            return Err(CaptureError::EmptyFrame);
        }
        Ok(frame)
    }

    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.stats(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.stats(),
        }
    }
}

impl FrameSource for CameraSession {
    fn capture(&mut self) -> Result<CombinedFrame, CaptureError> {
        CameraSession::capture(self)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
