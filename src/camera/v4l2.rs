//! V4L2 capture for side-by-side stereo cameras.
//!
//! The device node is claimed at open time. Format negotiation happens in
//! `apply_format`, which stops any running stream; `start_stream` creates
//! the mmap stream once the session has accepted the reported geometry.
//! Buffers are copied out and normalized at capture time; nothing borrowed
//! from the driver's ring escapes `next_frame`.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ouroboros::self_referencing;

use crate::frame::{CombinedFrame, PixelFormat};

use super::normalize::normalize_frame;
use super::{CameraError, CameraOptions, CameraStats, CaptureError};

pub(crate) struct V4l2Camera {
    path: PathBuf,
    stream_buffers: u32,
    capture_timeout: Duration,
    idle: Option<v4l::Device>,
    state: Option<DeviceStreamState>,
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_count: u64,
    format_requests: u64,
}

#[self_referencing]
struct DeviceStreamState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Camera {
    pub(crate) fn open(path: PathBuf, options: &CameraOptions) -> Result<Self, CameraError> {
        let device = v4l::Device::with_path(&path).map_err(|err| CameraError::DeviceOpen {
            device: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            path,
            stream_buffers: options.stream_buffers.max(1),
            capture_timeout: options.capture_timeout,
            idle: Some(device),
            state: None,
            width: 0,
            height: 0,
            format: PixelFormat::Yuyv,
            frame_count: 0,
            format_requests: 0,
        })
    }

    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn configure_error(&self, reason: impl ToString) -> CameraError {
        CameraError::Configure {
            device: self.label(),
            reason: reason.to_string(),
        }
    }

    /// Reclaim the device from a running stream, if any.
    fn take_device(&mut self) -> Option<v4l::Device> {
        if let Some(device) = self.idle.take() {
            return Some(device);
        }
        self.state.take().map(|state| state.into_heads().device)
    }

    /// Request `width`x`height` and read back what the driver accepted.
    /// Any running stream is stopped. Returns the reported width.
    pub(crate) fn apply_format(&mut self, width: u32, height: u32) -> Result<u32, CameraError> {
        use v4l::video::Capture;

        let mut device = self
            .take_device()
            .ok_or_else(|| self.configure_error("device handle lost"))?;
        self.format_requests += 1;

        let mut format = match device.format() {
            Ok(format) => format,
            Err(err) => {
                self.idle = Some(device);
                return Err(self.configure_error(format!("read format: {}", err)));
            }
        };
        format.width = width;
        format.height = height;
        format.fourcc = v4l::FourCC::new(b"YUYV");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("camera {}: failed to set format: {}", self.label(), err);
                match device.format() {
                    Ok(format) => format,
                    Err(err) => {
                        self.idle = Some(device);
                        return Err(self.configure_error(format!(
                            "read format after set failure: {}",
                            err
                        )));
                    }
                }
            }
        };

        let pixel_format = match &format.fourcc.repr {
            b"YUYV" => PixelFormat::Yuyv,
            b"GREY" => PixelFormat::Gray8,
            b"RGB3" => PixelFormat::Rgb24,
            other => {
                self.idle = Some(device);
                return Err(self.configure_error(format!(
                    "unsupported pixel format {}",
                    String::from_utf8_lossy(other)
                )));
            }
        };

        self.width = format.width;
        self.height = format.height;
        self.format = pixel_format;
        self.idle = Some(device);

        log::info!(
            "camera {}: driver reports {}x{} {:?}",
            self.label(),
            self.width,
            self.height,
            self.format
        );
        Ok(self.width)
    }

    /// Allocate driver buffers and start streaming the negotiated format.
    pub(crate) fn start_stream(&mut self) -> Result<(), CameraError> {
        use v4l::buffer::Type;

        let device = self
            .take_device()
            .ok_or_else(|| self.configure_error("device handle lost"))?;
        let buffers = self.stream_buffers;
        let built = DeviceStreamStateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, buffers)
            },
        }
        .try_build_or_recover();
        let mut state = match built {
            Ok(state) => state,
            Err((err, heads)) => {
                self.idle = Some(heads.device);
                return Err(self.configure_error(format!("create buffer stream: {}", err)));
            }
        };
        let timeout = self.capture_timeout;
        state.with_mut(|fields| fields.stream.set_timeout(timeout));
        self.state = Some(state);

        log::info!(
            "camera {}: streaming with {} buffers, {:?} frame timeout",
            self.label(),
            buffers,
            timeout
        );
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<CombinedFrame, CaptureError> {
        use v4l::io::traits::CaptureStream;

        let label = self.label();
        let timeout = self.capture_timeout;
        let state = self.state.as_mut().ok_or(CaptureError::NotConfigured)?;
        let pixels = state
            .with_mut(|fields| {
                fields.stream.next().map(|(buf, meta)| {
                    let used = (meta.bytesused as usize).min(buf.len());
                    buf[..used].to_vec()
                })
            })
            .map_err(|err| capture_error(label, err, timeout))?;

        if pixels.is_empty() {
            return Ok(CombinedFrame::empty(self.width, self.format));
        }

        let (pixels, format) = normalize_frame(&pixels, self.width, self.height, self.format)?;
        self.frame_count += 1;
        Ok(CombinedFrame::new(pixels, self.width, self.height, format)?)
    }

    pub(crate) fn stats(&self) -> CameraStats {
        CameraStats {
            device: self.label(),
            frames_captured: self.frame_count,
            format_requests: self.format_requests,
            streaming: self.state.is_some(),
        }
    }
}

/// Classify a failed dequeue.
fn capture_error(device: String, err: io::Error, timeout: Duration) -> CaptureError {
    match err.kind() {
        io::ErrorKind::TimedOut => CaptureError::Timeout {
            device,
            after: timeout,
        },
        io::ErrorKind::Interrupted => CaptureError::Interrupted { device },
        _ => CaptureError::Device {
            device,
            reason: err.to_string(),
        },
    }
}
