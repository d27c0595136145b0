//! Synthetic side-by-side camera (`stub://` URLs).
//!
//! Query parameters:
//! - `frames=N`: return an empty frame after N captures (end of stream)
//! - `clamp=W`: report width W regardless of the request (simulates a
//!   device silently ignoring the requested resolution)
//!
//! Left-view pixels are always below 128 and right-view pixels at or above
//! 128, so a split can be checked against its source half.

use crate::frame::{CombinedFrame, PixelFormat};

use super::{CameraError, CameraStats, CaptureError};

pub(crate) struct SyntheticCamera {
    url: String,
    frame_limit: Option<u64>,
    clamp_width: Option<u32>,
    geometry: Option<(u32, u32)>,
    frame_count: u64,
    format_requests: u64,
    streaming: bool,
}

impl SyntheticCamera {
    pub(crate) fn new(url: &str) -> Result<Self, CameraError> {
        let mut camera = Self {
            url: url.to_string(),
            frame_limit: None,
            clamp_width: None,
            geometry: None,
            frame_count: 0,
            format_requests: 0,
            streaming: false,
        };

        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let parsed = value.parse::<u64>().map_err(|_| CameraError::DeviceOpen {
                device: url.to_string(),
                reason: format!("invalid value for '{}': '{}'", key, value),
            })?;
            match key {
                "frames" => camera.frame_limit = Some(parsed),
                "clamp" => {
                    camera.clamp_width = Some(u32::try_from(parsed).map_err(|_| {
                        CameraError::DeviceOpen {
                            device: url.to_string(),
                            reason: format!("clamp width {} out of range", parsed),
                        }
                    })?)
                }
                other => {
                    return Err(CameraError::DeviceOpen {
                        device: url.to_string(),
                        reason: format!("unknown stub parameter '{}'", other),
                    })
                }
            }
        }

        log::info!("synthetic camera {} ready", camera.url);
        Ok(camera)
    }

    /// Apply the requested geometry; returns the width the "device" reports.
    pub(crate) fn apply_format(&mut self, width: u32, height: u32) -> u32 {
        self.format_requests += 1;
        self.streaming = false;
        let reported = self.clamp_width.unwrap_or(width);
        self.geometry = Some((reported, height));
        reported
    }

    pub(crate) fn start_stream(&mut self) {
        self.streaming = true;
    }

    pub(crate) fn next_frame(&mut self) -> Result<CombinedFrame, CaptureError> {
        let (width, height) = self
            .geometry
            .filter(|_| self.streaming)
            .ok_or(CaptureError::NotConfigured)?;
        if self.frame_limit.is_some_and(|limit| self.frame_count >= limit) {
            return Ok(CombinedFrame::empty(width, PixelFormat::Gray8));
        }
        self.frame_count += 1;
        let pixels = self.generate_pixels(width, height);
        Ok(CombinedFrame::new(pixels, width, height, PixelFormat::Gray8)?)
    }

    /// Moving diagonal gradient, offset per view.
    fn generate_pixels(&self, width: u32, height: u32) -> Vec<u8> {
        let half = width / 2;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as u64 {
            for x in 0..width as u64 {
                let shade = ((x + y + self.frame_count) % 128) as u8;
                if x < half as u64 {
                    pixels.push(shade);
                } else {
                    pixels.push(128 + shade);
                }
            }
        }
        pixels
    }

    pub(crate) fn stats(&self) -> CameraStats {
        CameraStats {
            device: self.url.clone(),
            frames_captured: self.frame_count,
            format_requests: self.format_requests,
            streaming: self.streaming,
        }
    }
}
