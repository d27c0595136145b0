//! Stereo capture profiles.
//!
//! Side-by-side stereo cameras of this class only accept two capture modes.
//! The requested width selects the profile; the height is derived from it.
//! Selection happens before any device I/O so a bad width never touches
//! the camera.

use thiserror::Error;

/// Side-by-side 2x640x480.
pub const PROFILE_VGA: StereoProfile = StereoProfile {
    width: 1280,
    height: 480,
};

/// Side-by-side 2x1280x720.
pub const PROFILE_HD720: StereoProfile = StereoProfile {
    width: 2560,
    height: 720,
};

/// Every profile the camera firmware accepts.
pub const SUPPORTED_PROFILES: [StereoProfile; 2] = [PROFILE_VGA, PROFILE_HD720];

/// Requested width is not one of the supported stereo profiles.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("Not allowed resolution {width}, set it to 1280 or 2560")]
pub struct UnsupportedResolution {
    pub width: u32,
}

/// Combined (both lenses) capture geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StereoProfile {
    width: u32,
    height: u32,
}

impl StereoProfile {
    /// Select the profile for a requested combined width.
    pub fn for_width(width: u32) -> Result<Self, UnsupportedResolution> {
        SUPPORTED_PROFILES
            .iter()
            .copied()
            .find(|profile| profile.width == width)
            .ok_or(UnsupportedResolution { width })
    }

    /// Combined frame width (both views).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height, shared by both views.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width of a single view.
    pub fn view_width(&self) -> u32 {
        self.width / 2
    }
}
