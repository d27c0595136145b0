//! Combined side-by-side frames and their left/right views.
//!
//! - `CombinedFrame`: one capture buffer holding both lenses side by side.
//! - `StereoImage`: an owned single view cut out of a combined frame.
//! - `StereoPair`: the left and right views of one capture.
//!
//! Splitting always deep-copies both halves. The capture buffer is reused
//! by the device on the next dequeue, so no view may alias it.

use thiserror::Error;

/// Pixel layouts a combined frame can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit luma.
    Gray8,
    /// Packed 4:2:2, two pixels per `Y0 U Y1 V` macropixel.
    Yuyv,
    /// Packed 8-bit RGB.
    Rgb24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Yuyv => 2,
            PixelFormat::Rgb24 => 3,
        }
    }

    /// Column granularity a split point must respect.
    fn column_alignment(self) -> u32 {
        match self {
            PixelFormat::Yuyv => 2,
            PixelFormat::Gray8 | PixelFormat::Rgb24 => 1,
        }
    }
}

/// Malformed frame geometry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame dimensions {width}x{height} overflow")]
    Overflow { width: u32, height: u32 },
    #[error(
        "frame length mismatch for {width}x{height} {format:?}: expected {expected} bytes, got {actual}"
    )]
    LengthMismatch {
        width: u32,
        height: u32,
        format: PixelFormat,
        expected: usize,
        actual: usize,
    },
    #[error("frame width {width} cannot be split into two {format:?} views")]
    UnevenSplit { width: u32, format: PixelFormat },
}

pub(crate) fn expected_len(width: u32, height: u32, format: PixelFormat) -> Result<usize, FrameError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(format.bytes_per_pixel()))
        .ok_or(FrameError::Overflow { width, height })
}

// ----------------------------------------------------------------------------
// CombinedFrame
// ----------------------------------------------------------------------------

/// One capture from the side-by-side sensor.
///
/// Left view = columns `[0, width/2)`, right view = columns `[width/2, width)`.
/// A frame with zero rows is how a device reports disconnect or end of stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinedFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl CombinedFrame {
    /// Wrap a tightly packed buffer. The length must match the geometry.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self, FrameError> {
        let expected = expected_len(width, height, format)?;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                width,
                height,
                format,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Zero-row frame.
    pub fn empty(width: u32, format: PixelFormat) -> Self {
        Self {
            data: Vec::new(),
            width,
            height: 0,
            format,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row count; zero means the capture carried no image.
    pub fn rows(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Cut the frame into independently owned left and right views.
    pub fn split(&self) -> Result<StereoPair, FrameError> {
        let align = self.format.column_alignment() * 2;
        if self.width % align != 0 {
            return Err(FrameError::UnevenSplit {
                width: self.width,
                format: self.format,
            });
        }

        let bpp = self.format.bytes_per_pixel();
        let row_bytes = self.width as usize * bpp;
        let half_bytes = row_bytes / 2;
        let view_width = self.width / 2;
        let view_len = half_bytes * self.height as usize;

        let mut left = Vec::with_capacity(view_len);
        let mut right = Vec::with_capacity(view_len);
        if row_bytes > 0 {
            for row in self.data.chunks_exact(row_bytes) {
                let (l, r) = row.split_at(half_bytes);
                left.extend_from_slice(l);
                right.extend_from_slice(r);
            }
        }

        Ok(StereoPair {
            left: StereoImage {
                data: left,
                width: view_width,
                height: self.height,
                format: self.format,
            },
            right: StereoImage {
                data: right,
                width: view_width,
                height: self.height,
                format: self.format,
            },
        })
    }
}

// ----------------------------------------------------------------------------
// StereoImage / StereoPair
// ----------------------------------------------------------------------------

/// A single owned view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StereoImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl StereoImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = (y as usize * self.width as usize + x as usize) * bpp;
        self.data.get(start..start + bpp)
    }
}

/// Left and right views of one capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StereoPair {
    pub left: StereoImage,
    pub right: StereoImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT_MARK: u8 = 0x11;
    const RIGHT_MARK: u8 = 0xEE;

    /// Gray frame where every left-half pixel is `LEFT_MARK + row` and every
    /// right-half pixel is `RIGHT_MARK - row`.
    fn marked_frame(width: u32, height: u32) -> CombinedFrame {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                if x < width / 2 {
                    data.push(LEFT_MARK + y as u8);
                } else {
                    data.push(RIGHT_MARK - y as u8);
                }
            }
        }
        CombinedFrame::new(data, width, height, PixelFormat::Gray8).unwrap()
    }

    #[test]
    fn split_matches_source_regions_exactly() {
        let frame = marked_frame(16, 4);
        let pair = frame.split().unwrap();

        assert_eq!(pair.left.width(), 8);
        assert_eq!(pair.right.width(), 8);
        assert_eq!(pair.left.height(), 4);
        assert_eq!(pair.right.height(), 4);

        for y in 0..4 {
            for x in 0..8 {
                assert_eq!(pair.left.pixel(x, y), Some(&[LEFT_MARK + y as u8][..]));
                assert_eq!(pair.right.pixel(x, y), Some(&[RIGHT_MARK - y as u8][..]));
            }
        }
    }

    #[test]
    fn split_boundary_columns_are_not_shifted() {
        // Column index encoded in every pixel; catches off-by-one at W/2.
        let width = 10;
        let height = 3;
        let data: Vec<u8> = (0..height)
            .flat_map(|_| (0..width).map(|x| x as u8))
            .collect();
        let frame = CombinedFrame::new(data, width, height, PixelFormat::Gray8).unwrap();
        let pair = frame.split().unwrap();

        for y in 0..height {
            assert_eq!(pair.left.pixel(0, y), Some(&[0u8][..]));
            assert_eq!(pair.left.pixel(4, y), Some(&[4u8][..]));
            assert_eq!(pair.right.pixel(0, y), Some(&[5u8][..]));
            assert_eq!(pair.right.pixel(4, y), Some(&[9u8][..]));
        }
        assert_eq!(pair.left.pixel(5, 0), None);
    }

    #[test]
    fn split_rgb_keeps_whole_pixels() {
        // 2x1 RGB: left pixel (1,2,3), right pixel (4,5,6)
        let frame = CombinedFrame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, PixelFormat::Rgb24).unwrap();
        let pair = frame.split().unwrap();
        assert_eq!(pair.left.data(), &[1, 2, 3]);
        assert_eq!(pair.right.data(), &[4, 5, 6]);
    }

    #[test]
    fn split_views_do_not_alias_the_frame() {
        let frame = marked_frame(4, 2);
        let pair = frame.split().unwrap();
        drop(frame);
        assert_eq!(pair.left.data().len(), 4);
        assert_eq!(pair.right.data().len(), 4);
    }

    #[test]
    fn odd_width_cannot_be_split() {
        let frame = CombinedFrame::new(vec![0; 3], 3, 1, PixelFormat::Gray8).unwrap();
        assert_eq!(
            frame.split().unwrap_err(),
            FrameError::UnevenSplit {
                width: 3,
                format: PixelFormat::Gray8
            }
        );
    }

    #[test]
    fn yuyv_split_must_land_on_macropixel_boundary() {
        // 6 px wide: 3 px per view would cut a macropixel in half.
        let frame = CombinedFrame::new(vec![0; 12], 6, 1, PixelFormat::Yuyv).unwrap();
        assert!(frame.split().is_err());

        let frame = CombinedFrame::new(vec![0; 16], 8, 1, PixelFormat::Yuyv).unwrap();
        let pair = frame.split().unwrap();
        assert_eq!(pair.left.data().len(), 8);
    }

    #[test]
    fn new_validates_buffer_length() {
        let err = CombinedFrame::new(vec![0; 5], 2, 2, PixelFormat::Gray8).unwrap_err();
        assert!(matches!(
            err,
            FrameError::LengthMismatch {
                expected: 4,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn empty_frame_has_zero_rows() {
        let frame = CombinedFrame::empty(1280, PixelFormat::Gray8);
        assert_eq!(frame.rows(), 0);
        assert!(frame.is_empty());
        let pair = frame.split().unwrap();
        assert!(pair.left.data().is_empty());
    }
}
