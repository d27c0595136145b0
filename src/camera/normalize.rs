use crate::frame::{expected_len, FrameError, PixelFormat};

/// Convert a captured buffer into a layout trackers consume directly.
///
/// YUYV is reduced to its luma plane; gray and RGB pass through after a
/// length check.
pub(crate) fn normalize_frame(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<(Vec<u8>, PixelFormat), FrameError> {
    let expected = expected_len(width, height, format)?;
    if pixels.len() != expected {
        return Err(FrameError::LengthMismatch {
            width,
            height,
            format,
            expected,
            actual: pixels.len(),
        });
    }
    match format {
        PixelFormat::Yuyv => Ok((yuyv_luma(pixels), PixelFormat::Gray8)),
        PixelFormat::Gray8 | PixelFormat::Rgb24 => Ok((pixels.to_vec(), format)),
    }
}

/// Y bytes of a packed `Y0 U Y1 V` stream.
fn yuyv_luma(pixels: &[u8]) -> Vec<u8> {
    pixels.iter().step_by(2).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuyv_conversion_keeps_luma() {
        // 4x1: Y0 U Y1 V Y2 U Y3 V
        let yuyv = [10u8, 128, 20, 128, 30, 64, 40, 192];
        let (gray, format) = normalize_frame(&yuyv, 4, 1, PixelFormat::Yuyv).unwrap();
        assert_eq!(format, PixelFormat::Gray8);
        assert_eq!(gray, vec![10, 20, 30, 40]);
    }

    #[test]
    fn gray_pass_through_validates_length() {
        let pixels = vec![1u8; 6];
        let (out, format) = normalize_frame(&pixels, 3, 2, PixelFormat::Gray8).unwrap();
        assert_eq!(out, pixels);
        assert_eq!(format, PixelFormat::Gray8);

        assert!(normalize_frame(&pixels, 4, 2, PixelFormat::Gray8).is_err());
    }
}
