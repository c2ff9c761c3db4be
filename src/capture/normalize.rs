//! Pixel-layout normalization for capture backends.
//!
//! The processor and display assume BGR byte order; backends that emit RGB
//! (or compressed MJPEG) run their frames through here before handing them
//! out.

use jpeg_decoder::Decoder;

use crate::capture::CaptureError;

/// Swap an RGB24 buffer into BGR24. Validates the buffer length against the
/// claimed dimensions.
pub fn rgb_to_bgr(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let expected = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| CaptureError::Normalize("frame dimensions overflow".into()))?
        as usize;
    if pixels.len() != expected {
        return Err(CaptureError::Normalize(format!(
            "RGB frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        )));
    }

    let mut bgr = pixels.to_vec();
    for px in bgr.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    Ok(bgr)
}

/// Decode an MJPEG frame and normalize it to BGR24. Returns the decoded
/// dimensions, which may differ from what was requested of the driver.
pub fn mjpeg_to_bgr(data: &[u8]) -> Result<(Vec<u8>, u32, u32), CaptureError> {
    let mut decoder = Decoder::new(data);
    let pixels = decoder
        .decode()
        .map_err(|e| CaptureError::Decode(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| CaptureError::Decode("jpeg stream carried no image info".into()))?;
    if info.pixel_format != jpeg_decoder::PixelFormat::RGB24 {
        return Err(CaptureError::Decode(format!(
            "unsupported jpeg pixel format: {:?}",
            info.pixel_format
        )));
    }

    let width = u32::from(info.width);
    let height = u32::from(info.height);
    let bgr = rgb_to_bgr(&pixels, width, height)?;
    Ok((bgr, width, height))
}
