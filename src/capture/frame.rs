use bytes::Bytes;
use image::{ImageBuffer, Rgb};
use std::time::Instant;

/// Packed 8-bit 3-channel image buffer.
///
/// The container is `Rgb<u8>` but the byte order throughout the pipeline is
/// BGR, matching what the decoder and drawing routines expect. The display
/// uploads it as a BGR24 texture.
pub type BgrImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// One captured video frame. Owned by the loop iteration that produced it.
#[derive(Clone)]
pub struct Frame {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Capture timestamp for latency tracking
    pub timestamp: Instant,
}

/// Pixel formats that show up between a backend and the processor.
/// Backends normalize everything to `Bgr24` before handing frames out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgr24,
    Rgb24,
    Mjpeg,
}

impl Frame {
    /// Wrap a BGR buffer produced by a backend.
    pub fn bgr(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data: Bytes::from(data),
            width,
            height,
            format: PixelFormat::Bgr24,
            timestamp: Instant::now(),
        }
    }

    pub fn from_image(image: BgrImage) -> Self {
        let (width, height) = image.dimensions();
        Self::bgr(image.into_raw(), width, height)
    }
}
