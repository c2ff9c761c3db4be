//! Per-frame processing: resize, decode, annotate.

use image::imageops::{self, FilterType};
use thiserror::Error;
use tracing::info;

use crate::capture::{BgrImage, Frame, PixelFormat};
use crate::draw;
use crate::scan::{Geometry, SymbolDecoder};

/// Vertical gap between a symbol's bounding box and its label baseline.
const LABEL_GAP: i32 = 10;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("frame arrived in {0:?}, expected BGR")]
    UnexpectedFormat(PixelFormat),
    #[error("frame buffer does not match its dimensions")]
    MalformedFrame,
    #[error("symbol payload is not valid UTF-8")]
    Payload(#[from] std::string::FromUtf8Error),
}

/// Resize one frame to `target`, run the decoder over it, and annotate every
/// decoded symbol with its outline and payload text.
///
/// Zero symbols is a normal, silent outcome; the resized frame comes back
/// untouched. A payload that is not valid UTF-8 propagates as an error.
pub fn process_frame(
    frame: &Frame,
    target: (u32, u32),
    decoder: &mut dyn SymbolDecoder,
) -> Result<BgrImage, ProcessError> {
    if frame.format != PixelFormat::Bgr24 {
        return Err(ProcessError::UnexpectedFormat(frame.format));
    }
    let image = BgrImage::from_raw(frame.width, frame.height, frame.data.to_vec())
        .ok_or(ProcessError::MalformedFrame)?;

    // Plain scaling, no aspect-ratio preservation.
    let mut resized = imageops::resize(&image, target.0, target.1, FilterType::Triangle);

    for symbol in decoder.detect(&resized) {
        let text = String::from_utf8(symbol.payload)?;
        info!("QR code detected: {text}");

        match symbol.geometry {
            Geometry::Polygon(points) => draw::polygon(&mut resized, &points, draw::HIGHLIGHT),
            Geometry::Rectangle(rect) => draw::rectangle(&mut resized, rect, draw::HIGHLIGHT),
        }

        let label_top = symbol.bounds.top - LABEL_GAP - 8 * draw::TEXT_SCALE;
        draw::text(
            &mut resized,
            &text,
            symbol.bounds.left,
            label_top,
            draw::HIGHLIGHT,
        );
    }

    Ok(resized)
}
