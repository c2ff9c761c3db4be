//! QR detection and decoding via the `rqrr` engine.

use tracing::debug;

use crate::capture::BgrImage;
use crate::scan::{Point, Symbol, SymbolDecoder};

#[derive(Debug, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolDecoder for RqrrDecoder {
    fn detect(&mut self, image: &BgrImage) -> Vec<Symbol> {
        let (width, height) = image.dimensions();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                let [b, g, r] = image.get_pixel(x as u32, y as u32).0;
                // BT.601 luma, BGR byte order
                ((299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)) / 1000) as u8
            });

        let grids = prepared.detect_grids();
        let mut symbols = Vec::with_capacity(grids.len());
        for grid in grids {
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(_meta) => {
                    let corners: Vec<Point> = grid
                        .bounds
                        .iter()
                        .map(|p| Point { x: p.x, y: p.y })
                        .collect();
                    symbols.push(Symbol::from_localization(payload, &corners));
                }
                // A located grid that fails to decode is not a symbol;
                // skip it and keep the rest of the frame's results.
                Err(err) => debug!("detected grid failed to decode: {err}"),
            }
        }
        symbols
    }
}
