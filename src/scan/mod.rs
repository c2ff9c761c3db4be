//! Decoded-symbol model and the decoder seam.

pub mod rqrr;

pub use self::rqrr::RqrrDecoder;

use crate::capture::BgrImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Axis-aligned bounding box: left/top corner plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// How a symbol was localized in the frame.
///
/// Exactly four corner points give a (possibly skewed) quadrilateral; any
/// other point count degrades to the axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Polygon([Point; 4]),
    Rectangle(Rect),
}

/// One decoded symbol. Payload bytes are handed out raw; interpreting them
/// as text is the processor's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub payload: Vec<u8>,
    pub geometry: Geometry,
    pub bounds: Rect,
}

impl Symbol {
    /// Build a symbol from a decoder's localization points.
    pub fn from_localization(payload: Vec<u8>, corners: &[Point]) -> Self {
        let bounds = bounding_rect(corners);
        let geometry = match corners {
            [a, b, c, d] => Geometry::Polygon([*a, *b, *c, *d]),
            _ => Geometry::Rectangle(bounds),
        };
        Self {
            payload,
            geometry,
            bounds,
        }
    }
}

fn bounding_rect(corners: &[Point]) -> Rect {
    let Some(first) = corners.first() else {
        return Rect {
            left: 0,
            top: 0,
            width: 0,
            height: 0,
        };
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &corners[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Rect {
        left: min_x,
        top: min_y,
        width: (max_x - min_x) as u32,
        height: (max_y - min_y) as u32,
    }
}

/// External symbol-recognition engine. One call per frame; zero results is a
/// perfectly normal outcome.
pub trait SymbolDecoder {
    fn detect(&mut self, image: &BgrImage) -> Vec<Symbol>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i32, y: i32) -> Point {
        Point { x, y }
    }

    #[test]
    fn four_corners_classify_as_polygon() {
        let corners = [pt(10, 10), pt(50, 10), pt(50, 50), pt(10, 50)];
        let symbol = Symbol::from_localization(b"abc".to_vec(), &corners);
        assert_eq!(symbol.geometry, Geometry::Polygon(corners));
        assert_eq!(
            symbol.bounds,
            Rect {
                left: 10,
                top: 10,
                width: 40,
                height: 40
            }
        );
    }

    #[test]
    fn other_point_counts_degrade_to_rectangle() {
        for corners in [
            vec![pt(4, 8), pt(20, 6), pt(12, 30)],
            vec![pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10), pt(5, 5)],
        ] {
            let symbol = Symbol::from_localization(vec![], &corners);
            assert_eq!(symbol.geometry, Geometry::Rectangle(symbol.bounds));
        }
    }

    #[test]
    fn three_point_bounds_are_exact() {
        let symbol = Symbol::from_localization(vec![], &[pt(4, 8), pt(20, 6), pt(12, 30)]);
        assert_eq!(
            symbol.bounds,
            Rect {
                left: 4,
                top: 6,
                width: 16,
                height: 24
            }
        );
    }

    #[test]
    fn no_corners_yield_an_empty_rect() {
        let symbol = Symbol::from_localization(vec![], &[]);
        assert_eq!(
            symbol.bounds,
            Rect {
                left: 0,
                top: 0,
                width: 0,
                height: 0
            }
        );
        assert_eq!(symbol.geometry, Geometry::Rectangle(symbol.bounds));
    }
}
