//! Overlay drawing primitives on BGR frames.
//!
//! Stroke and label rendering for decoded symbols plus the FPS readout.
//! Everything clips at the image bounds.

use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as DrawRect;

use crate::capture::BgrImage;
use crate::scan::{Point, Rect};

/// Symbol highlight, green in BGR order.
pub const HIGHLIGHT: Rgb<u8> = Rgb([0, 255, 0]);
/// FPS readout, red in BGR order.
pub const FPS_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Stroke width used for symbol outlines.
pub const STROKE: i32 = 3;

const GLYPH_SIZE: i32 = 8;
/// Label glyphs are drawn at 2x, so 16px tall.
pub const TEXT_SCALE: i32 = 2;

/// Closed polyline through four corner points, in order.
pub fn polygon(image: &mut BgrImage, points: &[Point; 4], color: Rgb<u8>) {
    for i in 0..4 {
        let a = points[i];
        let b = points[(i + 1) % 4];
        thick_line(image, a, b, color);
    }
}

fn thick_line(image: &mut BgrImage, a: Point, b: Point, color: Rgb<u8>) {
    let half = STROKE / 2;
    for off in -half..=half {
        let off = off as f32;
        draw_line_segment_mut(
            image,
            (a.x as f32 + off, a.y as f32),
            (b.x as f32 + off, b.y as f32),
            color,
        );
        draw_line_segment_mut(
            image,
            (a.x as f32, a.y as f32 + off),
            (b.x as f32, b.y as f32 + off),
            color,
        );
    }
}

/// Hollow rectangle spanning (left, top) to (left + width, top + height)
/// inclusive.
pub fn rectangle(image: &mut BgrImage, rect: Rect, color: Rgb<u8>) {
    for inset in 0..STROKE {
        let w = (rect.width as i64 + 1) - 2 * inset as i64;
        let h = (rect.height as i64 + 1) - 2 * inset as i64;
        if w <= 0 || h <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            image,
            DrawRect::at(rect.left + inset, rect.top + inset).of_size(w as u32, h as u32),
            color,
        );
    }
}

/// Bitmap text with its top-left corner at (x, y). Characters outside basic
/// ASCII render as '?'.
pub fn text(image: &mut BgrImage, s: &str, x: i32, y: i32, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let mut pen_x = x;

    for ch in s.chars() {
        let glyph = font8x8::legacy::BASIC_LEGACY
            .get(ch as usize)
            .copied()
            .unwrap_or(font8x8::legacy::BASIC_LEGACY[b'?' as usize]);

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for sy in 0..TEXT_SCALE {
                    for sx in 0..TEXT_SCALE {
                        let px = pen_x + col as i32 * TEXT_SCALE + sx;
                        let py = y + row as i32 * TEXT_SCALE + sy;
                        if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                            image.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
        pen_x += GLYPH_SIZE * TEXT_SCALE;
    }
}
