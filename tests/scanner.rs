//! End-to-end pipeline tests with scripted collaborators, plus a decode of
//! a genuine QR symbol through the rqrr adapter.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::Rgb;

use qrscan::app::{run_loop, ExitReason};
use qrscan::capture::{BgrImage, CameraSession, CaptureError, Frame, FrameSource};
use qrscan::display::{DisplayError, DisplaySink};
use qrscan::draw;
use qrscan::scan::{Geometry, Point, RqrrDecoder, Symbol, SymbolDecoder};

const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);

struct StreamSource {
    closed: Arc<AtomicUsize>,
}

impl FrameSource for StreamSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        Ok(Frame::from_image(BgrImage::from_pixel(
            120, 90, BACKGROUND,
        )))
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "stream"
    }
}

/// Returns a HELLO symbol on exactly one frame of the stream.
struct ScriptedDecoder {
    calls: usize,
    hit_on: usize,
}

impl SymbolDecoder for ScriptedDecoder {
    fn detect(&mut self, _image: &BgrImage) -> Vec<Symbol> {
        self.calls += 1;
        if self.calls == self.hit_on {
            vec![Symbol::from_localization(
                b"HELLO".to_vec(),
                &[
                    Point { x: 10, y: 10 },
                    Point { x: 50, y: 10 },
                    Point { x: 50, y: 50 },
                    Point { x: 10, y: 50 },
                ],
            )]
        } else {
            vec![]
        }
    }
}

struct RecordingDisplay {
    frames: Arc<Mutex<Vec<BgrImage>>>,
    quit_after: usize,
    torn_down: Arc<AtomicUsize>,
}

impl DisplaySink for RecordingDisplay {
    fn show(&mut self, image: &BgrImage) -> Result<(), DisplayError> {
        self.frames.lock().unwrap().push(image.clone());
        Ok(())
    }

    fn poll_key(&mut self, _wait: Duration) -> Option<char> {
        if self.frames.lock().unwrap().len() >= self.quit_after {
            Some('q')
        } else {
            None
        }
    }

    fn teardown(&mut self) {
        self.torn_down.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn symbol_on_frame_five_is_annotated_and_shutdown_is_clean() {
    let closed = Arc::new(AtomicUsize::new(0));
    let torn_down = Arc::new(AtomicUsize::new(0));
    let frames = Arc::new(Mutex::new(Vec::new()));

    let mut session = CameraSession::from_source(Box::new(StreamSource {
        closed: closed.clone(),
    }));
    let mut display = RecordingDisplay {
        frames: frames.clone(),
        quit_after: 6,
        torn_down: torn_down.clone(),
    };
    let mut decoder = ScriptedDecoder { calls: 0, hit_on: 5 };

    let cancel = AtomicBool::new(false);
    let exit = run_loop(
        &mut session,
        &mut display,
        &mut decoder,
        (100, 100),
        &cancel,
    )
    .unwrap();
    assert_eq!(exit, ExitReason::Quit);

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 6);

    // The fifth frame carries the polygon stroke.
    let annotated = &frames[4];
    assert_eq!(annotated.dimensions(), (100, 100));
    for (x, y) in [(10, 10), (30, 10), (50, 30), (30, 50), (10, 30)] {
        assert_eq!(
            *annotated.get_pixel(x, y),
            draw::HIGHLIGHT,
            "polygon edge missing at ({x},{y})"
        );
    }
    assert_eq!(*annotated.get_pixel(70, 70), BACKGROUND);

    // Frames before and after stay clean away from the FPS readout.
    assert_eq!(*frames[3].get_pixel(30, 50), BACKGROUND);
    assert_eq!(*frames[5].get_pixel(30, 50), BACKGROUND);

    // One release each for the camera and the display.
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert_eq!(torn_down.load(Ordering::SeqCst), 1);
}

#[test]
fn every_shown_frame_carries_the_fps_readout() {
    let closed = Arc::new(AtomicUsize::new(0));
    let torn_down = Arc::new(AtomicUsize::new(0));
    let frames = Arc::new(Mutex::new(Vec::new()));

    let mut session = CameraSession::from_source(Box::new(StreamSource {
        closed: closed.clone(),
    }));
    let mut display = RecordingDisplay {
        frames: frames.clone(),
        quit_after: 2,
        torn_down: torn_down.clone(),
    };
    let mut decoder = ScriptedDecoder { calls: 0, hit_on: 0 };

    let cancel = AtomicBool::new(false);
    run_loop(
        &mut session,
        &mut display,
        &mut decoder,
        (100, 100),
        &cancel,
    )
    .unwrap();

    for frame in frames.lock().unwrap().iter() {
        let lit = frame.pixels().filter(|p| **p == draw::FPS_COLOR).count();
        assert!(lit > 0, "FPS readout missing");
    }
}

#[test]
fn rqrr_decodes_a_real_symbol() {
    let code = qrcode::QrCode::new(b"HELLO").unwrap();
    let size = code.width();
    let colors = code.to_colors();

    const MODULE: u32 = 8;
    const QUIET: u32 = 4;
    let dim = (size as u32 + 2 * QUIET) * MODULE;
    let mut image = BgrImage::from_pixel(dim, dim, Rgb([255, 255, 255]));
    for (i, color) in colors.iter().enumerate() {
        if matches!(color, qrcode::Color::Dark) {
            let mx = (i % size) as u32 + QUIET;
            let my = (i / size) as u32 + QUIET;
            for dy in 0..MODULE {
                for dx in 0..MODULE {
                    image.put_pixel(mx * MODULE + dx, my * MODULE + dy, Rgb([0, 0, 0]));
                }
            }
        }
    }

    let mut decoder = RqrrDecoder::new();
    let symbols = decoder.detect(&image);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].payload, b"HELLO");
    assert!(matches!(symbols[0].geometry, Geometry::Polygon(_)));
}
