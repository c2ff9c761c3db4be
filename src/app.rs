//! The capture → process → display loop.
//!
//! Runs until the quit key, an interrupt, or a capture failure; every exit
//! path funnels through the same stopping sequence so the camera and the
//! display are both released exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::capture::CameraSession;
use crate::display::{DisplayError, DisplaySink};
use crate::draw;
use crate::fps::FpsCounter;
use crate::process::{process_frame, ProcessError};
use crate::scan::SymbolDecoder;

/// Bounded wait on the key poll; this is also the loop's pacing mechanism.
const KEY_POLL_WAIT: Duration = Duration::from_millis(1);
const QUIT_KEY: char = 'q';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Quit key pressed (or window closed).
    Quit,
    /// External interrupt signal observed.
    Interrupted,
    /// The backend stopped producing frames.
    CaptureFailed,
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Drive the loop to completion, then release the camera and the display.
/// Cleanup runs on every exit path, including fatal processing errors; the
/// two release steps are isolated so one failing cannot skip the other.
pub fn run_loop(
    session: &mut CameraSession,
    display: &mut dyn DisplaySink,
    decoder: &mut dyn SymbolDecoder,
    target: (u32, u32),
    cancel: &AtomicBool,
) -> Result<ExitReason, LoopError> {
    let result = drive(session, display, decoder, target, cancel);
    session.close();
    display.teardown();
    result
}

fn drive(
    session: &mut CameraSession,
    display: &mut dyn DisplaySink,
    decoder: &mut dyn SymbolDecoder,
    target: (u32, u32),
    cancel: &AtomicBool,
) -> Result<ExitReason, LoopError> {
    let mut fps = FpsCounter::default();

    loop {
        if cancel.load(Ordering::Relaxed) {
            info!("interrupted, shutting down");
            return Ok(ExitReason::Interrupted);
        }

        let frame = match session.capture() {
            Ok(frame) => frame,
            Err(err) => {
                warn!("failed to grab frame: {err}");
                return Ok(ExitReason::CaptureFailed);
            }
        };

        let mut annotated = process_frame(&frame, target, decoder)?;

        let estimate = fps.tick();
        draw::text(
            &mut annotated,
            &format!("FPS: {estimate:.1}"),
            10,
            14,
            draw::FPS_COLOR,
        );

        display.show(&annotated)?;

        if display.poll_key(KEY_POLL_WAIT) == Some(QUIT_KEY) {
            info!("quit requested");
            return Ok(ExitReason::Quit);
        }
    }
}
