pub mod sdl2;

pub use self::sdl2::Sdl2Display;

use std::time::Duration;

use thiserror::Error;

use crate::capture::BgrImage;

pub const WINDOW_TITLE: &str = "QR Code Scanner";

#[derive(Debug, Error)]
#[error("display failure: {0}")]
pub struct DisplayError(pub String);

/// Where annotated frames go, and where the quit key comes from.
///
/// `poll_key` waits at most `wait` for input and doubles as the loop's
/// frame-to-frame pacing. `teardown` is idempotent.
pub trait DisplaySink {
    fn show(&mut self, image: &BgrImage) -> Result<(), DisplayError>;
    fn poll_key(&mut self, wait: Duration) -> Option<char>;
    fn teardown(&mut self);
}
