//! Camera capture backends.
//!
//! Two interchangeable backends sit behind [`FrameSource`]: the libcamera
//! path driven through GStreamer (preferred, feature `libcamera-capture`)
//! and a plain V4L2 device (fallback). [`CameraSession::open`] probes the
//! preferred backend once at startup and falls back to `/dev/video0` when
//! the capability is absent from the environment.

pub mod frame;
#[cfg(feature = "libcamera-capture")]
pub mod gst;
pub mod normalize;
pub mod v4l2;

pub use frame::{BgrImage, Frame, PixelFormat};
pub use v4l2::V4l2Source;

use std::io;

use thiserror::Error;
use tracing::info;

use crate::CaptureConfig;

/// Device index the fallback backend addresses.
pub const FALLBACK_DEVICE_INDEX: usize = 0;

/// A started capture backend. `capture` blocks until the device produces a
/// frame; `close` is idempotent and releases the underlying hardware.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame, CaptureError>;
    fn close(&mut self);
    fn name(&self) -> &'static str;
}

/// Neither backend could be opened. Fatal at startup.
#[derive(Debug, Error)]
pub enum DeviceOpenError {
    #[error("failed to open camera device {path}: {source}")]
    Device { path: String, source: io::Error },
    #[error("device {path} does not support video capture")]
    NotACaptureDevice { path: String },
    #[error("device {path} negotiated an unusable pixel format {fourcc}")]
    UnsupportedFormat { path: String, fourcc: String },
    #[error("camera pipeline failed to start: {0}")]
    Pipeline(String),
}

/// A backend failed to produce a frame after its session started.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture session is closed")]
    Closed,
    #[error("device failed to produce a frame: {0}")]
    Device(#[from] io::Error),
    #[error("capture pipeline stalled: {0}")]
    Pipeline(String),
    #[error("frame decode failed: {0}")]
    Decode(String),
    #[error("frame normalization failed: {0}")]
    Normalize(String),
}

/// Outcome of probing the preferred backend. `Unavailable` means the
/// capability itself is missing from the environment and selection should
/// fall back; `Open` means the capability exists but the device could not be
/// brought up, which is fatal.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Open(#[from] DeviceOpenError),
}

/// The active capture backend, owned by the loop and released exactly once.
pub struct CameraSession {
    source: Option<Box<dyn FrameSource>>,
    backend: &'static str,
}

impl CameraSession {
    /// Select and start a capture backend: the libcamera path first, then
    /// V4L2 device 0 when the libcamera capability is absent. Returns an
    /// error only when no backend can be opened.
    pub fn open(config: &CaptureConfig) -> Result<Self, DeviceOpenError> {
        select_source(
            || probe_preferred(config),
            || {
                V4l2Source::open(FALLBACK_DEVICE_INDEX, config)
                    .map(|s| Box::new(s) as Box<dyn FrameSource>)
            },
        )
        .map(Self::from_source)
    }

    pub fn from_source(source: Box<dyn FrameSource>) -> Self {
        let backend = source.name();
        Self {
            source: Some(source),
            backend,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn capture(&mut self) -> Result<Frame, CaptureError> {
        self.source.as_mut().ok_or(CaptureError::Closed)?.capture()
    }

    /// Release the backend. Safe to call more than once; only the first call
    /// does anything.
    pub fn close(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
            info!(backend = self.backend, "camera stopped and resources released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(feature = "libcamera-capture")]
fn probe_preferred(config: &CaptureConfig) -> Result<Box<dyn FrameSource>, BackendError> {
    gst::GstSource::open(config).map(|s| Box::new(s) as Box<dyn FrameSource>)
}

#[cfg(not(feature = "libcamera-capture"))]
fn probe_preferred(_config: &CaptureConfig) -> Result<Box<dyn FrameSource>, BackendError> {
    Err(BackendError::Unavailable(
        "libcamera capture not compiled in".into(),
    ))
}

/// Backend selection policy. An unavailable preferred backend falls through
/// to the fallback with an informational notice; a preferred backend that
/// exists but fails to open is fatal.
fn select_source<P, F>(preferred: P, fallback: F) -> Result<Box<dyn FrameSource>, DeviceOpenError>
where
    P: FnOnce() -> Result<Box<dyn FrameSource>, BackendError>,
    F: FnOnce() -> Result<Box<dyn FrameSource>, DeviceOpenError>,
{
    match preferred() {
        Ok(source) => {
            info!(backend = source.name(), "camera backend selected");
            Ok(source)
        }
        Err(BackendError::Unavailable(reason)) => {
            info!(%reason, "preferred camera backend unavailable, falling back to V4L2 capture");
            let source = fallback()?;
            info!(backend = source.name(), "camera backend selected");
            Ok(source)
        }
        Err(BackendError::Open(err)) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeSource {
        name: &'static str,
        closed: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn boxed(name: &'static str, closed: Arc<AtomicUsize>) -> Box<dyn FrameSource> {
            Box::new(Self { name, closed })
        }
    }

    impl FrameSource for FakeSource {
        fn capture(&mut self) -> Result<Frame, CaptureError> {
            Ok(Frame::bgr(vec![0; 12], 2, 2))
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[test]
    fn preferred_backend_wins_when_available() {
        let closed = Arc::new(AtomicUsize::new(0));
        let source = select_source(
            || Ok(FakeSource::boxed("preferred", closed.clone())),
            || panic!("fallback should not be probed"),
        )
        .unwrap();
        assert_eq!(source.name(), "preferred");
    }

    #[test]
    fn unavailable_preferred_falls_back() {
        let closed = Arc::new(AtomicUsize::new(0));
        let source = select_source(
            || Err(BackendError::Unavailable("missing".into())),
            || Ok(FakeSource::boxed("fallback", closed.clone())),
        )
        .unwrap();
        assert_eq!(source.name(), "fallback");
    }

    #[test]
    fn preferred_open_failure_is_fatal() {
        let result = select_source(
            || {
                Err(BackendError::Open(DeviceOpenError::Pipeline(
                    "no stream".into(),
                )))
            },
            || panic!("fallback must not mask an open failure"),
        );
        assert!(matches!(result, Err(DeviceOpenError::Pipeline(_))));
    }

    #[test]
    fn both_backends_failing_is_fatal() {
        let result = select_source(
            || Err(BackendError::Unavailable("missing".into())),
            || {
                Err(DeviceOpenError::Device {
                    path: "/dev/video0".into(),
                    source: io::Error::new(io::ErrorKind::NotFound, "gone"),
                })
            },
        );
        assert!(matches!(result, Err(DeviceOpenError::Device { .. })));
    }

    #[test]
    fn session_closes_exactly_once() {
        let closed = Arc::new(AtomicUsize::new(0));
        let mut session = CameraSession::from_source(FakeSource::boxed("fake", closed.clone()));
        assert!(session.capture().is_ok());

        session.close();
        session.close();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(matches!(session.capture(), Err(CaptureError::Closed)));

        drop(session);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_an_open_session_releases_it() {
        let closed = Arc::new(AtomicUsize::new(0));
        {
            let _session = CameraSession::from_source(FakeSource::boxed("fake", closed.clone()));
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
