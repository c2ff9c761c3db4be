//! Plain V4L2 capture, the generic fallback backend.

use std::time::Instant;

use tracing::{info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags as CapFlags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::MmapStream;
use v4l::video::capture::parameters::Parameters;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::capture::frame::{Frame, PixelFormat};
use crate::capture::{normalize, CaptureError, DeviceOpenError, FrameSource};
use crate::CaptureConfig;

const BUFFER_COUNT: u32 = 4;

/// What the driver agreed to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Mjpeg,
    Rgb24,
}

pub struct V4l2Source {
    device: Box<Device>,
    stream: Option<MmapStream<'static>>,
    format: SourceFormat,
    width: u32,
    height: u32,
}

impl V4l2Source {
    /// Open a capture device by index and start streaming.
    pub fn open(index: usize, config: &CaptureConfig) -> Result<Self, DeviceOpenError> {
        let path = format!("/dev/video{index}");
        info!(%path, "initializing V4L2 capture");

        let device = Device::new(index).map_err(|source| DeviceOpenError::Device {
            path: path.clone(),
            source,
        })?;

        let caps = device
            .query_caps()
            .map_err(|source| DeviceOpenError::Device {
                path: path.clone(),
                source,
            })?;
        info!("Device: {} ({})", caps.card, caps.driver);

        if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
            return Err(DeviceOpenError::NotACaptureDevice { path });
        }

        // Prefer MJPEG, accept raw RGB; anything else the driver insists on
        // is unusable downstream.
        let mut fmt = device.format().map_err(|source| DeviceOpenError::Device {
            path: path.clone(),
            source,
        })?;
        fmt.width = config.width;
        fmt.height = config.height;

        let mut format = SourceFormat::Mjpeg;
        fmt.fourcc = FourCC::new(b"MJPG");
        let mut actual = device.set_format(&fmt);
        if !matches!(&actual, Ok(f) if f.fourcc == fmt.fourcc) {
            fmt.fourcc = FourCC::new(b"RGB3");
            actual = device.set_format(&fmt);
            format = SourceFormat::Rgb24;
        }
        let actual = actual.map_err(|source| DeviceOpenError::Device {
            path: path.clone(),
            source,
        })?;
        if actual.fourcc != fmt.fourcc {
            return Err(DeviceOpenError::UnsupportedFormat {
                path,
                fourcc: String::from_utf8_lossy(&actual.fourcc.repr).into_owned(),
            });
        }

        // Frame interval is advisory; not every driver honors it.
        if let Err(e) = device.set_params(&Parameters::with_fps(config.fps)) {
            warn!("driver rejected frame rate {}: {}", config.fps, e);
        }

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|source| DeviceOpenError::Device {
                path: path.clone(),
                source,
            })?;
        info!(
            "capture stream started: {}x{} {:?}",
            actual.width, actual.height, format
        );

        Ok(Self {
            device: Box::new(device),
            stream: Some(stream),
            format,
            width: actual.width,
            height: actual.height,
        })
    }
}

impl FrameSource for V4l2Source {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let timestamp = Instant::now();

        let stream = self.stream.as_mut().ok_or(CaptureError::Closed)?;
        let (buf, meta) = stream.next()?;
        let used = (meta.bytesused as usize).min(buf.len());

        let (data, width, height) = match self.format {
            SourceFormat::Mjpeg => normalize::mjpeg_to_bgr(&buf[..used])?,
            SourceFormat::Rgb24 => {
                let expected = (self.width * self.height * 3) as usize;
                if used < expected {
                    return Err(CaptureError::Normalize(format!(
                        "short RGB frame: expected {expected}, got {used}"
                    )));
                }
                (
                    normalize::rgb_to_bgr(&buf[..expected], self.width, self.height)?,
                    self.width,
                    self.height,
                )
            }
        };

        Ok(Frame {
            data: data.into(),
            width,
            height,
            format: PixelFormat::Bgr24,
            timestamp,
        })
    }

    fn close(&mut self) {
        // Dropping the stream turns streaming off and unmaps the buffers;
        // the device handle goes with the source itself.
        if self.stream.take().is_some() {
            info!("V4L2 stream stopped");
        }
    }

    fn name(&self) -> &'static str {
        "v4l2"
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        self.close();
    }
}
