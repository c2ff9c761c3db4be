//! libcamera capture driven through GStreamer.
//!
//! This is the preferred backend: it talks to the modern camera stack via
//! the `libcamerasrc` element. Availability is probed once at startup; if
//! GStreamer itself or the element is missing, selection falls back to the
//! plain V4L2 backend.

use std::time::Instant;

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use tracing::{info, warn};

use crate::capture::frame::{Frame, PixelFormat};
use crate::capture::{normalize, BackendError, CaptureError, DeviceOpenError, FrameSource};
use crate::CaptureConfig;

pub struct GstSource {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    stopped: bool,
}

impl GstSource {
    /// Probe for the libcamera capability and bring the pipeline up.
    ///
    /// `BackendError::Unavailable` means the capability is absent and the
    /// caller should fall back; any failure past the probe is a device-open
    /// failure and is fatal.
    pub fn open(config: &CaptureConfig) -> Result<Self, BackendError> {
        gst::init()
            .map_err(|e| BackendError::Unavailable(format!("gstreamer init failed: {e}")))?;

        if gst::ElementFactory::find("libcamerasrc").is_none() {
            return Err(BackendError::Unavailable(
                "libcamerasrc element not found".into(),
            ));
        }

        info!("using libcamera via gstreamer");

        // The framerate cap bounds per-frame duration; videoconvert gives us
        // a stable RGB layout regardless of what the sensor produces.
        let pipeline_str = format!(
            "libcamerasrc ! \
             video/x-raw,width={},height={},framerate={}/1 ! \
             queue max-size-buffers=2 max-size-time=0 max-size-bytes=0 ! \
             videoconvert ! \
             video/x-raw,format=RGB ! \
             appsink name=appsink",
            config.width, config.height, config.fps
        );
        info!("Pipeline: {}", pipeline_str);

        let pipeline = gst::parse::launch(&pipeline_str)
            .map_err(|e| DeviceOpenError::Pipeline(e.to_string()))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| DeviceOpenError::Pipeline("failed to create pipeline".into()))?;

        let appsink = pipeline
            .by_name("appsink")
            .ok_or_else(|| DeviceOpenError::Pipeline("failed to find appsink element".into()))?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| DeviceOpenError::Pipeline("failed to cast to AppSink".into()))?;

        appsink.set_property("emit-signals", false);
        appsink.set_property("max-buffers", 3u32);
        appsink.set_property("drop", true); // Drop old buffers if we can't keep up
        appsink.set_property("sync", false); // Don't sync to clock for lowest latency

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| DeviceOpenError::Pipeline(format!("failed to start pipeline: {e:?}")))?;

        // Wait for the pipeline to reach the playing state
        let (state_change, _, _) = pipeline.state(Some(gst::ClockTime::from_seconds(5)));
        match state_change {
            Ok(gst::StateChangeSuccess::Success) => {
                info!("pipeline started successfully");
            }
            Ok(gst::StateChangeSuccess::Async) => {
                info!("pipeline starting asynchronously");
            }
            _ => {
                let _ = pipeline.set_state(gst::State::Null);
                return Err(DeviceOpenError::Pipeline("failed to start pipeline".into()).into());
            }
        }

        Ok(Self {
            pipeline,
            appsink,
            stopped: false,
        })
    }
}

impl FrameSource for GstSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let timestamp = Instant::now();

        // Pull sample from appsink (blocking)
        let sample = self
            .appsink
            .pull_sample()
            .map_err(|_| CaptureError::Pipeline("failed to pull sample from pipeline".into()))?;

        let buffer = sample
            .buffer()
            .ok_or_else(|| CaptureError::Pipeline("sample contains no buffer".into()))?;

        let map = buffer
            .map_readable()
            .map_err(|_| CaptureError::Pipeline("failed to map buffer".into()))?;

        let caps = sample
            .caps()
            .ok_or_else(|| CaptureError::Pipeline("sample has no caps".into()))?;
        let video_info = gst_video::VideoInfo::from_caps(caps)
            .map_err(|_| CaptureError::Pipeline("failed to parse video info from caps".into()))?;

        let width = video_info.width();
        let height = video_info.height();

        // Pipeline output is RGB; the processor expects BGR.
        let data = normalize::rgb_to_bgr(map.as_slice(), width, height)?;

        Ok(Frame {
            data: data.into(),
            width,
            height,
            format: PixelFormat::Bgr24,
            timestamp,
        })
    }

    fn close(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            warn!("failed to stop pipeline: {e:?}");
        }
    }

    fn name(&self) -> &'static str {
        "libcamera (gstreamer)"
    }
}

impl Drop for GstSource {
    fn drop(&mut self) {
        self.close();
    }
}
