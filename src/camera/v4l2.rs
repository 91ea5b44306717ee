//! V4L2 camera devices.
//!
//! Opens a local device node (e.g. /dev/video0), negotiates a capture format close to
//! the preferred size and converts each captured buffer to RGB24.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::normalize::{normalize_to_rgb, PixelFormat};
use super::{CameraDevices, CameraStream, StreamConstraints};
use crate::frame::{VideoDimensions, VideoFrame};

const BUFFER_COUNT: u32 = 4;

/// Grants streams from V4L2 device nodes.
#[derive(Debug, Default)]
pub struct V4l2Camera;

impl V4l2Camera {
    pub fn new() -> Self {
        Self
    }
}

impl CameraDevices for V4l2Camera {
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>> {
        Ok(Box::new(V4l2Stream::open(constraints)?))
    }
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

struct V4l2Stream {
    path: String,
    state: Option<V4l2State>,
    format: PixelFormat,
    dimensions: VideoDimensions,
    sequence: u64,
}

impl V4l2Stream {
    fn open(constraints: &StreamConstraints) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let path = constraints.device.clone();
        let device =
            v4l::Device::with_path(&path).with_context(|| format!("open v4l2 device {}", path))?;
        let mut requested = device.format().context("read v4l2 format")?;
        requested.width = constraints.ideal_width;
        requested.height = constraints.ideal_height;
        requested.fourcc = v4l::FourCC::new(b"RGB3");

        let negotiated = match device.set_format(&requested) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("camera {}: failed to set format: {}", path, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        let format = PixelFormat::from_fourcc(&negotiated.fourcc.repr).ok_or_else(|| {
            anyhow!(
                "camera {} offers unsupported pixel format {}",
                path,
                negotiated.fourcc
            )
        })?;
        if (negotiated.width, negotiated.height)
            != (constraints.ideal_width, constraints.ideal_height)
        {
            log::warn!(
                "camera {}: requested {}x{}, device chose {}x{}",
                path,
                constraints.ideal_width,
                constraints.ideal_height,
                negotiated.width,
                negotiated.height
            );
        }
        log::debug!(
            "camera {}: {:?}-facing requested, v4l2 ignores facing",
            path,
            constraints.facing
        );

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, BUFFER_COUNT)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "camera {}: connected ({}x{} {})",
            path,
            negotiated.width,
            negotiated.height,
            negotiated.fourcc
        );
        Ok(Self {
            path,
            state: Some(state),
            format,
            dimensions: VideoDimensions::new(negotiated.width, negotiated.height),
            sequence: 0,
        })
    }
}

impl CameraStream for V4l2Stream {
    fn wait_for_dimensions(&mut self) -> Result<VideoDimensions> {
        Ok(self.dimensions)
    }

    fn current_frame(&mut self) -> Result<VideoFrame> {
        use v4l::io::traits::CaptureStream;

        let state = self
            .state
            .as_mut()
            .ok_or_else(|| anyhow!("camera {} tracks were stopped", self.path))?;
        let raw = state.with_mut(|fields| -> Result<Vec<u8>> {
            let (buf, meta) = fields.stream.next().context("capture v4l2 frame")?;
            let used = (meta.bytesused as usize).min(buf.len());
            let used = if used == 0 { buf.len() } else { used };
            Ok(buf[..used].to_vec())
        })?;

        let VideoDimensions { width, height } = self.dimensions;
        let rgb = normalize_to_rgb(&raw, width, height, self.format)?;
        self.sequence += 1;
        VideoFrame::from_rgb(rgb, width, height, self.sequence)
    }

    fn stop_tracks(&mut self) {
        if self.state.take().is_some() {
            log::debug!("camera {}: stream closed after {} frames", self.path, self.sequence);
        }
    }
}
