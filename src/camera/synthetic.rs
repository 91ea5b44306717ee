use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{CameraDevices, CameraStream, StreamConstraints};
use crate::frame::{VideoDimensions, VideoFrame};

/// Synthetic camera for `stub://` devices.
///
/// Grants a moving gradient at the preferred resolution. `stub://denied` refuses
/// access and `stub://absent` reports no hardware. Clones share their counters so a
/// test can keep a handle after giving the camera to a `CameraManager`.
#[derive(Clone, Debug, Default)]
pub struct SyntheticCamera {
    open: Arc<AtomicUsize>,
    grants: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams granted and not yet stopped.
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Total successful `open` calls.
    pub fn grants(&self) -> usize {
        self.grants.load(Ordering::SeqCst)
    }
}

impl CameraDevices for SyntheticCamera {
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>> {
        let name = constraints
            .device
            .strip_prefix("stub://")
            .unwrap_or(&constraints.device);
        match name {
            "denied" => return Err(anyhow!("permission to use the camera was denied")),
            "absent" => return Err(anyhow!("no camera device found")),
            _ => {}
        }
        if constraints.ideal_width == 0 || constraints.ideal_height == 0 {
            return Err(anyhow!("requested camera size must be non-zero"));
        }

        self.open.fetch_add(1, Ordering::SeqCst);
        self.grants.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "camera {}: granted synthetic stream ({:?}-facing)",
            constraints.device,
            constraints.facing
        );
        Ok(Box::new(SyntheticStream {
            dimensions: VideoDimensions::new(constraints.ideal_width, constraints.ideal_height),
            sequence: 0,
            open: Some(Arc::clone(&self.open)),
        }))
    }
}

struct SyntheticStream {
    dimensions: VideoDimensions,
    sequence: u64,
    /// Present while the tracks are live.
    open: Option<Arc<AtomicUsize>>,
}

impl SyntheticStream {
    fn gradient(&self) -> Result<Vec<u8>> {
        let VideoDimensions { width, height } = self.dimensions;
        let mut pixels = Vec::with_capacity(self.dimensions.rgb_len()?);
        let shift = self.sequence as u32;
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x + shift) * 255 / width.max(1)) as u8);
                pixels.push((y * 255 / height.max(1)) as u8);
                pixels.push((shift % 256) as u8);
            }
        }
        Ok(pixels)
    }
}

impl CameraStream for SyntheticStream {
    fn wait_for_dimensions(&mut self) -> Result<VideoDimensions> {
        Ok(self.dimensions)
    }

    fn current_frame(&mut self) -> Result<VideoFrame> {
        if self.open.is_none() {
            return Err(anyhow!("camera tracks were stopped"));
        }
        self.sequence += 1;
        let VideoDimensions { width, height } = self.dimensions;
        VideoFrame::from_rgb(self.gradient()?, width, height, self.sequence)
    }

    fn stop_tracks(&mut self) {
        if let Some(open) = self.open.take() {
            open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FacingMode;

    fn constraints(device: &str) -> StreamConstraints {
        StreamConstraints {
            device: device.to_string(),
            facing: FacingMode::User,
            ideal_width: 8,
            ideal_height: 4,
            audio: false,
        }
    }

    #[test]
    fn frames_advance_and_stop() -> Result<()> {
        let mut camera = SyntheticCamera::new();
        let mut stream = camera.open(&constraints("stub://cam"))?;
        let first = stream.current_frame()?;
        let second = stream.current_frame()?;
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_ne!(first.pixels(), second.pixels());

        stream.stop_tracks();
        assert!(stream.current_frame().is_err());
        assert_eq!(camera.open_streams(), 0);
        Ok(())
    }

    #[test]
    fn absent_hardware_is_reported() {
        let mut camera = SyntheticCamera::new();
        let err = camera.open(&constraints("stub://absent")).err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("no camera device found"));
        assert_eq!(camera.grants(), 0);
    }
}
