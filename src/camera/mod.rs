//! Camera access.
//!
//! A camera is opened through `CameraDevices` with a set of `StreamConstraints` and
//! yields a `CameraStream`. `CameraManager` owns at most one stream at a time and
//! releases it on stop or drop.
//!
//! Devices:
//! - `stub://<name>` synthetic camera (always available)
//! - `/dev/videoN` V4L2 devices (feature: camera-v4l2)

pub mod normalize;
mod synthetic;
#[cfg(feature = "camera-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Result};

use crate::config::{CameraSettings, FacingMode};
use crate::error::DemoError;
use crate::frame::{VideoDimensions, VideoFrame};

pub use synthetic::SyntheticCamera;
#[cfg(feature = "camera-v4l2")]
pub use v4l2::V4l2Camera;

/// What to ask the camera for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConstraints {
    pub device: String,
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl StreamConstraints {
    /// Video only, at the configured preferred resolution.
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            device: settings.device.clone(),
            facing: settings.facing,
            ideal_width: settings.ideal_width,
            ideal_height: settings.ideal_height,
            audio: false,
        }
    }
}

/// Something that can grant camera streams.
pub trait CameraDevices {
    /// Request access. Fails when access is denied or no hardware is present.
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>>;
}

/// A granted camera stream.
pub trait CameraStream {
    /// Block until the stream reports its native size.
    fn wait_for_dimensions(&mut self) -> Result<VideoDimensions>;

    /// The frame currently presented by the stream.
    fn current_frame(&mut self) -> Result<VideoFrame>;

    /// Stop every track. Further frames are an error.
    fn stop_tracks(&mut self);
}

/// Owns the session's camera stream.
pub struct CameraManager {
    devices: Box<dyn CameraDevices>,
    constraints: StreamConstraints,
    stream: Option<Box<dyn CameraStream>>,
    dimensions: Option<VideoDimensions>,
}

impl CameraManager {
    pub fn new(devices: Box<dyn CameraDevices>, constraints: StreamConstraints) -> Self {
        Self {
            devices,
            constraints,
            stream: None,
            dimensions: None,
        }
    }

    /// Acquire the stream and return its native dimensions.
    ///
    /// When a stream is already held its dimensions are returned and no second stream
    /// is opened. On failure no stream is held.
    pub fn start(&mut self) -> Result<VideoDimensions, DemoError> {
        if let (Some(_), Some(dimensions)) = (&self.stream, self.dimensions) {
            return Ok(dimensions);
        }

        let mut stream = self
            .devices
            .open(&self.constraints)
            .map_err(|err| {
                log::error!("camera access failed for {}: {:#}", self.constraints.device, err);
                DemoError::CameraAccess(err)
            })?;

        let dimensions = match stream.wait_for_dimensions() {
            Ok(dimensions) => dimensions,
            Err(err) => {
                stream.stop_tracks();
                log::error!("camera stream never reported dimensions: {:#}", err);
                return Err(DemoError::CameraAccess(err));
            }
        };

        log::info!(
            "camera {} started ({}x{})",
            self.constraints.device,
            dimensions.width,
            dimensions.height
        );
        self.stream = Some(stream);
        self.dimensions = Some(dimensions);
        Ok(dimensions)
    }

    /// Stop every track and drop the stream. Safe to call when nothing is held.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            log::info!("camera {} stopped", self.constraints.device);
        }
        self.dimensions = None;
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn dimensions(&self) -> Option<VideoDimensions> {
        self.dimensions
    }

    pub fn current_frame(&mut self) -> Result<VideoFrame> {
        self.stream
            .as_mut()
            .ok_or_else(|| anyhow!("camera is not started"))?
            .current_frame()
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pick the camera backend for a configured device.
pub fn devices_for(settings: &CameraSettings) -> Result<Box<dyn CameraDevices>> {
    if settings.device.starts_with("stub://") {
        return Ok(Box::new(SyntheticCamera::new()));
    }
    #[cfg(feature = "camera-v4l2")]
    {
        Ok(Box::new(V4l2Camera::new()))
    }
    #[cfg(not(feature = "camera-v4l2"))]
    {
        Err(anyhow!(
            "camera {} requires the camera-v4l2 feature",
            settings.device
        ))
    }
}
