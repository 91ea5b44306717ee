//! Video frames handed from the camera to the detector and renderer.
//!
//! Frames are tightly packed RGB24. They are produced fresh for every loop iteration and
//! dropped once the iteration has rendered (or discarded) its results.

use anyhow::{anyhow, Result};
use image::RgbImage;
use std::time::Instant;

/// Native dimensions reported by a camera stream once its metadata is available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Byte length of one RGB24 frame with these dimensions.
    pub fn rgb_len(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))
    }
}

/// One captured video frame.
pub struct VideoFrame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Per-stream sequence number, starting at 1.
    pub sequence: u64,
    pub captured_at: Instant,
}

impl VideoFrame {
    /// Wrap RGB24 pixels. Fails when the buffer length does not match the dimensions.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = VideoDimensions::new(width, height).rgb_len()?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            sequence,
            captured_at: Instant::now(),
        })
    }

    pub fn dimensions(&self) -> VideoDimensions {
        VideoDimensions::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Copy the frame into an `image` buffer.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", self.width, self.height))
    }
}
