use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::VideoFrame;

/// A loaded, ready-to-run object detector.
///
/// Detections are returned in the backend's own order; callers render them in that
/// order and never sort.
pub trait Detector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame. Boxes are in pixel units of `frame`.
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, run once right after loading.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Source of pretrained detectors.
pub trait ModelLibrary {
    /// Human-readable description used in log lines.
    fn describe(&self) -> String;

    /// Load a detector instance. May be slow; may fail.
    fn load(&self) -> Result<Box<dyn Detector>>;
}
