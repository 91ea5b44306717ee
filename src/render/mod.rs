//! Overlay rendering: boxes and labels drawn over the video feed.

mod canvas;
mod renderer;
mod snapshot;

pub use canvas::OverlayCanvas;
pub use renderer::{draw_detections, label_text, BOX_COLOR, LABEL_TEXT_COLOR};
pub use snapshot::{compose_snapshot, write_snapshot};

use embedded_graphics::pixelcolor::Rgb888;
use image::RgbaImage;

use crate::detect::BBox;

/// A 2D drawing surface sized to the video stream.
///
/// Coordinates are pixels from the top-left corner and may fall outside the surface;
/// pixels outside are not drawn.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resize and clear.
    fn resize(&mut self, width: u32, height: u32);

    /// Make every pixel transparent.
    fn clear(&mut self);

    /// Stroke the rectangle outline, centered on its edges.
    fn stroke_rect(&mut self, rect: &BBox, color: Rgb888, line_width: u32);

    fn fill_rect(&mut self, rect: &BBox, color: Rgb888);

    /// Advance width of `text` in the label font.
    fn measure_text(&self, text: &str) -> f32;

    /// Draw `text` with its alphabetic baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Rgb888);

    /// Rasterised overlay, when the surface keeps one.
    fn overlay_image(&self) -> Option<&RgbaImage> {
        None
    }
}
