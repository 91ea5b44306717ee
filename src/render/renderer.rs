use embedded_graphics::pixelcolor::Rgb888;

use super::Surface;
use crate::detect::{BBox, Detection};

pub const BOX_COLOR: Rgb888 = Rgb888::new(0x00, 0xff, 0x00);
pub const LABEL_TEXT_COLOR: Rgb888 = Rgb888::new(0x00, 0x00, 0x00);

const BOX_LINE_WIDTH: u32 = 3;
const LABEL_HEIGHT: f32 = 30.0;
const LABEL_PADDING: f32 = 10.0;
const LABEL_TEXT_INSET: f32 = 5.0;
const LABEL_BASELINE_OFFSET: f32 = 10.0;

/// `<class> (<percent>%)`
pub fn label_text(detection: &Detection) -> String {
    format!("{} ({}%)", detection.class, detection.percent())
}

/// Draw every detection in model order: box outline, label background, label text.
///
/// The label sits on top of the box and is not moved back inside the surface.
pub fn draw_detections<S: Surface + ?Sized>(surface: &mut S, detections: &[Detection]) {
    for detection in detections {
        let BBox { x, y, .. } = detection.bbox;
        surface.stroke_rect(&detection.bbox, BOX_COLOR, BOX_LINE_WIDTH);

        let label = label_text(detection);
        let text_width = surface.measure_text(&label);
        surface.fill_rect(
            &BBox::new(x, y - LABEL_HEIGHT, text_width + LABEL_PADDING, LABEL_HEIGHT),
            BOX_COLOR,
        );
        surface.fill_text(
            &label,
            x + LABEL_TEXT_INSET,
            y - LABEL_BASELINE_OFFSET,
            LABEL_TEXT_COLOR,
        );
    }
}
