use std::convert::Infallible;

use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{renderer::TextRenderer, Baseline, Text},
};
use image::{Rgba, RgbaImage};

use super::Surface;
use crate::detect::BBox;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// RGBA overlay image. Cleared pixels are fully transparent.
#[derive(Clone, Debug)]
pub struct OverlayCanvas {
    image: RgbaImage,
}

impl OverlayCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// True when no pixel has been drawn since the last clear.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    fn draw<D>(&mut self, drawable: &D)
    where
        D: Drawable<Color = Rgb888>,
    {
        match drawable.draw(&mut Target(&mut self.image)) {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

impl Default for OverlayCanvas {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

fn to_rectangle(rect: &BBox) -> Rectangle {
    Rectangle::new(
        Point::new(rect.x.round() as i32, rect.y.round() as i32),
        Size::new(
            rect.width.round().max(0.0) as u32,
            rect.height.round().max(0.0) as u32,
        ),
    )
}

impl Surface for OverlayCanvas {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::from_pixel(width, height, TRANSPARENT);
    }

    fn clear(&mut self) {
        self.image.pixels_mut().for_each(|p| *p = TRANSPARENT);
    }

    fn stroke_rect(&mut self, rect: &BBox, color: Rgb888, line_width: u32) {
        self.draw(&to_rectangle(rect).into_styled(PrimitiveStyle::with_stroke(color, line_width)));
    }

    fn fill_rect(&mut self, rect: &BBox, color: Rgb888) {
        self.draw(&to_rectangle(rect).into_styled(PrimitiveStyle::with_fill(color)));
    }

    fn measure_text(&self, text: &str) -> f32 {
        let style = MonoTextStyle::new(&FONT_10X20, Rgb888::new(0, 0, 0));
        style
            .measure_string(text, Point::zero(), Baseline::Alphabetic)
            .bounding_box
            .size
            .width as f32
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Rgb888) {
        let style = MonoTextStyle::new(&FONT_10X20, color);
        self.draw(&Text::with_baseline(
            text,
            Point::new(x.round() as i32, y.round() as i32),
            style,
            Baseline::Alphabetic,
        ));
    }

    fn overlay_image(&self) -> Option<&RgbaImage> {
        Some(&self.image)
    }
}

struct Target<'a>(&'a mut RgbaImage);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size {
                width: self.0.width(),
                height: self.0.height(),
            },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Rgb888;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.0.dimensions();
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && (point.x as u32) < width
                && point.y >= 0
                && (point.y as u32) < height
            {
                self.0.put_pixel(
                    point.x as u32,
                    point.y as u32,
                    Rgba([color.r(), color.g(), color.b(), 255]),
                );
            }
        }
        Ok(())
    }
}
