use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
use std::path::Path;

use crate::frame::VideoFrame;

/// Blend the overlay over the video frame.
pub fn compose_snapshot(frame: &VideoFrame, overlay: &RgbaImage) -> Result<RgbImage> {
    let mut composed = frame.to_rgb_image()?;
    if overlay.dimensions() != composed.dimensions() {
        return Err(anyhow!(
            "overlay is {}x{} but frame is {}x{}",
            overlay.width(),
            overlay.height(),
            composed.width(),
            composed.height()
        ));
    }

    for (dst, src) in composed.pixels_mut().zip(overlay.pixels()) {
        let alpha = src.0[3] as u32;
        if alpha == 0 {
            continue;
        }
        let blend = |under: u8, over: u8| {
            ((over as u32 * alpha + under as u32 * (255 - alpha) + 127) / 255) as u8
        };
        *dst = Rgb([
            blend(dst.0[0], src.0[0]),
            blend(dst.0[1], src.0[1]),
            blend(dst.0[2], src.0[2]),
        ]);
    }
    Ok(composed)
}

/// Write the composed frame as a JPEG.
pub fn write_snapshot(path: &Path, frame: &VideoFrame, overlay: &RgbaImage) -> Result<()> {
    let composed = compose_snapshot(frame, overlay)?;
    composed
        .save_with_format(path, ImageFormat::Jpeg)
        .with_context(|| format!("write snapshot {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn opaque_overlay_wins_and_transparent_keeps_video() -> Result<()> {
        let frame = VideoFrame::from_rgb(vec![100u8; 2 * 1 * 3], 2, 1, 1)?;
        let mut overlay = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        overlay.put_pixel(1, 0, Rgba([0, 255, 0, 255]));

        let composed = compose_snapshot(&frame, &overlay)?;
        assert_eq!(composed.get_pixel(0, 0).0, [100, 100, 100]);
        assert_eq!(composed.get_pixel(1, 0).0, [0, 255, 0]);
        Ok(())
    }

    #[test]
    fn size_mismatch_is_an_error() -> Result<()> {
        let frame = VideoFrame::from_rgb(vec![0u8; 12], 2, 2, 1)?;
        assert!(compose_snapshot(&frame, &RgbaImage::new(3, 3)).is_err());
        Ok(())
    }

    #[test]
    fn writes_jpeg() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("snap.jpg");
        let frame = VideoFrame::from_rgb(vec![50u8; 4 * 4 * 3], 4, 4, 1)?;
        write_snapshot(&path, &frame, &RgbaImage::new(4, 4))?;
        let decoded = image::open(&path)?;
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
        Ok(())
    }
}
