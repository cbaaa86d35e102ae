//! Image encoders for rendered snapshots.

use crate::rasterizer::{RenderError, RenderResult};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage, RgbaImage};

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG header: {e}")))?;
        writer
            .write_image_data(rgba_data)
            .map_err(|e| RenderError::Encode(format!("PNG data: {e}")))?;
        writer
            .finish()
            .map_err(|e| RenderError::Encode(format!("PNG finish: {e}")))?;
    }
    Ok(png_data)
}

/// Encode RGBA pixel data to JPEG bytes. Alpha is dropped.
pub fn encode_jpeg(
    rgba_data: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> RenderResult<Vec<u8>> {
    let rgba = RgbaImage::from_raw(width, height, rgba_data.to_vec())
        .ok_or_else(|| RenderError::Encode("pixel buffer does not match size".to_string()))?;
    let rgb: RgbImage = DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut jpeg_data = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_data, quality)
        .encode_image(&rgb)
        .map_err(|e| RenderError::Encode(format!("JPEG: {e}")))?;
    Ok(jpeg_data)
}
