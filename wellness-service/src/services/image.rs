//! Meal photo preprocessing: cap the longest side and re-encode as JPEG.

use crate::config::ImageConfig;
use crate::error::AnalysisError;
use base64::{engine::general_purpose, Engine as _};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;

/// Run [`compress_image`] on the blocking pool.
pub async fn compress_image_blocking(
    bytes: Vec<u8>,
    settings: ImageConfig,
) -> Result<Vec<u8>, AnalysisError> {
    tokio::task::spawn_blocking(move || compress_image(&bytes, &settings))
        .await
        .map_err(|e| AnalysisError::Internal(format!("image compression task failed: {}", e)))?
}

/// Downscale `bytes` so neither side exceeds `max_side`, then re-encode as JPEG.
///
/// Images declaring more than `max_pixels` are rejected before decoding.
/// Images that cannot be probed, decoded or encoded are returned unchanged.
pub fn compress_image(bytes: &[u8], settings: &ImageConfig) -> Result<Vec<u8>, AnalysisError> {
    let Some((width, height)) = declared_dimensions(bytes) else {
        tracing::warn!(size = bytes.len(), "Image format not recognised; compression skipped");
        return Ok(bytes.to_vec());
    };

    if u64::from(width) * u64::from(height) > settings.max_pixels {
        tracing::warn!(width, height, max_pixels = settings.max_pixels, "Meal image rejected");
        return Err(AnalysisError::Validation(format!(
            "Meal image is too large ({}x{} pixels)",
            width, height
        )));
    }

    match reencode(bytes, settings.max_side, settings.jpeg_quality) {
        Ok(compressed) => {
            tracing::debug!(
                original_size = bytes.len(),
                compressed_size = compressed.len(),
                width,
                height,
                "Meal image compressed"
            );
            Ok(compressed)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Image compression skipped");
            Ok(bytes.to_vec())
        }
    }
}

/// Width and height from the image header, without decoding pixels.
fn declared_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn reencode(bytes: &[u8], max_side: u32, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let (width, height) = img.dimensions();
    if width.max(height) > max_side {
        img = img.thumbnail(max_side, max_side);
    }

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageOutputFormat::Jpeg(quality))?;

    Ok(buffer.into_inner())
}

pub fn jpeg_data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}
