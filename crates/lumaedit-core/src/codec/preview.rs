//! Low-cost previews for the presentation layer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::jpeg::{encode_jpeg, EncodeError};
use crate::raster::Raster;

/// A base64-encoded JPEG preview and its pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    /// Standard-alphabet base64 of the JPEG bytes.
    pub data: String,
    pub width: u32,
    pub height: u32,
}

impl Preview {
    /// Decode the base64 payload back to JPEG bytes.
    pub fn jpeg_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Build a preview: divide each dimension by `downscale` (never below 1),
/// resize with a triangle filter, encode at `quality`, then base64.
pub fn encode_preview(image: &Raster, quality: u8, downscale: u32) -> Result<Preview, EncodeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let downscale = downscale.max(1);
    let target_w = (width / downscale).max(1);
    let target_h = (height / downscale).max(1);

    let jpeg = if (target_w, target_h) == (width, height) {
        encode_jpeg(image, quality)?
    } else {
        let rgba = image
            .to_rgba_image()
            .ok_or_else(|| EncodeError::EncodingFailed("Failed to create RgbaImage".to_string()))?;
        let resized = image::imageops::resize(&rgba, target_w, target_h, FilterType::Triangle);
        encode_jpeg(&Raster::from_rgba_image(resized), quality)?
    };

    tracing::trace!(target_w, target_h, bytes = jpeg.len(), "encoded preview");

    Ok(Preview {
        data: STANDARD.encode(jpeg),
        width: target_w,
        height: target_h,
    })
}
