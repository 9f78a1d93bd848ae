//! JPEG encoding for previews and exports.
//!
//! Uses the `image` crate's JPEG encoder. Alpha is dropped before encoding.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use thiserror::Error;

use crate::raster::{byte_len, Raster};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Pixel buffer holds {actual} bytes, {expected} needed")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("Cannot encode a {width}x{height} image")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("JPEG encoder failed: {0}")]
    EncodingFailed(String),
}

/// Encode a raster to JPEG bytes at `quality`, clamped to 1..=100.
pub fn encode_jpeg(image: &Raster, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = byte_len(width, height);
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    let mut out = Vec::with_capacity(expected / 8);
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .write_image(&image.to_rgb_bytes(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32) -> Raster {
        Raster::filled(width, height, [128, 128, 128, 255])
    }

    fn assert_jpeg_markers(bytes: &[u8]) {
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_basic() {
        let bytes = encode_jpeg(&gray(100, 100), 90).unwrap();
        assert_jpeg_markers(&bytes);
    }

    #[test]
    fn test_encode_jpeg_quality_clamping() {
        assert!(encode_jpeg(&gray(10, 10), 0).is_ok());
        assert!(encode_jpeg(&gray(10, 10), 255).is_ok());
    }

    #[test]
    fn test_encode_jpeg_invalid_pixel_data() {
        let mut img = gray(10, 10);
        img.pixels.truncate(10 * 9 * 4);
        assert!(matches!(encode_jpeg(&img, 90), Err(EncodeError::InvalidPixelData { .. })));
    }

    #[test]
    fn test_encode_jpeg_zero_dimensions() {
        let img = Raster::filled(0, 100, [0; 4]);
        assert!(matches!(encode_jpeg(&img, 90), Err(EncodeError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_encode_jpeg_transparent_pixels_encode() {
        let img = Raster::filled(4, 4, [10, 20, 30, 0]);
        assert_jpeg_markers(&encode_jpeg(&img, 90).unwrap());
    }

    #[test]
    fn test_encode_jpeg_roundtrip_dimensions() {
        let bytes = encode_jpeg(&gray(37, 21), 90).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (37, 21));
    }

    #[test]
    fn test_encode_jpeg_gradient_size() {
        let (width, height) = (100u32, 100u32);
        let mut pixels = Vec::with_capacity(byte_len(width, height));
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255]);
            }
        }
        let img = Raster::new(width, height, pixels).unwrap();
        let bytes = encode_jpeg(&img, 90).unwrap();
        assert!(bytes.len() > 500);
        assert!(bytes.len() < 50000);
    }
}
