//! The RGBA raster every transform consumes and produces.

use thiserror::Error;

/// Samples per pixel (RGBA).
pub const CHANNELS: usize = 4;

/// Number of colour channels (everything except alpha).
pub const COLOR_CHANNELS: usize = 3;

/// Errors raised when constructing a raster from raw parts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    /// Pixel buffer length doesn't match the dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// An 8-bit RGBA image in row-major order.
///
/// Rasters are never edited in place once handed to a session: every
/// transform builds a fresh one and the session swaps it in wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Interleaved RGBA samples, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Create a raster, validating the buffer length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        let expected = byte_len(width, height);
        if pixels.len() != expected {
            return Err(RasterError::BufferMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a raster where every pixel has the same value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Take ownership of an `image::RgbaImage` buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Copy into an `image::RgbaImage` for use with the image crate.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Drop the alpha channel, producing packed RGB bytes for JPEG encoding.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixel_count() * COLOR_CHANNELS);
        for px in self.pixels.chunks_exact(CHANNELS) {
            rgb.extend_from_slice(&px[..COLOR_CHANNELS]);
        }
        rgb
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Borrow one row of samples.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }

    /// Read a single pixel.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check if this is an empty image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Width and height as a tuple.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Expected buffer length for the given dimensions.
#[inline]
pub fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}
