//! Aspect-ratio cropping.
//!
//! A crop request names a target aspect ratio (`width / height`) and a window
//! in source pixels. The result is the largest rectangle of that ratio
//! centered inside the window. When that rectangle does not fit inside the
//! source image, or the ratio is unusable, the source is returned unchanged.
//!
//! # Example
//!
//! ```ignore
//! // Square crop of a landscape image
//! let req = CropRequest::new(1.0, 0, 0);
//! let square = apply_crop(&image, &req);
//! ```

use serde::{Deserialize, Serialize};

use crate::raster::{Raster, CHANNELS};

/// A crop request in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    /// Target ratio, width over height.
    pub aspect_ratio: f64,
    /// Window origin.
    pub x: i32,
    pub y: i32,
    /// Window size. `None` means the full image dimension.
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl CropRequest {
    /// A request whose window spans the full image from `(x, y)`.
    pub fn new(aspect_ratio: f64, x: i32, y: i32) -> Self {
        Self {
            aspect_ratio,
            x,
            y,
            width: None,
            height: None,
        }
    }

    /// Override the window size.
    pub fn with_window(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Resolved crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the rectangle a request selects from a `src_width x src_height`
/// image.
///
/// Returns `None` when the ratio is not a positive finite number, the
/// window is empty, or the centered rectangle leaves the source bounds.
pub fn compute_crop_rect(src_width: u32, src_height: u32, req: &CropRequest) -> Option<CropRect> {
    let ratio = req.aspect_ratio;
    if !(ratio.is_finite() && ratio > 0.0) {
        return None;
    }

    let win_w = req.width.unwrap_or(src_width) as i64;
    let win_h = req.height.unwrap_or(src_height) as i64;
    if win_w == 0 || win_h == 0 {
        return None;
    }

    let (w, h) = if win_w as f64 / win_h as f64 > ratio {
        (((win_h as f64) * ratio).round() as i64, win_h)
    } else {
        (win_w, ((win_w as f64) / ratio).round() as i64)
    };
    if w <= 0 || h <= 0 {
        return None;
    }

    let left = req.x as i64 + (win_w - w) / 2;
    let top = req.y as i64 + (win_h - h) / 2;

    if left < 0 || top < 0 || left + w > src_width as i64 || top + h > src_height as i64 {
        return None;
    }

    Some(CropRect {
        left: left as u32,
        top: top as u32,
        width: w as u32,
        height: h as u32,
    })
}

/// Crop `image` according to `req`.
///
/// An out-of-bounds or invalid request yields a copy of the input.
pub fn apply_crop(image: &Raster, req: &CropRequest) -> Raster {
    let Some(rect) = compute_crop_rect(image.width, image.height, req) else {
        tracing::debug!(?req, width = image.width, height = image.height, "crop out of bounds, keeping image");
        return image.clone();
    };

    if rect.left == 0 && rect.top == 0 && rect.width == image.width && rect.height == image.height {
        return image.clone();
    }

    let row_bytes = rect.width as usize * CHANNELS;
    let start = rect.left as usize * CHANNELS;
    let mut pixels = Vec::with_capacity(row_bytes * rect.height as usize);

    // Copy pixel data row by row
    for y in rect.top..rect.top + rect.height {
        pixels.extend_from_slice(&image.row(y)[start..start + row_bytes]);
    }

    Raster {
        width: rect.width,
        height: rect.height,
        pixels,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_image(width: u32, height: u32) -> Raster {
        let mut pixels = Vec::with_capacity((width * height) as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v.wrapping_add(1), v.wrapping_add(2), 255]);
            }
        }
        Raster::new(width, height, pixels).unwrap()
    }

    proptest! {
        /// Any resolved rectangle lies inside the source.
        #[test]
        fn prop_rect_inside_bounds(
            (width, height) in (1u32..=200, 1u32..=200),
            ratio in 0.05f64..20.0,
            x in -50i32..250,
            y in -50i32..250,
            win in prop::option::of((0u32..250, 0u32..250)),
        ) {
            let mut req = CropRequest::new(ratio, x, y);
            if let Some((ww, wh)) = win {
                req = req.with_window(ww, wh);
            }
            if let Some(rect) = compute_crop_rect(width, height, &req) {
                prop_assert!(rect.width >= 1 && rect.height >= 1);
                prop_assert!(rect.left + rect.width <= width);
                prop_assert!(rect.top + rect.height <= height);
            }
        }

        /// A request that does not resolve returns the input bit-identical.
        #[test]
        fn prop_out_of_bounds_is_identity(
            (width, height) in (4u32..=40, 4u32..=40),
            shift in 1i32..40,
        ) {
            let img = create_test_image(width, height);
            let req = CropRequest::new(width as f64 / height as f64, shift, 0);
            prop_assert!(compute_crop_rect(width, height, &req).is_none());
            prop_assert_eq!(apply_crop(&img, &req), img);
        }

        /// Pixel data always matches the output dimensions.
        #[test]
        fn prop_pixel_data_matches_dimensions(
            (width, height) in (1u32..=60, 1u32..=60),
            ratio in 0.1f64..10.0,
        ) {
            let img = create_test_image(width, height);
            let out = apply_crop(&img, &CropRequest::new(ratio, 0, 0));
            prop_assert_eq!(out.pixels.len(), out.width as usize * out.height as usize * CHANNELS);
            prop_assert!(out.width <= width && out.height <= height);
        }
    }
}
