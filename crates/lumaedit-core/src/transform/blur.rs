//! Gaussian blur and the two filters built on it: noise reduction and
//! unsharp-mask sharpening.
//!
//! The blur is separable. The horizontal pass writes an `f32` intermediate
//! buffer and the vertical pass rounds back to 8 bits, both split into row
//! bands by the executor. Samples past the image edge are clamped to the
//! nearest edge sample. Alpha is carried through unchanged.

use super::{from_unit, to_unit, TransformError};
use crate::executor::BandExecutor;
use crate::raster::{Raster, CHANNELS, COLOR_CHANNELS};

/// Largest kernel the blur accepts.
pub const MAX_KERNEL_SIZE: u32 = 255;

const ALPHA: usize = 3;

/// Odd kernel size for a noise/sharpen factor: `max(1, round(f / 2) * 2 + 1)`.
///
/// Capped at [`MAX_KERNEL_SIZE`]. NaN maps to 1.
pub fn kernel_size(factor: f32) -> u32 {
    let half = (factor / 2.0).round();
    if half.is_nan() || half <= 0.0 {
        return 1;
    }
    let half = half.min(((MAX_KERNEL_SIZE - 1) / 2) as f32) as u32;
    half * 2 + 1
}

/// Normalized 1-D Gaussian weights for an odd kernel size.
///
/// Sigma is derived from the size: `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0];
    }
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as i32;
    let denom = 2.0 * sigma * sigma;

    let mut weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Blur the colour channels with a separable Gaussian of odd size `k`.
///
/// # Errors
///
/// `InvalidParameter` if `k` is even, zero, or above [`MAX_KERNEL_SIZE`].
pub fn gaussian_blur(image: &Raster, k: u32, executor: &BandExecutor) -> Result<Raster, TransformError> {
    if k % 2 == 0 || k > MAX_KERNEL_SIZE {
        return Err(TransformError::invalid("kernel_size", k, "must be odd and at most 255"));
    }
    if k == 1 || image.is_empty() {
        return Ok(image.clone());
    }

    let weights = gaussian_kernel(k);
    let radius = (k / 2) as i64;
    let width = image.width as usize;
    let height = image.height as i64;
    let row_len = width * CHANNELS;
    let last_x = width as i64 - 1;

    let horizontal: Vec<f32> = executor.map_rows(row_len, image.height, |mut band| {
        for (y, out) in band.rows_mut() {
            let src = image.row(y);
            for x in 0..width {
                let o = x * CHANNELS;
                for c in 0..COLOR_CHANNELS {
                    let mut acc = 0.0f32;
                    for (i, w) in weights.iter().enumerate() {
                        let sx = (x as i64 + i as i64 - radius).clamp(0, last_x) as usize;
                        acc += w * src[sx * CHANNELS + c] as f32;
                    }
                    out[o + c] = acc;
                }
                out[o + ALPHA] = src[o + ALPHA] as f32;
            }
        }
        Ok(())
    })?;

    executor.run(image.width, image.height, |mut band| {
        for (y, out) in band.rows_mut() {
            let src = image.row(y);
            for x in 0..width {
                let o = x * CHANNELS;
                for c in 0..COLOR_CHANNELS {
                    let mut acc = 0.0f32;
                    for (i, w) in weights.iter().enumerate() {
                        let sy = (y as i64 + i as i64 - radius).clamp(0, height - 1) as usize;
                        acc += w * horizontal[sy * row_len + o + c];
                    }
                    out[o + c] = acc.round().clamp(0.0, 255.0) as u8;
                }
                out[o + ALPHA] = src[o + ALPHA];
            }
        }
        Ok(())
    })
}

/// Noise reduction: a Gaussian blur sized by [`kernel_size`].
pub fn reduce_noise(image: &Raster, factor: f32, executor: &BandExecutor) -> Result<Raster, TransformError> {
    let k = kernel_size(factor);
    tracing::debug!(factor, kernel = k, "reducing noise");
    gaussian_blur(image, k, executor)
}

/// Unsharp mask: `out = image + strength * (image - blur(image))`.
///
/// The blur kernel is sized from `strength` the same way as noise reduction,
/// so a strength of 0 is the identity.
///
/// # Errors
///
/// `InvalidParameter` if `strength` is not finite.
pub fn sharpen(image: &Raster, strength: f32, executor: &BandExecutor) -> Result<Raster, TransformError> {
    if !strength.is_finite() {
        return Err(TransformError::invalid("strength", strength, "must be finite"));
    }
    let k = kernel_size(strength);
    if k == 1 {
        return Ok(image.clone());
    }
    let blurred = gaussian_blur(image, k, executor)?;

    executor.run(image.width, image.height, |mut band| {
        for (y, out) in band.rows_mut() {
            let src = image.row(y);
            let soft = blurred.row(y);
            for ((px_out, px_in), px_soft) in out
                .chunks_exact_mut(CHANNELS)
                .zip(src.chunks_exact(CHANNELS))
                .zip(soft.chunks_exact(CHANNELS))
            {
                for c in 0..COLOR_CHANNELS {
                    let v = to_unit(px_in[c]);
                    let detail = v - to_unit(px_soft[c]);
                    px_out[c] = from_unit(v + strength * detail);
                }
                px_out[ALPHA] = px_in[ALPHA];
            }
        }
        Ok(())
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Kernel sizes are always odd, at least 1, at most the cap.
        #[test]
        fn prop_kernel_size_is_odd(factor in -1000.0f32..1000.0) {
            let k = kernel_size(factor);
            prop_assert_eq!(k % 2, 1);
            prop_assert!(k >= 1);
            prop_assert!(k <= MAX_KERNEL_SIZE);
        }

        /// Blurring never changes dimensions.
        #[test]
        fn prop_blur_preserves_dimensions(w in 1u32..12, h in 1u32..12, factor in 0.0f32..20.0) {
            let img = Raster::filled(w, h, [10, 20, 30, 255]);
            let out = reduce_noise(&img, factor, &BandExecutor::new(Some(3))).unwrap();
            prop_assert_eq!(out.dimensions(), (w, h));
        }
    }
}
