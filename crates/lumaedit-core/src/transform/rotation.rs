//! Image rotation about the center, with bilinear and Lanczos3 interpolation.
//!
//! Multiples of 90 degrees are exact pixel permutations. Any other angle
//! uses inverse mapping into an expanded canvas: for each output pixel we
//! find the source position it came from and interpolate there. Output
//! pixels that map outside the source are transparent black.
//!
//! Angles are in degrees, positive = clockwise on screen (y grows downward).
//! For rotation by θ the inverse transform is:
//!
//! ```text
//! src_x =  dx * cos(θ) + dy * sin(θ) + src_cx
//! src_y = -dx * sin(θ) + dy * cos(θ) + src_cy
//! ```

use serde::{Deserialize, Serialize};

use super::TransformError;
use crate::raster::{Raster, CHANNELS};

/// Interpolation filter for arbitrary-angle rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation.
    #[default]
    Bilinear,
    /// Higher-quality Lanczos3 interpolation.
    Lanczos3,
}

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Number of clockwise quarter turns if `degrees` is a multiple of 90.
fn quarter_turns(degrees: f64) -> Option<u32> {
    let turns = degrees / 90.0;
    let nearest = turns.round();
    if (turns - nearest).abs() < 1e-9 {
        Some((nearest as i64).rem_euclid(4) as u32)
    } else {
        None
    }
}

/// Compute the bounding box of a `width x height` image rotated by
/// `angle_degrees`. The sign of the angle does not matter.
///
/// # Example
///
/// ```ignore
/// assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
/// assert_eq!(compute_rotated_bounds(100, 50, 0.0), (100, 50));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turns(angle_degrees) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // new_w = |w*cos| + |h*sin|, new_h = |w*sin| + |h*cos|
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate an image clockwise by `angle_degrees` about its center.
///
/// Quarter turns swap or keep dimensions exactly and never resample. Other
/// angles expand the canvas to fit the rotated image (no clipping).
///
/// # Errors
///
/// `InvalidParameter` if the angle is not finite.
pub fn apply_rotation(
    image: &Raster,
    angle_degrees: f64,
    filter: InterpolationFilter,
) -> Result<Raster, TransformError> {
    if !angle_degrees.is_finite() {
        return Err(TransformError::invalid("degrees", angle_degrees, "must be finite"));
    }
    if image.is_empty() {
        return Ok(image.clone());
    }

    if let Some(turns) = quarter_turns(angle_degrees) {
        return Ok(rotate_quarter(image, turns));
    }

    let (src_w, src_h) = (image.width as f64, image.height as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(image.width, image.height, angle_degrees);

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = vec![0u8; dst_w as usize * dst_h as usize * CHANNELS];

    for (dst_y, row) in output.chunks_exact_mut(dst_w as usize * CHANNELS).enumerate() {
        for (dst_x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
            // Pixel centers, relative to the canvas center
            let dx = dst_x as f64 + 0.5 - dst_cx;
            let dy = dst_y as f64 + 0.5 - dst_cy;

            // Back to source sample coordinates
            let src_x = dx * cos + dy * sin + src_cx - 0.5;
            let src_y = -dx * sin + dy * cos + src_cy - 0.5;

            let sample = match filter {
                InterpolationFilter::Bilinear => sample_bilinear(image, src_x, src_y),
                InterpolationFilter::Lanczos3 => sample_lanczos3(image, src_x, src_y),
            };
            px.copy_from_slice(&sample);
        }
    }

    Ok(Raster {
        width: dst_w,
        height: dst_h,
        pixels: output,
    })
}

/// Exact clockwise rotation by `turns` quarter turns.
fn rotate_quarter(image: &Raster, turns: u32) -> Raster {
    let (w, h) = (image.width, image.height);
    match turns {
        1 => permute(image, h, w, |x, y| (y, h - 1 - x)),
        2 => permute(image, w, h, |x, y| (w - 1 - x, h - 1 - y)),
        3 => permute(image, h, w, |x, y| (w - 1 - y, x)),
        _ => image.clone(),
    }
}

/// Build a `dst_w x dst_h` raster where each output pixel copies the source
/// pixel `src_of(x, y)`.
fn permute(image: &Raster, dst_w: u32, dst_h: u32, src_of: impl Fn(u32, u32) -> (u32, u32)) -> Raster {
    let mut pixels = Vec::with_capacity(image.pixels.len());
    for y in 0..dst_h {
        for x in 0..dst_w {
            let (sx, sy) = src_of(x, y);
            pixels.extend_from_slice(&image.pixel(sx, sy));
        }
    }
    Raster {
        width: dst_w,
        height: dst_h,
        pixels,
    }
}

const LOBES: i64 = 3;

#[inline]
fn texel(image: &Raster, x: i64, y: i64) -> &[u8] {
    let x = x.clamp(0, image.width as i64 - 1) as u32;
    let y = y.clamp(0, image.height as i64 - 1) as u32;
    let start = (y * image.width + x) as usize * CHANNELS;
    &image.pixels[start..start + CHANNELS]
}

#[inline]
fn outside(image: &Raster, x: f64, y: f64) -> bool {
    x < -0.5 || y < -0.5 || x > image.width as f64 - 0.5 || y > image.height as f64 - 0.5
}

/// Weighted sum of the texels at `xs` x `ys`, normalized by the total weight.
fn convolve(image: &Raster, xs: &[(i64, f64)], ys: &[(i64, f64)]) -> [u8; 4] {
    let mut acc = [0.0f64; CHANNELS];
    let mut total = 0.0;
    for &(y, wy) in ys {
        for &(x, wx) in xs {
            let w = wx * wy;
            for (a, &v) in acc.iter_mut().zip(texel(image, x, y)) {
                *a += v as f64 * w;
            }
            total += w;
        }
    }
    if total.abs() < f64::EPSILON {
        return TRANSPARENT;
    }
    acc.map(|a| (a / total).round().clamp(0.0, 255.0) as u8)
}

/// Bilinear sample of the four nearest pixels, edges clamped.
fn sample_bilinear(image: &Raster, x: f64, y: f64) -> [u8; 4] {
    if outside(image, x, y) {
        return TRANSPARENT;
    }
    let (x0, y0) = (x.floor(), y.floor());
    let (tx, ty) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);
    convolve(
        image,
        &[(x0, 1.0 - tx), (x0 + 1, tx)],
        &[(y0, 1.0 - ty), (y0 + 1, ty)],
    )
}

/// Lanczos3 sample over a 6x6 neighborhood. Falls back to bilinear where the
/// neighborhood would leave the image.
fn sample_lanczos3(image: &Raster, x: f64, y: f64) -> [u8; 4] {
    let inner_w = (image.width as i64 - LOBES) as f64;
    let inner_h = (image.height as i64 - LOBES) as f64;
    if x < (LOBES - 1) as f64 || y < (LOBES - 1) as f64 || x >= inner_w || y >= inner_h {
        return sample_bilinear(image, x, y);
    }

    let taps = |center: f64| -> [(i64, f64); 6] {
        let base = center.floor() as i64 - (LOBES - 1);
        std::array::from_fn(|i| {
            let pos = base + i as i64;
            (pos, lanczos3(center - pos as f64))
        })
    };
    convolve(image, &taps(x), &taps(y))
}

/// Lanczos kernel `sinc(x) * sinc(x / 3)`, zero outside `(-3, 3)`.
fn lanczos3(x: f64) -> f64 {
    let a = LOBES as f64;
    if x.abs() < f64::EPSILON {
        1.0
    } else if x.abs() >= a {
        0.0
    } else {
        let t = std::f64::consts::PI * x;
        a * t.sin() * (t / a).sin() / (t * t)
    }
}
