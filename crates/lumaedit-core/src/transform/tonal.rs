//! Whole-image tonal adjustments: exposure (gamma), contrast, and the export
//! quantization pass.
//!
//! These are per-sample lookups, so each builds a 256-entry table once and
//! maps the colour channels through it on the calling thread.

use serde::{Deserialize, Serialize};

use super::histogram::{compute_histograms, equalization_lut};
use super::{from_unit, to_unit, TransformError};
use crate::raster::{Raster, CHANNELS, COLOR_CHANNELS};

/// How the contrast control interprets its factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContrastMethod {
    /// Scale every colour sample by the factor.
    #[default]
    Linear,
    /// Histogram-equalize each colour channel, mixed in by `min(factor, 1)`.
    Equalize,
}

/// Apply gamma exposure: `out = in ^ (1 / gamma)`.
///
/// Gamma above 1 brightens, below 1 darkens.
///
/// # Errors
///
/// `InvalidParameter` if `gamma` is not a finite number greater than zero.
pub fn adjust_exposure(image: &Raster, gamma: f32) -> Result<Raster, TransformError> {
    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(TransformError::invalid("gamma", gamma, "must be a finite number > 0"));
    }
    let inv = 1.0 / gamma;
    let lut = build_lut(|v| v.powf(inv));
    Ok(map_color_channels(image, |_, v| lut[v as usize]))
}

/// Apply contrast with the given method.
///
/// # Errors
///
/// `InvalidParameter` if `factor` is not a finite number greater than zero.
pub fn adjust_contrast(
    image: &Raster,
    factor: f32,
    method: ContrastMethod,
) -> Result<Raster, TransformError> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(TransformError::invalid("factor", factor, "must be a finite number > 0"));
    }

    match method {
        ContrastMethod::Linear => {
            let lut = build_lut(|v| v * factor);
            Ok(map_color_channels(image, |_, v| lut[v as usize]))
        }
        ContrastMethod::Equalize => {
            let hist = compute_histograms(image);
            let total = image.pixel_count() as u32;
            let luts = [
                equalization_lut(&hist.red, total),
                equalization_lut(&hist.green, total),
                equalization_lut(&hist.blue, total),
            ];
            let mix = factor.min(1.0);
            Ok(map_color_channels(image, |channel, v| {
                let eq = luts[channel][v as usize] as f32;
                (v as f32 + (eq - v as f32) * mix).round().clamp(0.0, 255.0) as u8
            }))
        }
    }
}

/// Zero out the lowest `bits` bits of every colour sample.
///
/// Applied before export encoding to trade fidelity for a smaller file.
///
/// # Errors
///
/// `InvalidParameter` if `bits` is greater than 7.
pub fn quantize(image: &Raster, bits: u8) -> Result<Raster, TransformError> {
    if bits > 7 {
        return Err(TransformError::invalid("bits", bits, "must be at most 7"));
    }
    let mask = 0xFFu8 << bits;
    Ok(map_color_channels(image, |_, v| v & mask))
}

/// Build a lookup table from a function over normalized samples.
fn build_lut(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = from_unit(f(to_unit(v as u8)));
    }
    lut
}

/// Map every colour sample through `f(channel, value)`, keeping alpha.
fn map_color_channels(image: &Raster, f: impl Fn(usize, u8) -> u8) -> Raster {
    let mut pixels = image.pixels.clone();
    for px in pixels.chunks_exact_mut(CHANNELS) {
        for (channel, sample) in px[..COLOR_CHANNELS].iter_mut().enumerate() {
            *sample = f(channel, *sample);
        }
    }
    Raster {
        width: image.width,
        height: image.height,
        pixels,
    }
}
