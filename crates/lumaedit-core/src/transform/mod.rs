//! Pixel transforms: tonal adjustments, band adjustments, blur-based filters
//! and geometric operations.
//!
//! Every transform is a pure function from `&Raster` (plus parameters) to a
//! new `Raster`; none of them edits its input.
//!
//! # Sample handling
//!
//! Tonal transforms normalize colour samples to `[0, 1]`, operate in `f32`,
//! and convert back with rounding and clamping. Alpha passes through
//! untouched and never takes part in band membership.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise
//! - Crop offsets and windows are in pixels
//! - Origin is top-left corner

mod bands;
mod blur;
mod crop;
mod flip;
mod histogram;
mod rotation;
mod tonal;

use thiserror::Error;

pub use bands::{adjust_band, Band};
pub use blur::{gaussian_blur, gaussian_kernel, kernel_size, reduce_noise, sharpen, MAX_KERNEL_SIZE};
pub use crop::{apply_crop, compute_crop_rect, CropRect, CropRequest};
pub use flip::flip_horizontal;
pub use histogram::{compute_histograms, equalization_lut, ChannelHistograms};
pub use rotation::{apply_rotation, compute_rotated_bounds, InterpolationFilter};
pub use tonal::{adjust_contrast, adjust_exposure, quantize, ContrastMethod};

/// Errors raised by pixel transforms.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// A parameter is outside the range the transform accepts.
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// One row band of a parallel transform failed.
    #[error("Row band {band} failed: {source}")]
    BandFailed {
        band: usize,
        #[source]
        source: Box<TransformError>,
    },
}

impl TransformError {
    pub(crate) fn invalid(name: &'static str, value: impl Into<f64>, reason: &'static str) -> Self {
        TransformError::InvalidParameter {
            name,
            value: value.into(),
            reason,
        }
    }
}

/// Map an 8-bit sample to `[0, 1]`.
#[inline]
pub(crate) fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Map a normalized sample back to 8 bits, rounding and clamping.
#[inline]
pub(crate) fn from_unit(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
