//! Dispatch from an [`Adjustment`] to the transform that implements it.

use std::time::Instant;

use crate::adjustment::Adjustment;
use crate::config::EditorConfig;
use crate::executor::BandExecutor;
use crate::raster::Raster;
use crate::transform::{
    adjust_band, adjust_contrast, adjust_exposure, apply_crop, apply_rotation, flip_horizontal,
    reduce_noise, sharpen, Band, ContrastMethod, InterpolationFilter, TransformError,
};

/// Runs adjustments against a raster. Built once per session.
#[derive(Debug, Clone)]
pub struct AdjustmentEngine {
    executor: BandExecutor,
    contrast_method: ContrastMethod,
    rotation_filter: InterpolationFilter,
}

impl Default for AdjustmentEngine {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl AdjustmentEngine {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            executor: BandExecutor::new(config.bands),
            contrast_method: config.contrast_method,
            rotation_filter: config.rotation_filter,
        }
    }

    pub fn executor(&self) -> &BandExecutor {
        &self.executor
    }

    /// Produce a new raster with `adjustment` applied to `image`.
    pub fn apply(&self, image: &Raster, adjustment: &Adjustment) -> Result<Raster, TransformError> {
        let start = Instant::now();
        let exec = &self.executor;

        let result = match *adjustment {
            Adjustment::Exposure { gamma } => adjust_exposure(image, gamma),
            Adjustment::Contrast { factor } => adjust_contrast(image, factor, self.contrast_method),
            Adjustment::Shadow { factor } => adjust_band(image, Band::Shadow, factor, exec),
            Adjustment::Midtone { factor } => adjust_band(image, Band::Midtone, factor, exec),
            Adjustment::Highlight { factor } => adjust_band(image, Band::Highlight, factor, exec),
            Adjustment::Noise { factor } => reduce_noise(image, factor, exec),
            Adjustment::Sharpen { strength } => sharpen(image, strength, exec),
            Adjustment::Crop(ref req) => Ok(apply_crop(image, req)),
            Adjustment::Rotate { degrees } => apply_rotation(image, degrees, self.rotation_filter),
            Adjustment::Flip => Ok(flip_horizontal(image)),
        }?;

        tracing::debug!(
            control = %adjustment.control(),
            bands = exec.bands(),
            width = result.width,
            height = result.height,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "applied adjustment"
        );
        Ok(result)
    }
}
