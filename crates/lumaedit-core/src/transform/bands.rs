//! Shadow / midtone / highlight band adjustments.
//!
//! The normalized tonal range is split into three equal, non-overlapping
//! bands that together cover `[0, 1]`:
//!
//! ```text
//! shadow     [0,   1/3)
//! midtone    [1/3, 2/3)
//! highlight  [2/3, 1  ]
//! ```
//!
//! A pixel belongs to a band only when all three colour channels fall inside
//! it. In-band pixels have their colour channels multiplied by the factor;
//! every other pixel is copied through unchanged.

use serde::{Deserialize, Serialize};

use super::{from_unit, to_unit, TransformError};
use crate::executor::BandExecutor;
use crate::raster::{Raster, CHANNELS, COLOR_CHANNELS};

/// Lower edge of the midtone band.
pub const MIDTONE_START: f32 = 1.0 / 3.0;

/// Lower edge of the highlight band.
pub const HIGHLIGHT_START: f32 = 2.0 / 3.0;

/// One of the three tonal bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Shadow,
    Midtone,
    Highlight,
}

impl Band {
    /// The band a normalized value falls in. Values outside `[0, 1]` are
    /// clamped first, so every input maps to exactly one band.
    #[inline]
    pub fn of(v: f32) -> Band {
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        if v < MIDTONE_START {
            Band::Shadow
        } else if v < HIGHLIGHT_START {
            Band::Midtone
        } else {
            Band::Highlight
        }
    }

    /// Whether a normalized value lies inside this band.
    #[inline]
    pub fn contains(self, v: f32) -> bool {
        Band::of(v) == self
    }

    /// The band shared by all colour channels of a pixel, if any.
    #[inline]
    pub fn of_pixel(rgb: &[u8]) -> Option<Band> {
        let first = Band::of(to_unit(rgb[0]));
        rgb[1..COLOR_CHANNELS]
            .iter()
            .all(|&c| Band::of(to_unit(c)) == first)
            .then_some(first)
    }
}

/// Scale the colour channels of every pixel in `band` by `factor`.
///
/// Rows are processed in parallel bands by `executor`.
///
/// # Errors
///
/// `InvalidParameter` if `factor` is not finite.
pub fn adjust_band(
    image: &Raster,
    band: Band,
    factor: f32,
    executor: &BandExecutor,
) -> Result<Raster, TransformError> {
    if !factor.is_finite() {
        return Err(TransformError::invalid("factor", factor, "must be finite"));
    }

    executor.run(image.width, image.height, |mut rows| {
        for (y, out) in rows.rows_mut() {
            let src = image.row(y);
            for (px_out, px_in) in out.chunks_exact_mut(CHANNELS).zip(src.chunks_exact(CHANNELS)) {
                px_out.copy_from_slice(px_in);
                if Band::of_pixel(px_in) == Some(band) {
                    for c in 0..COLOR_CHANNELS {
                        px_out[c] = from_unit(to_unit(px_in[c]) * factor);
                    }
                }
            }
        }
        Ok(())
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [Band; 3] = [Band::Shadow, Band::Midtone, Band::Highlight];

    proptest! {
        /// Exactly one band contains any normalized value.
        #[test]
        fn prop_bands_partition_unit_range(v in 0.0f32..=1.0) {
            let hits = ALL.iter().filter(|b| b.contains(v)).count();
            prop_assert_eq!(hits, 1);
        }

        /// Every 8-bit level lands in exactly one band.
        #[test]
        fn prop_every_level_in_one_band(level in any::<u8>()) {
            let v = to_unit(level);
            let hits = ALL.iter().filter(|b| b.contains(v)).count();
            prop_assert_eq!(hits, 1);
        }

        /// Pixels outside the band come through bit-identical.
        #[test]
        fn prop_out_of_band_pixels_unchanged(
            rgb in prop::array::uniform3(any::<u8>()),
            factor in -4.0f32..4.0,
        ) {
            let img = Raster::new(1, 1, vec![rgb[0], rgb[1], rgb[2], 255]).unwrap();
            let executor = BandExecutor::new(Some(1));
            for band in ALL {
                if Band::of_pixel(&img.pixels) != Some(band) {
                    let out = adjust_band(&img, band, factor, &executor).unwrap();
                    prop_assert_eq!(out, img.clone());
                }
            }
        }
    }
}
