//! Per-channel histograms and the equalization curve built from them.

use crate::raster::{Raster, CHANNELS};

/// 256-bin histograms of the three colour channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHistograms {
    pub red: [u32; 256],
    pub green: [u32; 256],
    pub blue: [u32; 256],
}

impl Default for ChannelHistograms {
    fn default() -> Self {
        Self {
            red: [0; 256],
            green: [0; 256],
            blue: [0; 256],
        }
    }
}

/// Count colour samples of an RGBA raster in a single pass. Alpha is ignored.
pub fn compute_histograms(image: &Raster) -> ChannelHistograms {
    let mut hist = ChannelHistograms::default();
    for px in image.pixels.chunks_exact(CHANNELS) {
        hist.red[px[0] as usize] += 1;
        hist.green[px[1] as usize] += 1;
        hist.blue[px[2] as usize] += 1;
    }
    hist
}

/// Build the classic histogram-equalization lookup table.
///
/// `lut[v] = round((cdf(v) - cdf_min) / (total - cdf_min) * 255)`, where
/// `cdf_min` is the first non-zero cumulative count. A channel holding a
/// single level maps to the identity.
pub fn equalization_lut(bins: &[u32; 256], total: u32) -> [u8; 256] {
    let mut lut = [0u8; 256];

    let mut cdf = [0u32; 256];
    let mut running = 0u32;
    for (slot, &count) in cdf.iter_mut().zip(bins.iter()) {
        running += count;
        *slot = running;
    }

    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    let range = total.saturating_sub(cdf_min);
    if range == 0 {
        for (v, out) in lut.iter_mut().enumerate() {
            *out = v as u8;
        }
        return lut;
    }

    for (out, &c) in lut.iter_mut().zip(cdf.iter()) {
        let scaled = c.saturating_sub(cdf_min) as f64 / range as f64 * 255.0;
        *out = scaled.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram() {
        let hist = compute_histograms(&Raster::filled(0, 0, [0; 4]));
        assert!(hist.red.iter().chain(&hist.green).chain(&hist.blue).all(|&n| n == 0));
    }

    #[test]
    fn test_rgb_primary_colors() {
        let img = Raster::new(
            3,
            1,
            vec![
                255, 0, 0, 255, // Red
                0, 255, 0, 255, // Green
                0, 0, 255, 255, // Blue
            ],
        )
        .unwrap();
        let hist = compute_histograms(&img);
        assert_eq!(hist.red[255], 1);
        assert_eq!(hist.red[0], 2);
        assert_eq!(hist.green[255], 1);
        assert_eq!(hist.blue[0], 2);
    }

    #[test]
    fn test_alpha_is_ignored() {
        let img = Raster::filled(2, 2, [10, 20, 30, 99]);
        let hist = compute_histograms(&img);
        assert_eq!(hist.red[10], 4);
        assert_eq!(hist.red[99], 0);
    }

    #[test]
    fn test_equalization_lut_gradient_is_linear() {
        let bins = [1u32; 256];
        let lut = equalization_lut(&bins, 256);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        for pair in lut.windows(2) {
            assert!(pair[1] >= pair[0], "equalization must be monotonic");
        }
    }

    #[test]
    fn test_equalization_lut_single_level_is_identity() {
        let mut bins = [0u32; 256];
        bins[77] = 10;
        let lut = equalization_lut(&bins, 10);
        assert_eq!(lut[77], 77);
        assert_eq!(lut[200], 200);
    }

    #[test]
    fn test_equalization_lut_two_levels_spread() {
        let mut bins = [0u32; 256];
        bins[100] = 5;
        bins[101] = 5;
        let lut = equalization_lut(&bins, 10);
        assert_eq!(lut[100], 0);
        assert_eq!(lut[101], 255);
    }
}
