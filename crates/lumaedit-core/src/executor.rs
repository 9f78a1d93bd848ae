//! Chunked parallel execution over row bands.
//!
//! A transform that can work row by row hands the executor a band function.
//! The executor allocates the output buffer, splits it into `N` contiguous
//! bands of whole rows, and runs the function once per band on the rayon
//! pool. Each call receives exclusive access to its own slice, so the parallel
//! phase needs no locking; the only synchronization point is the join before
//! the result is returned.
//!
//! The first failing band aborts the operation and its error is returned;
//! no partially written raster ever escapes.

use std::num::NonZeroUsize;
use std::ops::Range;

use rayon::prelude::*;

use crate::raster::{Raster, CHANNELS};
use crate::transform::TransformError;

/// A contiguous run of rows of an output buffer, owned by one band task.
#[derive(Debug)]
pub struct RowBand<'a, T = u8> {
    /// Band index, 0-based from the top of the image.
    pub index: usize,
    /// Image rows covered by this band.
    pub rows: Range<u32>,
    /// Elements per row.
    pub row_len: usize,
    /// Output storage for exactly `rows.len() * row_len` elements.
    pub data: &'a mut [T],
}

impl<'a, T> RowBand<'a, T> {
    /// Iterate over `(y, row)` pairs in this band.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (u32, &mut [T])> + '_ {
        let start = self.rows.start;
        self.data
            .chunks_exact_mut(self.row_len.max(1))
            .enumerate()
            .map(move |(i, row)| (start + i as u32, row))
    }

    /// Number of rows in this band.
    pub fn row_count(&self) -> u32 {
        self.rows.end - self.rows.start
    }
}

/// Split `rows` into at most `bands` contiguous ranges.
///
/// Every band but the last has `rows / n` rows; the last one absorbs the
/// remainder. The band count never exceeds the row count, and an image with
/// no rows yields no bands.
pub fn partition(rows: u32, bands: usize) -> Vec<Range<u32>> {
    if rows == 0 {
        return Vec::new();
    }
    let n = bands.clamp(1, rows as usize) as u32;
    let per_band = rows / n;

    let mut ranges = Vec::with_capacity(n as usize);
    let mut start = 0;
    for i in 0..n {
        let end = if i == n - 1 { rows } else { start + per_band };
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Runs band functions concurrently over disjoint row ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandExecutor {
    bands: usize,
}

impl Default for BandExecutor {
    fn default() -> Self {
        Self::new(None)
    }
}

impl BandExecutor {
    /// Create an executor. `None` uses the available hardware concurrency.
    pub fn new(bands: Option<usize>) -> Self {
        let bands = bands
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            });
        Self { bands }
    }

    /// Configured number of bands.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Produce a new RGBA raster of the given size, band by band.
    pub fn run<F>(&self, width: u32, height: u32, band_fn: F) -> Result<Raster, TransformError>
    where
        F: Fn(RowBand<'_, u8>) -> Result<(), TransformError> + Sync,
    {
        let pixels = self.map_rows(width as usize * CHANNELS, height, band_fn)?;
        Ok(Raster {
            width,
            height,
            pixels,
        })
    }

    /// Fill a `rows * row_len` buffer of any sample type band by band.
    ///
    /// Used directly by multi-pass filters that keep intermediate results in
    /// floating point.
    pub fn map_rows<T, F>(&self, row_len: usize, rows: u32, band_fn: F) -> Result<Vec<T>, TransformError>
    where
        T: Default + Clone + Send,
        F: Fn(RowBand<'_, T>) -> Result<(), TransformError> + Sync,
    {
        let mut buffer = vec![T::default(); row_len * rows as usize];
        let ranges = partition(rows, self.bands);

        let mut bands = Vec::with_capacity(ranges.len());
        let mut rest: &mut [T] = &mut buffer;
        for (index, range) in ranges.into_iter().enumerate() {
            let len = (range.end - range.start) as usize * row_len;
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
            rest = tail;
            bands.push(RowBand {
                index,
                rows: range,
                row_len,
                data: head,
            });
        }

        tracing::trace!(bands = bands.len(), rows, "dispatching row bands");

        bands.into_par_iter().try_for_each(|band| {
            let index = band.index;
            band_fn(band).map_err(|source| TransformError::BandFailed {
                band: index,
                source: Box::new(source),
            })
        })?;

        Ok(buffer)
    }
}
