use crate::raster::{Raster, CHANNELS};

/// Mirror an image horizontally. Applying it twice yields the input.
pub fn flip_horizontal(image: &Raster) -> Raster {
    let mut pixels = Vec::with_capacity(image.pixels.len());
    for y in 0..image.height {
        for px in image.row(y).chunks_exact(CHANNELS).rev() {
            pixels.extend_from_slice(px);
        }
    }
    Raster {
        width: image.width,
        height: image.height,
        pixels,
    }
}
