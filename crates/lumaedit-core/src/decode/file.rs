//! File decoding with EXIF orientation handling.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{ImageError, ImageReader};

use super::{DecodeError, Orientation};
use crate::raster::Raster;

/// Read and decode an image file into an upright RGBA raster.
///
/// # Errors
///
/// Returns `DecodeError::Io` if the file cannot be read, and the errors of
/// [`decode_bytes`] otherwise.
pub fn open_path(path: impl AsRef<Path>) -> Result<Raster, DecodeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let raster = decode_bytes(&bytes)?;
    tracing::info!(
        path = %path.display(),
        width = raster.width,
        height = raster.height,
        "decoded image"
    );
    Ok(raster)
}

/// Decode image bytes (any format the image crate was built with),
/// applying EXIF orientation correction.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format is not recognized,
/// `DecodeError::CorruptedFile` if decoding fails, and `DecodeError::Empty`
/// for images without pixels.
pub fn decode_bytes(bytes: &[u8]) -> Result<Raster, DecodeError> {
    let orientation = read_orientation(bytes);
    if !orientation.is_upright() {
        tracing::debug!(?orientation, "correcting EXIF orientation");
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let img = reader.decode().map_err(|e| match e {
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    })?;

    let raster = Raster::from_rgba_image(orientation.correct(img).into_rgba8());
    if raster.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(raster)
}

/// Read the EXIF orientation of encoded image bytes. Images without EXIF
/// data are upright.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from_exif)
        .unwrap_or_default()
}
