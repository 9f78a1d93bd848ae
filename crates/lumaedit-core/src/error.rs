use std::path::PathBuf;

use thiserror::Error;

use crate::codec::EncodeError;
use crate::decode::DecodeError;
use crate::raster::RasterError;
use crate::transform::TransformError;

/// Errors surfaced by session and bridge operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// An adjustment or export was issued before an image was opened.
    #[error("No image loaded")]
    ImageNotLoaded,

    /// The source image could not be read or decoded.
    #[error("Failed to open image: {0}")]
    DecodeFailure(#[from] DecodeError),

    /// A raster handed to the session is inconsistent with its dimensions.
    #[error(transparent)]
    InvalidRaster(#[from] RasterError),

    /// A transform rejected its parameters.
    #[error(transparent)]
    InvalidParameter(#[from] TransformError),

    /// Preview or export encoding failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Writing the export file failed.
    #[error("Failed to write export {path}: {source}")]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A newer apply for the same control replaced this one before it ran.
    #[error("Superseded by a newer adjustment")]
    Superseded,

    /// The background worker has shut down.
    #[error("Editor worker is not running")]
    WorkerUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(EditError::ImageNotLoaded.to_string(), "No image loaded");
        let err: EditError = TransformError::invalid("gamma", 0.0, "must be > 0").into();
        assert_eq!(err.to_string(), "Invalid parameter gamma = 0: must be > 0");
    }

    #[test]
    fn test_decode_conversion() {
        let err: EditError = DecodeError::Empty.into();
        assert!(matches!(err, EditError::DecodeFailure(DecodeError::Empty)));
    }
}
