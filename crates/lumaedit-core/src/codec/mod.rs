//! Encoding of rasters for the outside world.
//!
//! - Previews: a downscaled, low-quality JPEG delivered as base64 text
//! - Exports: a full-resolution, high-quality JPEG written to a uniquely
//!   named file
//!
//! # Examples
//!
//! ```ignore
//! use lumaedit_core::codec::encode_preview;
//!
//! let preview = encode_preview(&raster, 40, 2).unwrap();
//! println!("{}x{} preview, {} base64 chars", preview.width, preview.height, preview.data.len());
//! ```

mod export;
mod jpeg;
mod preview;

pub use export::{export_file_name, write_export};
pub use jpeg::{encode_jpeg, EncodeError};
pub use preview::{encode_preview, Preview};
