//! Image decoding for the edit session.
//!
//! This module turns an image file on disk (or its bytes) into a [`Raster`],
//! applying the EXIF orientation so the working image is always upright.
//!
//! # Examples
//!
//! ```ignore
//! use lumaedit_core::decode::open_path;
//!
//! let raster = open_path("photo.jpg")?;
//! println!("Decoded {}x{} image", raster.width, raster.height);
//! ```
//!
//! [`Raster`]: crate::raster::Raster

mod file;
mod types;

pub use file::{decode_bytes, open_path, read_orientation};
pub use types::{DecodeError, Orientation};
