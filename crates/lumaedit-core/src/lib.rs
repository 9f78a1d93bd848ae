//! lumaedit core - image adjustment pipeline
//!
//! This crate provides the editing core for lumaedit: pixel transforms, the
//! row-band parallel executor, the non-destructive edit session, and the
//! preview/export codecs.

pub mod adjustment;
pub mod codec;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod executor;
pub mod raster;
pub mod session;
pub mod transform;

pub use adjustment::{Adjustment, Control, ControlMemory};
pub use codec::{EncodeError, Preview};
pub use config::{ConfigError, EditorConfig};
pub use decode::DecodeError;
pub use engine::AdjustmentEngine;
pub use error::EditError;
pub use executor::BandExecutor;
pub use raster::{Raster, RasterError};
pub use session::{Session, SessionState};
pub use transform::{ContrastMethod, CropRequest, InterpolationFilter, TransformError};
