//! Editor configuration, loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! preview_quality = 40
//! preview_downscale = 2
//! export_quality = 100
//! export_discard_bits = 4
//! export_dir = "."
//! export_prefix = "lumaedit"
//! # bands = 8
//! contrast_method = "linear"     # or "equalize"
//! rotation_filter = "bilinear"   # or "lanczos3"
//! coalesce_scrubbing = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transform::{ContrastMethod, InterpolationFilter};

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Tunables for the session, codec and bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// JPEG quality of previews (1-100).
    pub preview_quality: u8,
    /// Previews are `1 / preview_downscale` of the working size.
    pub preview_downscale: u32,
    /// JPEG quality of exports (1-100).
    pub export_quality: u8,
    /// Low bits zeroed in each colour sample before export (0-7).
    pub export_discard_bits: u8,
    /// Directory exports are written to.
    pub export_dir: PathBuf,
    /// File name prefix of exports.
    pub export_prefix: String,
    /// Row bands per parallel transform. `None` uses hardware concurrency.
    pub bands: Option<usize>,
    pub contrast_method: ContrastMethod,
    pub rotation_filter: InterpolationFilter,
    /// Skip an apply that is immediately superseded by a queued apply of
    /// the same control.
    pub coalesce_scrubbing: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            preview_quality: 40,
            preview_downscale: 2,
            export_quality: 100,
            export_discard_bits: 4,
            export_dir: PathBuf::from("."),
            export_prefix: "lumaedit".to_string(),
            bands: None,
            contrast_method: ContrastMethod::Linear,
            rotation_filter: InterpolationFilter::Bilinear,
            coalesce_scrubbing: false,
        }
    }
}

impl EditorConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded editor config");
        Ok(config)
    }

    /// Parse and validate config text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = toml::from_str(content)?;
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        Ok(config)
    }

    /// Check value ranges, returning one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(1..=100).contains(&self.preview_quality) {
            errors.push(format!("preview_quality: must be 1-100, got {}", self.preview_quality));
        }
        if !(1..=100).contains(&self.export_quality) {
            errors.push(format!("export_quality: must be 1-100, got {}", self.export_quality));
        }
        if self.preview_downscale == 0 {
            errors.push("preview_downscale: must be a positive integer".to_string());
        }
        if self.export_discard_bits > 7 {
            errors.push(format!(
                "export_discard_bits: must be at most 7, got {}",
                self.export_discard_bits
            ));
        }
        if self.export_prefix.is_empty() {
            errors.push("export_prefix: must be a non-empty string".to_string());
        }
        if self.bands == Some(0) {
            errors.push("bands: must be a positive integer".to_string());
        }

        errors
    }
}
