//! The non-destructive edit session.
//!
//! A session holds one working image and at most one pending result. The
//! pending result belongs to the active control: adjusting that control again
//! recomputes it from the unchanged working image, so scrubbing a slider never
//! compounds. Switching to another control first commits the pending result
//! into the working image, then starts a new pending result from there.
//!
//! ```text
//!            open                apply(c)                apply(c')
//!   Idle ──────────▶ Ready ──────────────▶ Adjusting ─────────────▶ Adjusting
//!                      ▲                   (pending for c)  commit, (pending for c')
//!                      └──────── export / commit ◀──────────┘
//! ```
//!
//! Every operation computes its outcome before touching session state; a
//! failing transform or encoder leaves the session exactly as it was.

use std::path::{Path, PathBuf};

use crate::adjustment::{Adjustment, Control, ControlMemory};
use crate::codec::{encode_jpeg, encode_preview, write_export, Preview};
use crate::config::EditorConfig;
use crate::decode::open_path;
use crate::engine::AdjustmentEngine;
use crate::error::EditError;
use crate::raster::{byte_len, Raster, RasterError};
use crate::transform::quantize;

/// Observable session state, derived from the session's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image opened yet.
    Idle,
    /// An image is open and nothing is pending.
    Ready,
    /// A control is active and its result is pending.
    Adjusting,
}

/// The uncommitted result of the active control.
#[derive(Debug, Clone)]
struct Pending {
    control: Control,
    result: Raster,
}

/// One image being edited.
#[derive(Debug)]
pub struct Session {
    config: EditorConfig,
    engine: AdjustmentEngine,
    working: Option<Raster>,
    pending: Option<Pending>,
    memory: ControlMemory,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Session {
    pub fn new(config: EditorConfig) -> Self {
        let engine = AdjustmentEngine::new(&config);
        Self {
            config,
            engine,
            working: None,
            pending: None,
            memory: ControlMemory::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Decode `path` and make it the working image.
    ///
    /// On failure the previous session contents are kept.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), EditError> {
        let raster = open_path(path)?;
        self.open_raster(raster)
    }

    /// Replace the working image, clearing pending work and control memory.
    ///
    /// A raster whose buffer does not match its dimensions is rejected and
    /// the previous session contents are kept.
    pub fn open_raster(&mut self, raster: Raster) -> Result<(), EditError> {
        let expected = byte_len(raster.width, raster.height);
        if raster.pixels.len() != expected {
            return Err(RasterError::BufferMismatch {
                expected,
                actual: raster.pixels.len(),
            }
            .into());
        }
        tracing::info!(width = raster.width, height = raster.height, "opened image");
        self.working = Some(raster);
        self.pending = None;
        self.memory.clear();
        Ok(())
    }

    /// Apply an adjustment and return a preview of the pending result.
    pub fn apply(&mut self, adjustment: Adjustment) -> Result<Preview, EditError> {
        let control = adjustment.control();
        let (base, switching) = self.base_for(control)?;

        let result = self.engine.apply(base, &adjustment)?;
        let preview = encode_preview(&result, self.config.preview_quality, self.config.preview_downscale)?;

        if switching {
            self.commit();
        }
        self.pending = Some(Pending { control, result });
        self.memory.remember(adjustment);
        Ok(preview)
    }

    /// Re-apply the last value remembered for `control`, or its neutral
    /// value if it has not been used since the image was opened.
    pub fn restore(&mut self, control: Control) -> Result<Preview, EditError> {
        let adjustment = match self.memory.get(control) {
            Some(adjustment) => *adjustment,
            None => {
                let (base, _) = self.base_for(control)?;
                Adjustment::neutral(control, base.width, base.height)
            }
        };
        self.apply(adjustment)
    }

    /// Fold the pending result into the working image.
    ///
    /// Returns `false` if nothing was pending.
    pub fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(Pending { control, result }) => {
                tracing::debug!(%control, "committed pending result");
                self.working = Some(result);
                true
            }
            None => false,
        }
    }

    /// Commit, then write a quantized high-quality JPEG of the working image
    /// to a fresh file in the export directory.
    pub fn export(&mut self) -> Result<PathBuf, EditError> {
        if self.working.is_none() {
            return Err(EditError::ImageNotLoaded);
        }
        self.commit();
        let image = self.working.as_ref().ok_or(EditError::ImageNotLoaded)?;

        let compressed = quantize(image, self.config.export_discard_bits)?;
        let bytes = encode_jpeg(&compressed, self.config.export_quality)?;

        let dir = &self.config.export_dir;
        let path = write_export(&bytes, dir, &self.config.export_prefix).map_err(|source| EditError::ExportIo {
            path: dir.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "exported image");
        Ok(path)
    }

    /// Preview of the current image (pending result if any) without
    /// changing state.
    pub fn preview(&self) -> Result<Preview, EditError> {
        let image = self.current().ok_or(EditError::ImageNotLoaded)?;
        Ok(encode_preview(image, self.config.preview_quality, self.config.preview_downscale)?)
    }

    pub fn state(&self) -> SessionState {
        match (&self.working, &self.pending) {
            (None, _) => SessionState::Idle,
            (Some(_), None) => SessionState::Ready,
            (Some(_), Some(_)) => SessionState::Adjusting,
        }
    }

    /// The last committed image.
    pub fn working(&self) -> Option<&Raster> {
        self.working.as_ref()
    }

    /// The uncommitted result of the active control.
    pub fn pending(&self) -> Option<&Raster> {
        self.pending.as_ref().map(|p| &p.result)
    }

    /// What the user currently sees: the pending result, else the working
    /// image.
    pub fn current(&self) -> Option<&Raster> {
        self.pending().or(self.working.as_ref())
    }

    pub fn active_control(&self) -> Option<Control> {
        self.pending.as_ref().map(|p| p.control)
    }

    pub fn remembered(&self, control: Control) -> Option<&Adjustment> {
        self.memory.get(control)
    }

    /// The image an adjustment of `control` starts from, and whether using it
    /// means committing the pending result first.
    fn base_for(&self, control: Control) -> Result<(&Raster, bool), EditError> {
        let working = self.working.as_ref().ok_or(EditError::ImageNotLoaded)?;
        Ok(match &self.pending {
            Some(p) if p.control != control => (&p.result, true),
            _ => (working, false),
        })
    }
}
