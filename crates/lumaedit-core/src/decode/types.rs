use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Not a format this build can decode.
    #[error("Unsupported image format")]
    InvalidFormat,

    #[error("Corrupt image data: {0}")]
    CorruptedFile(String),

    #[error("Image has no pixels")]
    Empty,
}

/// Correction for an EXIF orientation tag: an optional horizontal mirror
/// followed by a number of clockwise quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    pub mirrored: bool,
    pub quarter_turns: u8,
}

impl Orientation {
    /// Map an EXIF orientation value (1-8). Unknown values are upright.
    pub fn from_exif(value: u32) -> Self {
        let (mirrored, quarter_turns) = match value {
            2 => (true, 0),
            3 => (false, 2),
            4 => (true, 2),
            5 => (true, 3),
            6 => (false, 1),
            7 => (true, 1),
            8 => (false, 3),
            _ => (false, 0),
        };
        Self {
            mirrored,
            quarter_turns,
        }
    }

    pub fn is_upright(self) -> bool {
        !self.mirrored && self.quarter_turns == 0
    }

    /// Turn `img` upright.
    pub fn correct(self, img: DynamicImage) -> DynamicImage {
        let img = if self.mirrored { img.fliph() } else { img };
        match self.quarter_turns % 4 {
            1 => img.rotate90(),
            2 => img.rotate180(),
            3 => img.rotate270(),
            _ => img,
        }
    }
}
