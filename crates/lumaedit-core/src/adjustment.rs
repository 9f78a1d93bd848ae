//! Controls, their parameter values, and the per-control memory.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::transform::CropRequest;

/// An editing control the presentation layer can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Exposure,
    Contrast,
    Shadow,
    Midtone,
    Highlight,
    Noise,
    Sharpen,
    Crop,
    Rotate,
    Flip,
}

impl Control {
    /// Every control, in menu order.
    pub const ALL: [Control; 10] = [
        Control::Exposure,
        Control::Contrast,
        Control::Shadow,
        Control::Midtone,
        Control::Highlight,
        Control::Noise,
        Control::Sharpen,
        Control::Crop,
        Control::Rotate,
        Control::Flip,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Control::Exposure => "exposure",
            Control::Contrast => "contrast",
            Control::Shadow => "shadow",
            Control::Midtone => "midtone",
            Control::Highlight => "highlight",
            Control::Noise => "noise",
            Control::Sharpen => "sharpen",
            Control::Crop => "crop",
            Control::Rotate => "rotate",
            Control::Flip => "flip",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A control together with its parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Adjustment {
    Exposure { gamma: f32 },
    Contrast { factor: f32 },
    Shadow { factor: f32 },
    Midtone { factor: f32 },
    Highlight { factor: f32 },
    Noise { factor: f32 },
    Sharpen { strength: f32 },
    Crop(CropRequest),
    Rotate { degrees: f64 },
    Flip,
}

impl Adjustment {
    /// The control this adjustment drives.
    pub fn control(&self) -> Control {
        match self {
            Adjustment::Exposure { .. } => Control::Exposure,
            Adjustment::Contrast { .. } => Control::Contrast,
            Adjustment::Shadow { .. } => Control::Shadow,
            Adjustment::Midtone { .. } => Control::Midtone,
            Adjustment::Highlight { .. } => Control::Highlight,
            Adjustment::Noise { .. } => Control::Noise,
            Adjustment::Sharpen { .. } => Control::Sharpen,
            Adjustment::Crop(_) => Control::Crop,
            Adjustment::Rotate { .. } => Control::Rotate,
            Adjustment::Flip => Control::Flip,
        }
    }

    /// The value a control starts from when nothing was remembered for it,
    /// for an image of the given size.
    ///
    /// Every neutral value except `Flip` leaves the image unchanged. The
    /// neutral crop keeps the image's own aspect ratio over the full frame.
    pub fn neutral(control: Control, width: u32, height: u32) -> Adjustment {
        match control {
            Control::Exposure => Adjustment::Exposure { gamma: 1.0 },
            Control::Contrast => Adjustment::Contrast { factor: 1.0 },
            Control::Shadow => Adjustment::Shadow { factor: 1.0 },
            Control::Midtone => Adjustment::Midtone { factor: 1.0 },
            Control::Highlight => Adjustment::Highlight { factor: 1.0 },
            Control::Noise => Adjustment::Noise { factor: 0.0 },
            Control::Sharpen => Adjustment::Sharpen { strength: 0.0 },
            Control::Crop => {
                let ratio = if height == 0 { 1.0 } else { width as f64 / height as f64 };
                Adjustment::Crop(CropRequest::new(ratio, 0, 0))
            }
            Control::Rotate => Adjustment::Rotate { degrees: 0.0 },
            Control::Flip => Adjustment::Flip,
        }
    }
}

/// Last value supplied for each control since the image was opened.
#[derive(Debug, Clone, Default)]
pub struct ControlMemory {
    values: HashMap<Control, Adjustment>,
}

impl ControlMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an adjustment under its own control.
    pub fn remember(&mut self, adjustment: Adjustment) {
        self.values.insert(adjustment.control(), adjustment);
    }

    pub fn get(&self, control: Control) -> Option<&Adjustment> {
        self.values.get(&control)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
