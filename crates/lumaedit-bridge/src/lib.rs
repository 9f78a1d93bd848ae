//! lumaedit bridge - asynchronous front end for the edit session
//!
//! [`EditorBridge`] accepts edit commands from a UI or CLI thread, runs them
//! one at a time on a background worker and hands their completions back to
//! the caller's thread.

mod bridge;
mod command;

pub use bridge::EditorBridge;
pub use command::Completion;

pub use lumaedit_core::{Adjustment, Control, CropRequest, EditError, EditorConfig, Preview};
