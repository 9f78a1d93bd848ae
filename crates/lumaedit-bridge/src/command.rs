//! Commands queued from the caller to the editor worker.

use std::fmt;
use std::path::PathBuf;

use lumaedit_core::{Adjustment, Control, EditError, Preview};
use tokio::sync::oneshot;

/// Callback run on the caller's thread once a command finishes.
pub type Completion<T> = Box<dyn FnOnce(Result<T, EditError>) + Send + 'static>;

/// A completion bound to its result, ready to run on the caller's thread.
pub(crate) type Dispatch = Box<dyn FnOnce() + Send + 'static>;

pub(crate) enum Command {
    Open {
        path: PathBuf,
        reply: oneshot::Sender<Result<(), EditError>>,
    },
    Apply {
        adjustment: Adjustment,
        done: Completion<Preview>,
    },
    Restore {
        control: Control,
        done: Completion<Preview>,
    },
    Export {
        done: Completion<PathBuf>,
    },
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::Open { .. } => "open",
            Command::Apply { .. } => "apply",
            Command::Restore { .. } => "restore",
            Command::Export { .. } => "export",
        }
    }

    /// Whether running `next` straight after `self` makes `self` redundant:
    /// both are applies of the same control, so `next` recomputes the same
    /// pending result from the same working image.
    pub(crate) fn is_superseded_by(&self, next: &Command) -> bool {
        match (self, next) {
            (Command::Apply { adjustment: a, .. }, Command::Apply { adjustment: b, .. }) => {
                a.control() == b.control()
            }
            _ => false,
        }
    }

    /// Resolve the command with `err` without running it.
    pub(crate) fn fail(self, err: EditError) -> Option<Dispatch> {
        match self {
            Command::Apply { done, .. } | Command::Restore { done, .. } => Some(Box::new(move || done(Err(err)))),
            Command::Export { done } => Some(Box::new(move || done(Err(err)))),
            Command::Open { reply, .. } => {
                let _ = reply.send(Err(err));
                None
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Open { path, .. } => f.debug_struct("Open").field("path", path).finish(),
            Command::Apply { adjustment, .. } => f.debug_struct("Apply").field("adjustment", adjustment).finish(),
            Command::Restore { control, .. } => f.debug_struct("Restore").field("control", control).finish(),
            Command::Export { .. } => f.write_str("Export"),
        }
    }
}
