//! The asynchronous command interface in front of an edit session.
//!
//! The bridge owns a tokio runtime with a single worker task. Commands are
//! queued in issue order and executed strictly one at a time on the blocking
//! pool, so two applies can never race and an export always sees every apply
//! issued before it. Completions are not run on the worker: they are pushed
//! onto a channel and run by whichever thread calls
//! [`EditorBridge::dispatch_completions`] or
//! [`EditorBridge::wait_for_completion`], normally the UI thread.
//!
//! ```ignore
//! let bridge = EditorBridge::new(EditorConfig::default())?;
//! bridge.open("photo.jpg")?;
//! bridge.set_midtone(0.8, |result| show(result));
//! loop {
//!     bridge.dispatch_completions();
//!     // ... draw a frame ...
//! }
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use lumaedit_core::{Adjustment, Control, CropRequest, EditError, EditorConfig, Preview, Session, SessionState};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};

use crate::command::{Command, Completion, Dispatch};

/// Asynchronous front end of one edit session.
pub struct EditorBridge {
    commands: mpsc::UnboundedSender<Command>,
    completions_tx: Sender<Dispatch>,
    completions_rx: Receiver<Dispatch>,
    // Dropped last so the worker sees the closed queue first.
    _runtime: Runtime,
}

impl EditorBridge {
    /// Start the worker for a fresh session.
    pub fn new(config: EditorConfig) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("lumaedit-worker")
            .build()?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = crossbeam_channel::unbounded();

        let coalesce = config.coalesce_scrubbing;
        let session = Arc::new(Mutex::new(Session::new(config)));
        runtime.spawn(run_worker(session, cmd_rx, done_tx.clone(), coalesce));

        Ok(Self {
            commands: cmd_tx,
            completions_tx: done_tx,
            completions_rx: done_rx,
            _runtime: runtime,
        })
    }

    /// Open an image, blocking until it is decoded.
    ///
    /// Must not be called from inside an async context.
    pub fn open(&self, path: impl Into<PathBuf>) -> Result<(), EditError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Open {
                path: path.into(),
                reply,
            })
            .map_err(|_| EditError::WorkerUnavailable)?;
        rx.blocking_recv().map_err(|_| EditError::WorkerUnavailable)?
    }

    /// Queue an adjustment. `done` receives a preview of the pending result.
    pub fn apply<F>(&self, adjustment: Adjustment, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.submit(Command::Apply {
            adjustment,
            done: Box::new(done),
        });
    }

    /// Queue a restore of `control`'s remembered value.
    pub fn restore<F>(&self, control: Control, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.submit(Command::Restore {
            control,
            done: Box::new(done),
        });
    }

    /// Queue an export. `done` receives the written file path.
    pub fn export<F>(&self, done: F)
    where
        F: FnOnce(Result<PathBuf, EditError>) + Send + 'static,
    {
        self.submit(Command::Export { done: Box::new(done) });
    }

    pub fn set_exposure<F>(&self, gamma: f32, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Exposure { gamma }, done);
    }

    pub fn set_contrast<F>(&self, factor: f32, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Contrast { factor }, done);
    }

    pub fn set_shadow<F>(&self, factor: f32, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Shadow { factor }, done);
    }

    pub fn set_midtone<F>(&self, factor: f32, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Midtone { factor }, done);
    }

    pub fn set_highlight<F>(&self, factor: f32, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Highlight { factor }, done);
    }

    pub fn reduce_noise<F>(&self, factor: f32, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Noise { factor }, done);
    }

    pub fn sharpen<F>(&self, strength: f32, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Sharpen { strength }, done);
    }

    /// Crop to `aspect_ratio` over a full-size window at `(x, y)`.
    pub fn crop<F>(&self, aspect_ratio: f64, x: i32, y: i32, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Crop(CropRequest::new(aspect_ratio, x, y)), done);
    }

    /// Rotate clockwise by `degrees`.
    pub fn rotate<F>(&self, degrees: f64, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Rotate { degrees }, done);
    }

    pub fn flip<F>(&self, done: F)
    where
        F: FnOnce(Result<Preview, EditError>) + Send + 'static,
    {
        self.apply(Adjustment::Flip, done);
    }

    /// Run every completion that is ready, on the calling thread.
    pub fn dispatch_completions(&self) -> usize {
        let mut count = 0;
        while let Ok(dispatch) = self.completions_rx.try_recv() {
            dispatch();
            count += 1;
        }
        count
    }

    /// Wait up to `timeout` for a completion, then run it and any others
    /// already ready. Returns how many ran.
    pub fn wait_for_completion(&self, timeout: Duration) -> usize {
        match self.completions_rx.recv_timeout(timeout) {
            Ok(dispatch) => {
                dispatch();
                1 + self.dispatch_completions()
            }
            Err(_) => 0,
        }
    }

    fn submit(&self, cmd: Command) {
        if let Err(mpsc::error::SendError(cmd)) = self.commands.send(cmd) {
            tracing::error!(command = cmd.name(), "editor worker is gone");
            if let Some(dispatch) = cmd.fail(EditError::WorkerUnavailable) {
                let _ = self.completions_tx.send(dispatch);
            }
        }
    }
}

async fn run_worker(
    session: Arc<Mutex<Session>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    completions: Sender<Dispatch>,
    coalesce: bool,
) {
    tracing::debug!(coalesce, "editor worker started");
    let mut next: Option<Command> = None;
    // Whether the session holds an image as of the last executed command.
    let mut loaded = false;

    loop {
        let cmd = match next.take() {
            Some(cmd) => cmd,
            None => match commands.recv().await {
                Some(cmd) => cmd,
                None => break,
            },
        };

        if coalesce {
            if let Ok(following) = commands.try_recv() {
                if cmd.is_superseded_by(&following) {
                    if !loaded {
                        tracing::warn!(command = cmd.name(), "no image loaded, dropping command");
                    } else {
                        let described = format!("{cmd:?}");
                        if let Some(dispatch) = cmd.fail(EditError::Superseded) {
                            tracing::debug!(cmd = %described, "skipping superseded command");
                            let _ = completions.send(dispatch);
                        }
                    }
                    next = Some(following);
                    continue;
                }
                next = Some(following);
            }
        }

        let name = cmd.name();
        let session = Arc::clone(&session);
        let joined = tokio::task::spawn_blocking(move || {
            let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
            let dispatch = execute(&mut session, cmd);
            (dispatch, session.state() != SessionState::Idle)
        })
        .await;

        match joined {
            Ok((dispatch, now_loaded)) => {
                loaded = now_loaded;
                if let Some(dispatch) = dispatch {
                    if completions.send(dispatch).is_err() {
                        break;
                    }
                }
            }
            Err(err) => tracing::error!(command = name, "editor command panicked: {err}"),
        }
    }

    tracing::debug!("editor worker stopped");
}

/// Run one command against the session, returning its bound completion.
fn execute(session: &mut Session, cmd: Command) -> Option<Dispatch> {
    match cmd {
        Command::Open { path, reply } => {
            let result = session.open(&path);
            if let Err(err) = &result {
                tracing::warn!(path = %path.display(), "open failed: {err}");
            }
            let _ = reply.send(result);
            None
        }
        Command::Apply { adjustment, done } => deliver("apply", session.apply(adjustment), done),
        Command::Restore { control, done } => deliver("restore", session.restore(control), done),
        Command::Export { done } => deliver("export", session.export(), done),
    }
}

/// Bind a result to its completion. Commands issued with no image open are
/// logged and dropped without running their completion.
fn deliver<T: Send + 'static>(name: &'static str, result: Result<T, EditError>, done: Completion<T>) -> Option<Dispatch> {
    match result {
        Err(EditError::ImageNotLoaded) => {
            tracing::warn!(command = name, "no image loaded, dropping command");
            None
        }
        result => Some(Box::new(move || done(result))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(30);

    fn write_gray_png(dir: &std::path::Path, value: u8) -> PathBuf {
        let path = dir.join("gray.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([value, value, value, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_open_missing_file_reports_decode_failure() {
        let bridge = EditorBridge::new(EditorConfig::default()).unwrap();
        let err = bridge.open("/no/such/file.png").unwrap_err();
        assert!(matches!(err, EditError::DecodeFailure(_)));
    }

    #[test]
    fn test_completion_runs_only_on_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = EditorBridge::new(EditorConfig::default()).unwrap();
        bridge.open(write_gray_png(dir.path(), 128)).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let caller = std::thread::current().id();
        bridge.set_exposure(1.5, move |result| {
            assert!(result.is_ok());
            assert_eq!(std::thread::current().id(), caller);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bridge.wait_for_completion(WAIT), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_commands_before_open_are_dropped() {
        let bridge = EditorBridge::new(EditorConfig::default()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&calls);
        bridge.flip(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let seen = Arc::clone(&calls);
        bridge.export(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        // A later open is queued behind both commands, so once it returns
        // they have already been processed.
        let dir = tempfile::tempdir().unwrap();
        bridge.open(write_gray_png(dir.path(), 10)).unwrap();
        assert_eq!(bridge.dispatch_completions(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_parameter_reaches_callback() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = EditorBridge::new(EditorConfig::default()).unwrap();
        bridge.open(write_gray_png(dir.path(), 90)).unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        bridge.set_contrast(-1.0, move |result| {
            tx.send(matches!(result, Err(EditError::InvalidParameter(_)))).unwrap();
        });
        bridge.wait_for_completion(WAIT);
        assert!(rx.try_recv().unwrap());
    }

    #[test]
    fn test_coalescing_skips_superseded_apply() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = EditorBridge::new(EditorConfig {
            coalesce_scrubbing: true,
            ..EditorConfig::default()
        })
        .unwrap();
        bridge.open(write_gray_png(dir.path(), 128)).unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        for factor in [0.2f32, 0.4, 0.6, 0.8] {
            let tx = tx.clone();
            bridge.set_midtone(factor, move |result| {
                tx.send((factor, result.is_ok())).unwrap();
            });
        }
        drop(tx);

        let mut outcomes = Vec::new();
        while outcomes.len() < 4 {
            assert!(bridge.wait_for_completion(WAIT) > 0, "timed out waiting for completions");
            outcomes.extend(rx.try_iter());
        }

        // Every callback fires exactly once and the last value always runs.
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().any(|&(f, ok)| f == 0.8 && ok));
    }
}
