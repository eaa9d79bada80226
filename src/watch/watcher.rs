// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace};

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::scanner::scan_source_dirs;

/// Receiving half of the single-use abort token.
///
/// Resolves once the paired sender fires or is dropped. Waiting again after
/// that returns immediately.
#[derive(Debug)]
pub struct AbortSignal {
    rx: oneshot::Receiver<()>,
    fired: bool,
}

impl AbortSignal {
    pub async fn wait(&mut self) {
        if !self.fired {
            let _ = (&mut self.rx).await;
            self.fired = true;
        }
    }
}

/// Create a connected abort sender / [`AbortSignal`] pair.
pub fn abort_channel() -> (oneshot::Sender<()>, AbortSignal) {
    let (tx, rx) = oneshot::channel();
    (tx, AbortSignal { rx, fired: false })
}

/// One input to the watcher loop.
#[derive(Debug)]
pub enum WatchInput {
    Notification(Event),
    Failure(notify::Error),
    Abort,
}

/// What the watcher loop does in response to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// A directory appeared and must be registered too.
    Subscribe(PathBuf),
    /// A file was written or created and goes downstream.
    Forward(PathBuf),
}

/// Decide what to do with a single notification.
///
/// - creations and entries renamed into a watched directory are stat'ed:
///   directories are subscribed, everything else is forwarded
/// - content writes are forwarded
/// - every other kind (metadata, access, removal, rename away) is ignored
pub fn plan_actions(event: &Event, fs: &dyn FileSystem) -> Vec<WatchAction> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .iter()
            .map(|path| {
                if fs.is_dir(path) {
                    WatchAction::Subscribe(path.clone())
                } else {
                    WatchAction::Forward(path.clone())
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => event
            .paths
            .iter()
            .cloned()
            .map(WatchAction::Forward)
            .collect(),
        _ => Vec::new(),
    }
}

/// Something directories can be registered with, one level deep.
///
/// Implemented for the OS watcher; the event loop only needs this much.
pub trait DirSubscriber: Send + 'static {
    fn subscribe(&mut self, dir: &Path) -> notify::Result<()>;
}

impl DirSubscriber for RecommendedWatcher {
    fn subscribe(&mut self, dir: &Path) -> notify::Result<()> {
        self.watch(dir, RecursiveMode::NonRecursive)
    }
}

/// Directory watcher with its OS notification handle already created.
///
/// Construction is split from [`FileWatcher::spawn`] so that a failure to
/// obtain the handle can be reported before any stream exists.
pub struct FileWatcher {
    root: PathBuf,
    extensions: Vec<String>,
    fs: Arc<dyn FileSystem>,
    watcher: RecommendedWatcher,
    raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("root", &self.root)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Obtain a notification handle for `root`.
    ///
    /// `extensions` decides which directories get registered up front, see
    /// [`scan_source_dirs`].
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Result<Self> {
        Self::with_fs(root, extensions, Arc::new(RealFileSystem))
    }

    pub fn with_fs(
        root: impl Into<PathBuf>,
        extensions: Vec<String>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        // Channel from the blocking notify callback into the async world.
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // Only fails once the loop is gone, at which point nobody cares.
                let _ = raw_tx.send(res);
            },
            Config::default(),
        )?;

        Ok(Self {
            root: root.into(),
            extensions,
            fs,
            watcher,
            raw_rx,
        })
    }

    /// Register the initial directories and start the event loop.
    ///
    /// Registration happens before this returns. The returned stream yields
    /// changed file paths until `abort` fires, then closes.
    ///
    /// Raw notifications are queued without limit between the OS callback
    /// and the loop. Back-pressure starts after that: the returned stream
    /// holds one path and sending waits for the consumer, so a slow consumer
    /// holds up notification processing while the raw queue grows.
    pub fn spawn(self, abort: AbortSignal) -> mpsc::Receiver<PathBuf> {
        let FileWatcher {
            root,
            extensions,
            fs,
            mut watcher,
            raw_rx,
        } = self;

        let mut dirs = scan_source_dirs(fs.as_ref(), &root, &extensions);
        if !dirs.contains(&root) {
            dirs.insert(0, root.clone());
        }

        for dir in &dirs {
            subscribe(&mut watcher, dir);
        }
        info!(root = ?root, directories = dirs.len(), "start watching");

        let (out_tx, out_rx) = mpsc::channel::<PathBuf>(1);
        tokio::spawn(event_loop(watcher, raw_rx, fs, out_tx, abort));
        out_rx
    }
}

fn subscribe<S: DirSubscriber>(watcher: &mut S, dir: &Path) {
    match watcher.subscribe(dir) {
        Ok(()) => trace!("watching directory {:?}", dir),
        Err(err) => error!(dir = ?dir, error = %err, "failed to watch directory"),
    }
}

async fn next_input(
    raw_rx: &mut mpsc::UnboundedReceiver<notify::Result<Event>>,
    abort: &mut AbortSignal,
) -> WatchInput {
    tokio::select! {
        biased;
        _ = abort.wait() => WatchInput::Abort,
        raw = raw_rx.recv() => match raw {
            Some(Ok(event)) => WatchInput::Notification(event),
            Some(Err(err)) => WatchInput::Failure(err),
            None => WatchInput::Abort,
        },
    }
}

/// Process raw notifications until `abort` fires or `raw_rx` closes.
///
/// New directories are registered with `watcher`; changed paths go to
/// `out`. Notification errors are logged and skipped. On exit `watcher` and
/// `out` are dropped, which ends the subscription and closes the stream.
pub async fn event_loop<S: DirSubscriber>(
    mut watcher: S,
    mut raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    fs: Arc<dyn FileSystem>,
    out: mpsc::Sender<PathBuf>,
    mut abort: AbortSignal,
) {
    'events: loop {
        match next_input(&mut raw_rx, &mut abort).await {
            WatchInput::Abort => break,
            WatchInput::Failure(err) => {
                error!(error = %err, "watch error");
            }
            WatchInput::Notification(event) => {
                trace!(?event, "received notify event");
                for action in plan_actions(&event, fs.as_ref()) {
                    match action {
                        WatchAction::Subscribe(dir) => {
                            trace!("add newly created directory {:?}", dir);
                            subscribe(&mut watcher, &dir);
                        }
                        WatchAction::Forward(path) => {
                            tokio::select! {
                                sent = out.send(path) => {
                                    if sent.is_err() {
                                        debug!("change consumer dropped; stopping watcher");
                                        break 'events;
                                    }
                                }
                                _ = abort.wait() => break 'events,
                            }
                        }
                    }
                }
            }
        }
    }

    // Dropping the handle ends the OS subscription; dropping `out` closes the stream.
    drop(watcher);
    drop(out);
    info!("file watcher stopped");
}
