// src/engine/runner.rs

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::exec::{CommandSupervisor, ProcessBackend};
use crate::watch::{
    abort_channel, gather, spawn_matcher, AbortSignal, FileWatcher, PathMatcher, WindowEnd,
};

/// Timings that shape the restart loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Pause before the very first command start.
    pub settle_delay: Duration,
    /// Quiet period that closes a change batch.
    pub debounce: Duration,
    /// Time a command gets to exit after a stop request before it is killed.
    pub grace: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(200),
            debounce: Duration::from_millis(500),
            grace: Duration::from_secs(2),
        }
    }
}

/// Everything the runner needs apart from the command itself.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Absolute directory to watch.
    pub root: PathBuf,
    pub matcher: PathMatcher,
    /// Extensions that mark a directory as worth subscribing to up front.
    pub extensions: Vec<String>,
    pub options: RunnerOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Created,
    Watching,
    Restarting,
    ShuttingDown,
    Stopped,
}

/// Single-use shutdown trigger for a [`Runner`].
///
/// `exit` consumes the handle, so the abort can only ever be delivered once.
#[derive(Debug)]
pub struct ExitHandle {
    abort_tx: oneshot::Sender<()>,
    stopped_rx: oneshot::Receiver<()>,
}

impl ExitHandle {
    /// Abort watching and wait until the runner has terminated its command.
    ///
    /// Returns immediately if the runner is already gone.
    pub async fn exit(self) {
        info!("shutting down");
        if self.abort_tx.send(()).is_err() {
            debug!("runner already stopped");
        }
        let _ = self.stopped_rx.await;
    }
}

/// The watch → debounce → restart loop.
pub struct Runner<B: ProcessBackend> {
    config: RunnerConfig,
    supervisor: CommandSupervisor<B>,
    abort: AbortSignal,
    stopped_tx: oneshot::Sender<()>,
    state: RunnerState,
}

impl<B: ProcessBackend> std::fmt::Debug for Runner<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> Runner<B> {
    pub fn new(config: RunnerConfig, supervisor: CommandSupervisor<B>) -> (Self, ExitHandle) {
        let (abort_tx, abort) = abort_channel();
        let (stopped_tx, stopped_rx) = oneshot::channel();

        let supervisor = supervisor.with_grace(config.options.grace);
        let runner = Self {
            config,
            supervisor,
            abort,
            stopped_tx,
            state: RunnerState::Created,
        };
        (runner, ExitHandle { abort_tx, stopped_rx })
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Run until the paired [`ExitHandle`] fires.
    ///
    /// Starts the command, then for every debounced batch of matching
    /// changes terminates it, logs the batch and starts it again. When the
    /// change stream closes the command is terminated one last time.
    pub async fn start(self) {
        let watcher = FileWatcher::new(self.config.root.clone(), self.config.extensions.clone());
        self.start_with(watcher).await;
    }

    /// Like [`Runner::start`], with the watcher already created by the caller.
    ///
    /// If creating it failed, the error is logged and the command is started
    /// once and never restarted; [`ExitHandle::exit`] still stops it.
    pub async fn start_with(self, watcher: Result<FileWatcher>) {
        let Runner {
            config,
            mut supervisor,
            abort,
            stopped_tx,
            mut state,
        } = self;
        let options = config.options;

        let changes = open_changes(watcher, abort);
        let mut matched = spawn_matcher(changes, config.matcher.clone());
        transition(&mut state, RunnerState::Watching);

        supervisor.start(options.settle_delay).await;

        while let Some(first) = matched.recv().await {
            transition(&mut state, RunnerState::Restarting);

            let (batch, end) = gather(first, &mut matched, options.debounce).await;
            if end == WindowEnd::Closed {
                debug!(count = batch.len(), "watching aborted during debounce; not restarting");
                break;
            }

            supervisor.terminate(options.grace).await;

            info!(count = batch.len(), "file changed: {}", batch);

            supervisor.start(options.settle_delay).await;
            transition(&mut state, RunnerState::Watching);
        }

        transition(&mut state, RunnerState::ShuttingDown);
        supervisor.terminate(options.grace).await;
        transition(&mut state, RunnerState::Stopped);

        let _ = stopped_tx.send(());
    }
}

fn transition(state: &mut RunnerState, next: RunnerState) {
    debug!(from = ?*state, to = ?next, "runner state");
    *state = next;
}

/// Start the file watcher, or fall back to a stream that stays silent until
/// abort when the OS handle could not be created.
fn open_changes(watcher: Result<FileWatcher>, abort: AbortSignal) -> mpsc::Receiver<PathBuf> {
    match watcher {
        Ok(watcher) => watcher.spawn(abort),
        Err(err) => {
            error!(
                error = %err,
                "failed to initialize watcher; the command will not be restarted"
            );
            closed_on_abort(abort)
        }
    }
}

fn closed_on_abort(mut abort: AbortSignal) -> mpsc::Receiver<PathBuf> {
    let (tx, rx) = mpsc::channel::<PathBuf>(1);
    tokio::spawn(async move {
        abort.wait().await;
        drop(tx);
    });
    rx
}
