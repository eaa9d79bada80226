// src/exec/supervisor.rs

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};

use crate::exec::backend::{CommandSpec, ProcessBackend, ProcessHandle};

/// Grace period for replacing a leftover instance unless
/// [`CommandSupervisor::with_grace`] says otherwise.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of the supervised command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Terminating,
}

/// Owns at most one live instance of the configured command.
///
/// Calls are strictly sequential (`&mut self`), so start and terminate never
/// race each other.
pub struct CommandSupervisor<B: ProcessBackend> {
    spec: Option<CommandSpec>,
    backend: B,
    live: Option<Box<dyn ProcessHandle>>,
    has_run: bool,
    grace: Duration,
    state: SupervisorState,
}

impl<B: ProcessBackend> std::fmt::Debug for CommandSupervisor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSupervisor")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .field("has_run", &self.has_run)
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> CommandSupervisor<B> {
    /// `spec = None` means no command is configured; every start is then a no-op.
    pub fn new(spec: Option<CommandSpec>, backend: B) -> Self {
        Self {
            spec,
            backend,
            live: None,
            has_run: false,
            grace: DEFAULT_GRACE,
            state: SupervisorState::Idle,
        }
    }

    /// Grace period used when `start` finds an instance still alive.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }

    /// Whether `start` has been called before.
    pub fn has_run_before(&self) -> bool {
        self.has_run
    }

    pub fn spec(&self) -> Option<&CommandSpec> {
        self.spec.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Launch a new instance.
    ///
    /// The very first start waits `settle_delay` before launching so the
    /// watch registration can settle; later starts launch immediately. Returns
    /// once the process has been spawned. Spawn failures are logged and leave
    /// the supervisor idle.
    pub async fn start(&mut self, settle_delay: Duration) {
        if self.live.is_some() {
            warn!("previous command instance still alive; terminating it first");
            self.terminate(self.grace).await;
        }

        let first_run = !self.has_run;
        self.has_run = true;

        let Some(spec) = self.spec.clone() else {
            debug!("no command configured; nothing to start");
            return;
        };

        self.state = SupervisorState::Starting;
        if first_run && !settle_delay.is_zero() {
            trace!(?settle_delay, "waiting before first command start");
            sleep(settle_delay).await;
        }

        match self.backend.spawn(&spec) {
            Ok(handle) => {
                info!(cmd = %spec, pid = ?handle.id(), "command started");
                self.live = Some(handle);
                self.state = SupervisorState::Running;
            }
            Err(err) => {
                error!(cmd = %spec, error = %err, "failed to start command");
                self.state = SupervisorState::Idle;
            }
        }
    }

    /// Stop the live instance, if any.
    ///
    /// Sends a graceful stop request, waits up to `grace` for the process to
    /// exit and kills it otherwise. The handle is cleared whichever way it
    /// went.
    pub async fn terminate(&mut self, grace: Duration) {
        let Some(mut handle) = self.live.take() else {
            trace!("no running command; terminate is a no-op");
            return;
        };

        self.state = SupervisorState::Terminating;
        let pid = handle.id();
        debug!(?pid, ?grace, "terminating command");

        if let Err(err) = handle.request_stop() {
            error!(?pid, error = %err, "failed to send stop request to command");
        }

        let exited = timeout(grace, handle.wait()).await;
        match exited {
            Ok(Ok(code)) => {
                debug!(?pid, exit_code = ?code, "command exited");
            }
            Ok(Err(err)) => {
                error!(?pid, error = %err, "failed waiting for command to exit; killing it");
                kill(handle.as_mut(), pid).await;
            }
            Err(_) => {
                debug!(?pid, "command did not exit within grace period; killing it");
                kill(handle.as_mut(), pid).await;
            }
        }

        self.state = SupervisorState::Idle;
    }
}

async fn kill(handle: &mut dyn ProcessHandle, pid: Option<u32>) {
    if let Err(err) = handle.kill().await {
        error!(?pid, error = %err, "failed to kill command");
    }
}
