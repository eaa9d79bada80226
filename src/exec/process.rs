// src/exec/process.rs

//! Production process backend built on `tokio::process`.

use std::io;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::errors::{ChillError, Result};
use crate::exec::backend::{CommandSpec, ProcessBackend, ProcessFuture, ProcessHandle};

/// Spawns commands as real child processes.
///
/// - stdout/stderr are inherited so command output passes straight through
/// - stdin is closed
/// - on unix each command leads its own process group, and stop/kill
///   signals go to the whole group so helpers spawned by the command go
///   down with it
#[derive(Debug, Clone, Default)]
pub struct TokioProcessBackend;

impl ProcessBackend for TokioProcessBackend {
    fn spawn(&mut self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| ChillError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        debug!(pid = ?child.id(), cmd = %spec, "spawned command process");
        Ok(Box::new(TokioProcess { child }))
    }
}

struct TokioProcess {
    child: Child,
}

impl ProcessHandle for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn request_stop(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            match self.child.id() {
                Some(pid) => signal_group(pid, libc::SIGTERM),
                // Already reaped.
                None => Ok(()),
            }
        }

        #[cfg(not(unix))]
        {
            self.child.start_kill()
        }
    }

    fn wait(&mut self) -> ProcessFuture<'_, io::Result<Option<i32>>> {
        Box::pin(async move {
            let status = self.child.wait().await?;
            Ok(status.code())
        })
    }

    fn kill(&mut self) -> ProcessFuture<'_, io::Result<()>> {
        Box::pin(async move {
            #[cfg(unix)]
            {
                if let Some(pid) = self.child.id() {
                    signal_group(pid, libc::SIGKILL)?;
                    self.child.wait().await?;
                    return Ok(());
                }
            }

            self.child.kill().await
        })
    }
}

/// Send `signal` to the process group led by `pid`.
///
/// A group that is already gone is not an error.
#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) -> io::Result<()> {
    let pgid = pid as libc::pid_t;
    // Negative pid targets the process group, which `process_group(0)` set to
    // the child's pid.
    let ret = unsafe { libc::kill(-pgid, signal) };
    if ret == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}
