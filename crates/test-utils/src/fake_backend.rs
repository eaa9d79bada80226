use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use chill::errors::{ChillError, Result};
use chill::exec::{CommandSpec, ProcessBackend, ProcessFuture, ProcessHandle};

/// Snapshot of what a [`FakeProcessBackend`] has seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeCounts {
    pub spawn_attempts: usize,
    pub spawned: usize,
    pub stop_requests: usize,
    pub kills: usize,
    /// Instances that have neither exited nor been killed.
    pub live: usize,
    /// Instances dropped while still alive.
    pub leaked: usize,
}

#[derive(Debug, Default)]
struct FakeState {
    counts: FakeCounts,
    specs: Vec<CommandSpec>,
    fail_spawns: bool,
    ignore_stop: bool,
    next_pid: u32,
}

/// A process backend that never launches anything.
///
/// - records every spawn request
/// - "processes" exit as soon as a stop is requested, unless the backend
///   is stubborn, in which case only a kill ends them
/// - can be told to fail spawns
#[derive(Debug, Clone, Default)]
pub struct FakeProcessBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances ignore stop requests and have to be killed.
    pub fn stubborn() -> Self {
        let backend = Self::new();
        backend.lock().ignore_stop = true;
        backend
    }

    pub fn set_fail_spawns(&self, fail: bool) {
        self.lock().fail_spawns = fail;
    }

    pub fn counts(&self) -> FakeCounts {
        self.lock().counts.clone()
    }

    pub fn spawned_specs(&self) -> Vec<CommandSpec> {
        self.lock().specs.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(&mut self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        let mut state = self.lock();
        state.counts.spawn_attempts += 1;
        state.specs.push(spec.clone());

        if state.fail_spawns {
            return Err(ChillError::Spawn {
                program: spec.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "fake spawn failure"),
            });
        }

        state.counts.spawned += 1;
        state.counts.live += 1;
        state.next_pid += 1;
        let pid = 10_000 + state.next_pid;

        Ok(Box::new(FakeProcess {
            state: Arc::clone(&self.state),
            pid,
            stopped: false,
            exited: false,
        }))
    }
}

struct FakeProcess {
    state: Arc<Mutex<FakeState>>,
    pid: u32,
    stopped: bool,
    exited: bool,
}

impl FakeProcess {
    fn mark_exited(&mut self) {
        if !self.exited {
            self.exited = true;
            lock(&self.state).counts.live -= 1;
        }
    }
}

impl ProcessHandle for FakeProcess {
    fn id(&self) -> Option<u32> {
        (!self.exited).then_some(self.pid)
    }

    fn request_stop(&mut self) -> io::Result<()> {
        lock(&self.state).counts.stop_requests += 1;
        self.stopped = true;
        Ok(())
    }

    fn wait(&mut self) -> ProcessFuture<'_, io::Result<Option<i32>>> {
        Box::pin(async move {
            let ignore_stop = lock(&self.state).ignore_stop;
            if self.exited {
                return Ok(None);
            }
            if self.stopped && !ignore_stop {
                self.mark_exited();
                return Ok(Some(0));
            }
            std::future::pending::<io::Result<Option<i32>>>().await
        })
    }

    fn kill(&mut self) -> ProcessFuture<'_, io::Result<()>> {
        Box::pin(async move {
            lock(&self.state).counts.kills += 1;
            self.mark_exited();
            Ok(())
        })
    }
}

impl Drop for FakeProcess {
    fn drop(&mut self) {
        if !self.exited {
            let mut state = lock(&self.state);
            state.counts.leaked += 1;
            state.counts.live -= 1;
        }
    }
}
