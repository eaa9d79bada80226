// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a `ProcessBackend` instead of `tokio::process`
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation in [`super::process`].
//!
//! - `TokioProcessBackend` is the default implementation used by `chill`.
//! - Tests can provide their own backend that, for example, counts spawns,
//!   stop requests and kills without launching anything.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;

use crate::errors::Result;

/// Boxed future returned by [`ProcessHandle`] methods.
pub type ProcessFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Executable plus arguments used to start every command instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split an argv-style list into program and arguments.
    ///
    /// Returns `None` for an empty list, meaning "no command configured".
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Trait abstracting how command instances are launched.
pub trait ProcessBackend: Send {
    /// Launch a new instance of `spec` without waiting for it.
    fn spawn(&mut self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>>;
}

/// A live command instance.
pub trait ProcessHandle: Send {
    /// OS process id, if still known.
    fn id(&self) -> Option<u32>;

    /// Ask the process to stop on its own (SIGTERM on unix).
    fn request_stop(&mut self) -> io::Result<()>;

    /// Wait for the process to exit, returning its exit code if it had one.
    fn wait(&mut self) -> ProcessFuture<'_, io::Result<Option<i32>>>;

    /// Forcefully kill the process and reap it.
    fn kill(&mut self) -> ProcessFuture<'_, io::Result<()>>;
}
