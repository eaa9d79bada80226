// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the configured command,
//! using `tokio::process::Command`, and for stopping it again.
//!
//! - [`backend`] defines the `ProcessBackend` / `ProcessHandle` seam.
//! - [`process`] is the production backend.
//! - [`supervisor`] owns the start / terminate lifecycle of the single
//!   command instance.

pub mod backend;
pub mod process;
pub mod supervisor;

pub use backend::{CommandSpec, ProcessBackend, ProcessFuture, ProcessHandle};
pub use process::TokioProcessBackend;
pub use supervisor::{CommandSupervisor, SupervisorState, DEFAULT_GRACE};
