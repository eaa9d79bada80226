// src/engine/mod.rs

//! Orchestration engine for chill.
//!
//! [`runner`] wires the watcher, the match stage, the debounce window and
//! the command supervisor into the steady-state restart loop, and exposes
//! the single shutdown entry point ([`ExitHandle`]).

pub mod runner;

pub use runner::{ExitHandle, Runner, RunnerConfig, RunnerOptions, RunnerState};
