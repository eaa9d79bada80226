// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Finding the directories to subscribe to (`scanner`).
//! - Matching changed filenames against glob patterns (`patterns`).
//! - Wiring up per-directory OS notifications via `notify` (`watcher`).
//! - Filtering and debouncing the resulting change stream (`aggregate`).
//!
//! It does **not** know about the supervised command; it only turns
//! filesystem changes into batches of paths.

pub mod aggregate;
pub mod patterns;
pub mod scanner;
pub mod watcher;

pub use aggregate::{gather, spawn_matcher, ChangeBatch, WindowEnd};
pub use patterns::{matches, PathMatcher};
pub use scanner::{scan_source_dirs, VCS_DIR_NAMES};
pub use watcher::{
    abort_channel, event_loop, plan_actions, AbortSignal, DirSubscriber, FileWatcher, WatchAction,
    WatchInput,
};
