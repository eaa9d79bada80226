// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::{resolve, ConfigFile, Settings};
use crate::engine::Runner;
use crate::exec::{CommandSupervisor, TokioProcessBackend};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides, optional save)
/// - command supervisor
/// - runner (watcher, match stage, debounce loop)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let (cfg, settings) = resolve(&config_path, &args.overrides(), args.save)?;

    if args.dry_run {
        print_dry_run(&cfg, &settings);
        return Ok(());
    }

    let (runner_config, command) = settings.into_parts();
    if command.is_none() {
        info!("no command configured; watching only");
    }

    let supervisor = CommandSupervisor::new(command, TokioProcessBackend);
    let (runner, exit) = Runner::new(runner_config, supervisor);

    // Ctrl-C → graceful shutdown.
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("got interrupt signal"),
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
        }
        exit.exit().await;
    });

    runner.start().await;
    Ok(())
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile, settings: &Settings) {
    println!("chill dry-run");
    println!("  directory = {}", settings.root.display());
    println!("  patterns = {:?}", cfg.patterns);
    println!("  extensions = {:?}", cfg.extensions);
    match &settings.command {
        Some(cmd) => println!("  command = {cmd}"),
        None => println!("  command = (none)"),
    }
    println!(
        "  settle_ms = {}, debounce_ms = {}, grace_ms = {}",
        cfg.settle_ms, cfg.debounce_ms, cfg.grace_ms
    );

    debug!("dry-run complete (no execution)");
}
