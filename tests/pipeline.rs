use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use chill::engine::{Runner, RunnerConfig, RunnerOptions};
use chill::errors::ChillError;
use chill::exec::{CommandSpec, CommandSupervisor};
use chill::watch::{abort_channel, gather, spawn_matcher, FileWatcher, PathMatcher};
use chill_test_utils::{init_tracing, with_timeout, FakeProcessBackend, TempTree};

const DEBOUNCE: Duration = Duration::from_millis(150);

fn go_matcher() -> PathMatcher {
    PathMatcher::new(["*.go"]).unwrap()
}

fn start_pipeline(tree: &TempTree) -> (tokio::sync::oneshot::Sender<()>, mpsc::Receiver<PathBuf>) {
    let (abort_tx, abort) = abort_channel();
    let watcher = FileWatcher::new(tree.root(), vec!["go".to_string()]).unwrap();
    let changes = watcher.spawn(abort);
    (abort_tx, spawn_matcher(changes, go_matcher()))
}

async fn eventually(check: impl Fn() -> bool) {
    with_timeout(async {
        while !check() {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn matching_write_produces_one_batch() {
    init_tracing();
    let tree = TempTree::new();
    let (_abort, mut matched) = start_pipeline(&tree);

    let main = tree.write("main.go", "package main");

    let first = with_timeout(matched.recv()).await.unwrap();
    let (batch, _) = gather(first, &mut matched, DEBOUNCE).await;

    assert_eq!(batch.into_paths(), vec![main]);
}

#[tokio::test]
async fn non_matching_write_produces_nothing() {
    init_tracing();
    let tree = TempTree::new();
    let (_abort, mut matched) = start_pipeline(&tree);

    tree.write("readme.md", "# notes");

    let got = timeout(Duration::from_millis(600), matched.recv()).await;
    assert!(got.is_err(), "unexpected change: {got:?}");
}

#[tokio::test]
async fn files_in_new_directories_are_picked_up() {
    init_tracing();
    let tree = TempTree::new();
    let (_abort, mut matched) = start_pipeline(&tree);

    tree.mkdir("pkg");
    // Let the watcher subscribe to the new directory before writing into it.
    sleep(Duration::from_millis(300)).await;
    let util = tree.write("pkg/util.go", "package pkg");

    let first = with_timeout(matched.recv()).await.unwrap();
    let (batch, _) = gather(first, &mut matched, DEBOUNCE).await;

    assert_eq!(batch.into_paths(), vec![util]);
}

#[tokio::test]
async fn abort_closes_the_stream() {
    init_tracing();
    let tree = TempTree::new();
    let (abort, mut matched) = start_pipeline(&tree);

    abort.send(()).unwrap();

    assert_eq!(with_timeout(matched.recv()).await, None);
}

fn runner_config(tree: &TempTree) -> RunnerConfig {
    RunnerConfig {
        root: tree.root().to_path_buf(),
        matcher: go_matcher(),
        extensions: vec!["go".to_string()],
        options: RunnerOptions {
            settle_delay: Duration::from_millis(50),
            debounce: DEBOUNCE,
            grace: Duration::from_millis(200),
        },
    }
}

#[tokio::test]
async fn runner_restarts_on_change_and_stops_on_exit() {
    init_tracing();
    let tree = TempTree::new();
    tree.write("main.go", "package main");

    let backend = FakeProcessBackend::new();
    let supervisor = CommandSupervisor::new(
        Some(CommandSpec::new("go", ["run", "."])),
        backend.clone(),
    );
    let (runner, exit) = Runner::new(runner_config(&tree), supervisor);
    let task = tokio::spawn(runner.start());

    eventually(|| backend.counts().spawned == 1).await;

    tree.write("main.go", "package main // edited");
    tree.write("lib.go", "package main");
    eventually(|| backend.counts().spawned == 2).await;

    // A burst inside one window is a single restart.
    sleep(DEBOUNCE * 3).await;
    assert_eq!(backend.counts().spawned, 2);

    with_timeout(exit.exit()).await;

    let counts = backend.counts();
    assert_eq!(counts.stop_requests, 2);
    assert_eq!(counts.live, 0);
    assert_eq!(counts.leaked, 0);
    with_timeout(task).await.unwrap();
}

#[tokio::test]
async fn runner_ignores_non_matching_changes() {
    init_tracing();
    let tree = TempTree::new();

    let backend = FakeProcessBackend::new();
    let supervisor = CommandSupervisor::new(Some(CommandSpec::new("go", ["test"])), backend.clone());
    let (runner, exit) = Runner::new(runner_config(&tree), supervisor);
    let task = tokio::spawn(runner.start());

    eventually(|| backend.counts().spawned == 1).await;

    tree.write("notes.txt", "hello");
    sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.counts().spawned, 1);

    with_timeout(exit.exit()).await;
    assert_eq!(backend.counts().live, 0);
    with_timeout(task).await.unwrap();
}

#[tokio::test]
async fn exit_after_runner_finished_returns_immediately() {
    init_tracing();
    let tree = TempTree::new();

    let backend = FakeProcessBackend::new();
    let supervisor = CommandSupervisor::new(None, backend.clone());
    let (runner, exit) = Runner::new(runner_config(&tree), supervisor);
    drop(runner);

    with_timeout(exit.exit()).await;
    assert_eq!(backend.counts().spawn_attempts, 0);
}

#[tokio::test]
async fn exit_during_debounce_does_not_start_another_instance() {
    init_tracing();
    let tree = TempTree::new();
    tree.write("main.go", "package main");

    let backend = FakeProcessBackend::new();
    let supervisor = CommandSupervisor::new(Some(CommandSpec::new("go", ["run", "."])), backend.clone());
    let mut config = runner_config(&tree);
    config.options.debounce = Duration::from_millis(1500);
    let (runner, exit) = Runner::new(config, supervisor);
    let task = tokio::spawn(runner.start());

    eventually(|| backend.counts().spawned == 1).await;

    tree.write("main.go", "package main // edited");
    // Inside the debounce window.
    sleep(Duration::from_millis(300)).await;
    with_timeout(exit.exit()).await;

    let counts = backend.counts();
    assert_eq!(counts.spawned, 1);
    assert_eq!(counts.stop_requests, 1);
    assert_eq!(counts.live, 0);
    with_timeout(task).await.unwrap();
}

#[tokio::test]
async fn watcher_init_failure_runs_the_command_once() {
    init_tracing();
    let tree = TempTree::new();

    let backend = FakeProcessBackend::new();
    let supervisor = CommandSupervisor::new(Some(CommandSpec::new("go", ["run", "."])), backend.clone());
    let (runner, exit) = Runner::new(runner_config(&tree), supervisor);
    let init_error = ChillError::Watch(notify::Error::generic("inotify instance limit reached"));
    let task = tokio::spawn(runner.start_with(Err(init_error)));

    eventually(|| backend.counts().spawned == 1).await;

    tree.write("main.go", "package main");
    sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.counts().spawned, 1);

    with_timeout(exit.exit()).await;

    let counts = backend.counts();
    assert_eq!(counts.stop_requests, 1);
    assert_eq!(counts.live, 0);
    with_timeout(task).await.unwrap();
}
