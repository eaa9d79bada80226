use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::sleep;

use chill::watch::{gather, WindowEnd};
use chill_test_utils::{init_tracing, with_timeout};

fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}

#[tokio::test]
async fn window_is_measured_from_the_last_arrival() {
    init_tracing();
    let delay = Duration::from_millis(500);
    let (tx, mut rx) = mpsc::channel::<PathBuf>(1);

    let started = Instant::now();
    let producer = tokio::spawn(async move {
        sleep(delay / 2).await;
        tx.send(p("a.txt")).await.unwrap();
        // Keep the stream open past the window so only the timer can end it.
        sleep(delay * 3).await;
        drop(tx);
    });

    let (batch, end) = with_timeout(gather(p("b.txt"), &mut rx, delay)).await;
    let elapsed = started.elapsed();

    assert_eq!(end, WindowEnd::Quiet);

    assert_eq!(batch.paths(), &[p("a.txt"), p("b.txt")]);
    // Roughly delay/2 + delay, clearly more than a window measured from the first path.
    assert!(elapsed >= delay + delay / 2 - Duration::from_millis(50), "{elapsed:?}");
    assert!(elapsed < delay * 3, "{elapsed:?}");

    producer.abort();
}

#[tokio::test]
async fn returns_sorted_deduplicated_union() {
    init_tracing();
    let (tx, mut rx) = mpsc::channel::<PathBuf>(16);

    for path in ["/w/c.go", "/w/a.go", "/w/c.go", "/w/b.go", "/w/a.go"] {
        tx.send(p(path)).await.unwrap();
    }

    let (batch, _) = with_timeout(gather(p("/w/b.go"), &mut rx, Duration::from_millis(100))).await;

    assert_eq!(batch.paths(), &[p("/w/a.go"), p("/w/b.go"), p("/w/c.go")]);
    assert_eq!(batch.len(), 3);
    assert!(!batch.is_empty());
    drop(tx);
}

#[tokio::test]
async fn single_change_makes_a_one_element_batch() {
    init_tracing();
    let (_tx, mut rx) = mpsc::channel::<PathBuf>(1);

    let (batch, end) = with_timeout(gather(p("/w/main.go"), &mut rx, Duration::from_millis(50))).await;

    assert_eq!(batch.into_paths(), vec![p("/w/main.go")]);
    assert_eq!(end, WindowEnd::Quiet);
}

#[tokio::test]
async fn closed_stream_ends_the_window_early() {
    init_tracing();
    let (tx, mut rx) = mpsc::channel::<PathBuf>(4);
    tx.send(p("/w/x.go")).await.unwrap();
    drop(tx);

    let started = Instant::now();
    let (batch, end) = with_timeout(gather(p("/w/y.go"), &mut rx, Duration::from_secs(3))).await;

    assert_eq!(batch.paths(), &[p("/w/x.go"), p("/w/y.go")]);
    assert_eq!(end, WindowEnd::Closed);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn batch_displays_as_comma_joined_paths() {
    let (_tx, mut rx) = mpsc::channel::<PathBuf>(1);
    let (tx2, mut rx2) = mpsc::channel::<PathBuf>(1);
    tx2.send(p("/w/a.go")).await.unwrap();

    let (single, _) = gather(p("/w/a.go"), &mut rx, Duration::from_millis(10)).await;
    let (pair, _) = gather(p("/w/b.go"), &mut rx2, Duration::from_millis(10)).await;

    assert_eq!(single.to_string(), "/w/a.go");
    assert_eq!(pair.to_string(), "/w/a.go, /w/b.go");
}
