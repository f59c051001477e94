// tests/scheduler.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nub::daemon::scheduler::run_until;

#[tokio::test(start_paused = true)]
async fn runs_immediately_then_once_per_interval() {
    let runs = Arc::new(AtomicUsize::new(0));
    let period = Duration::from_secs(60);

    let counter = runs.clone();
    run_until(
        period,
        move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        },
        tokio::time::sleep(period * 7 / 2),
    )
    .await;

    // t = 0, 60, 120, 180
    assert_eq!(runs.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_a_run_in_progress() {
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let (s, f) = (started.clone(), finished.clone());
    run_until(
        Duration::from_secs(60),
        move || {
            let (s, f) = (s.clone(), f.clone());
            async move {
                s.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(3600)).await;
                f.fetch_add(1, Ordering::SeqCst);
            }
        },
        tokio::time::sleep(Duration::from_secs(10)),
    )
    .await;

    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 0);
}
