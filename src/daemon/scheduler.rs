// src/daemon/scheduler.rs
use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

/// Shortest interval the daemon accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(60);

/// Run `job` immediately, then once per `every`, until `shutdown` resolves.
///
/// Ticks stay on a fixed grid: when a job overruns, one late tick fires
/// right away and the rest are skipped, there is no backlog burst. Shutdown
/// interrupts a job in progress.
pub async fn run_until<F, Fut, S>(every: Duration, mut job: F, shutdown: S)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    S: Future<Output = ()>,
{
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ticking = async {
        loop {
            // The first tick completes immediately.
            ticker.tick().await;
            job().await;
        }
    };

    tokio::select! {
        _ = ticking => {}
        _ = shutdown => {
            tracing::info!("shutdown requested, leaving scheduler loop");
        }
    }
}

/// Clamp a configured interval to the supported minimum.
pub fn effective_interval(configured: Duration) -> Duration {
    configured.max(MIN_INTERVAL)
}

/// Resolves on SIGTERM or Ctrl-C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
