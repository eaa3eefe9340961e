//! Fixed-interval refresh owned by a single task. A tick that lands while
//! the previous refresh is still running is skipped, and stopping the poller
//! (or dropping it) cancels both the timer and any refresh in flight.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_stream::{wrappers::IntervalStream, StreamExt};
use tracing::{debug, warn};

use crate::error::ClientResult;

#[derive(Debug, Default)]
pub struct PollStats {
    started: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl PollStats {
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

pub struct Poller {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    stats: Arc<PollStats>,
}

impl Poller {
    /// Starts polling; the first refresh fires immediately.
    pub fn spawn<F, Fut>(period: Duration, mut refresh: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<()>> + Send + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let stats = Arc::new(PollStats::default());
        let task_stats = Arc::clone(&stats);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = IntervalStream::new(ticker);
            let mut in_flight: Option<JoinHandle<()>> = None;

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    tick = ticks.next() => {
                        if tick.is_none() {
                            break;
                        }
                        if in_flight.as_ref().is_some_and(|handle| !handle.is_finished()) {
                            task_stats.skipped.fetch_add(1, Ordering::Relaxed);
                            debug!("previous refresh still running; skipping tick");
                            continue;
                        }

                        task_stats.started.fetch_add(1, Ordering::Relaxed);
                        let fut = refresh();
                        let stats = Arc::clone(&task_stats);
                        in_flight = Some(tokio::spawn(async move {
                            if let Err(err) = fut.await {
                                stats.failed.fetch_add(1, Ordering::Relaxed);
                                warn!(error = %err, "poll refresh failed");
                            }
                        }));
                    }
                }
            }

            if let Some(handle) = in_flight {
                handle.abort();
            }
            debug!("poller stopped");
        });

        Self {
            shutdown,
            task: Some(task),
            stats,
        }
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        // The loop aborts its in-flight refresh on the way out.
        let _ = self.shutdown.send(true);
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
