use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::frontier::Frontier;

/// One progress observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub in_flight: usize,
    pub queued: usize,
}

/// Periodic, purely observational progress task.
///
/// It only reads frontier counters, so it never holds up draining. Stop it
/// with [`ProgressReporter::stop`]; dropping it also aborts the task.
pub struct ProgressReporter {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Report after `delay`, then every `interval`
    pub fn spawn<F>(frontier: Arc<Frontier>, delay: Duration, interval: Duration, mut emit: F) -> Self
    where
        F: FnMut(Progress) + Send + 'static,
    {
        let (stop, mut stopped) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + delay, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticks.tick() => {
                        let stats = frontier.stats();
                        emit(Progress {
                            completed: stats.completed,
                            in_flight: stats.in_flight,
                            queued: stats.pending.saturating_sub(stats.in_flight),
                        });
                    }
                }
            }
            debug!("Progress reporter stopped");
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Reporter that logs and prints to stdout
    pub fn to_console(frontier: Arc<Frontier>, delay: Duration, interval: Duration) -> Self {
        Self::spawn(frontier, delay, interval, |progress| {
            info!(
                completed = progress.completed,
                in_flight = progress.in_flight,
                queued = progress.queued,
                "Crawl progress"
            );
            println!(
                "Crawled {} urls, {} urls in progress, {} urls waiting",
                progress.completed, progress.in_flight, progress.queued
            );
        })
    }

    /// Stop reporting and wait for the task to finish
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
