use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, trace};

use super::task::FrontierItem;

/// What a worker gets back from [`Frontier::take`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Item(FrontierItem),
    /// Stop signal. Never counted as pending and never marked done.
    Sentinel,
}

/// Counters observed at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    pub submitted: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_flight: usize,
}

/// Lifetime counters, always updated and read together
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    submitted: usize,
    taken: usize,
    completed: usize,
}

impl Counters {
    fn pending(&self) -> usize {
        self.submitted.saturating_sub(self.completed)
    }
}

/// Shared work queue with a join-style completion barrier.
///
/// `pending` counts items submitted but not yet marked done, whether still
/// queued or being processed. [`Frontier::wait_drained`] resolves once it
/// reaches zero, which can only happen after every discovered child has
/// been submitted, since a parent is marked done after its children.
pub struct Frontier {
    sender: mpsc::UnboundedSender<Slot>,
    receiver: Mutex<mpsc::UnboundedReceiver<Slot>>,
    counters: watch::Sender<Counters>,
}

impl Frontier {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (counters, _) = watch::channel(Counters::default());

        Self {
            sender,
            receiver: Mutex::new(receiver),
            counters,
        }
    }

    /// Enqueue an item without blocking
    pub fn submit(&self, item: FrontierItem) {
        trace!("Submitting {} at depth {}", item.url, item.depth);
        // Count before enqueueing so a fast consumer can never mark it done
        // while the pending count still excludes it.
        self.counters.send_modify(|counters| counters.submitted += 1);
        self.send(Slot::Item(item));
    }

    /// Enqueue one stop signal. Call only after [`Frontier::wait_drained`].
    pub fn submit_sentinel(&self) {
        self.send(Slot::Sentinel);
    }

    /// Wait for the next item or sentinel
    pub async fn take(&self) -> Slot {
        let slot = self.receiver.lock().await.recv().await;
        match slot {
            Some(Slot::Item(item)) => {
                // Pending is unchanged, so waiters need no wakeup
                self.counters.send_if_modified(|counters| {
                    counters.taken += 1;
                    false
                });
                Slot::Item(item)
            }
            // The sender lives as long as the frontier, so a closed channel
            // only happens during teardown.
            Some(Slot::Sentinel) | None => Slot::Sentinel,
        }
    }

    /// Record that one taken item has been fully processed
    pub fn mark_done(&self) {
        self.counters.send_modify(|counters| {
            debug_assert!(counters.pending() > 0, "mark_done called more often than submit");
            counters.completed += 1;
        });
    }

    /// A guard that calls [`Frontier::mark_done`] when dropped, on every
    /// exit path including panics.
    pub fn done_guard(&self) -> DoneGuard<'_> {
        DoneGuard { frontier: self }
    }

    /// Wait until every submitted item has been marked done
    pub async fn wait_drained(&self) {
        let mut counters = self.counters.subscribe();
        // The sender is owned by self, so the channel cannot close here.
        let _ = counters.wait_for(|counters| counters.pending() == 0).await;
        debug!("Frontier drained after {} items", self.counters.borrow().completed);
    }

    pub fn pending(&self) -> usize {
        self.counters.borrow().pending()
    }

    /// One consistent snapshot: `pending == submitted - completed` always holds
    pub fn stats(&self) -> FrontierStats {
        let counters = *self.counters.borrow();
        FrontierStats {
            submitted: counters.submitted,
            completed: counters.completed,
            pending: counters.pending(),
            in_flight: counters.taken.saturating_sub(counters.completed),
        }
    }

    fn send(&self, slot: Slot) {
        // The receiver is owned by self as well, so sending cannot fail.
        let _ = self.sender.send(slot);
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one item done on drop
#[must_use = "the item is marked done as soon as the guard is dropped"]
pub struct DoneGuard<'a> {
    frontier: &'a Frontier,
}

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.frontier.mark_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn item(url: &str, depth: u32) -> FrontierItem {
        FrontierItem {
            url: url.to_string(),
            depth,
        }
    }

    fn assert_balanced(frontier: &Frontier) {
        let stats = frontier.stats();
        assert_eq!(stats.pending, stats.submitted - stats.completed);
    }

    #[tokio::test]
    async fn test_fifo_and_pending_count() {
        let frontier = Frontier::new();
        frontier.submit(item("http://a.test", 1));
        frontier.submit(item("http://b.test", 2));
        assert_eq!(frontier.pending(), 2);
        assert_balanced(&frontier);

        assert_eq!(frontier.take().await, Slot::Item(item("http://a.test", 1)));
        assert_eq!(frontier.stats().in_flight, 1);
        frontier.mark_done();
        assert_eq!(frontier.pending(), 1);
        assert_balanced(&frontier);

        assert_eq!(frontier.take().await, Slot::Item(item("http://b.test", 2)));
        frontier.mark_done();
        assert_eq!(frontier.pending(), 0);
        assert_balanced(&frontier);
    }

    #[tokio::test]
    async fn test_sentinel_is_not_pending() {
        let frontier = Frontier::new();
        frontier.submit_sentinel();
        assert_eq!(frontier.pending(), 0);
        assert_eq!(frontier.take().await, Slot::Sentinel);
        assert_eq!(frontier.stats(), FrontierStats::default());
    }

    #[tokio::test]
    async fn test_wait_drained_on_empty_frontier_returns() {
        let frontier = Frontier::new();
        timeout(Duration::from_secs(1), frontier.wait_drained())
            .await
            .expect("an empty frontier is already drained");
    }

    #[tokio::test]
    async fn test_wait_drained_blocks_until_done() {
        let frontier = Arc::new(Frontier::new());
        frontier.submit(item("http://a.test", 1));

        let waiter = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.wait_drained().await })
        };

        // Taking the item is not enough, it has to be marked done
        let _ = frontier.take().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        frontier.mark_done();
        timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_take_blocks_until_submit() {
        let frontier = Arc::new(Frontier::new());

        let taker = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.take().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!taker.is_finished());

        frontier.submit(item("http://late.test", 1));
        let slot = timeout(Duration::from_secs(1), taker).await.unwrap().unwrap();
        assert_eq!(slot, Slot::Item(item("http://late.test", 1)));
    }

    #[tokio::test]
    async fn test_done_guard_fires_on_early_return() {
        fn process(frontier: &Frontier, fail: bool) -> Result<(), &'static str> {
            let _done = frontier.done_guard();
            if fail {
                return Err("fetch failed");
            }
            Ok(())
        }

        let frontier = Frontier::new();
        frontier.submit(item("http://a.test", 1));
        frontier.submit(item("http://b.test", 1));

        let _ = frontier.take().await;
        assert!(process(&frontier, true).is_err());
        let _ = frontier.take().await;
        assert!(process(&frontier, false).is_ok());

        assert_eq!(frontier.pending(), 0);
        assert_eq!(frontier.stats().completed, 2);
    }

    #[tokio::test]
    async fn test_done_guard_fires_on_panic() {
        let frontier = Arc::new(Frontier::new());
        frontier.submit(item("http://a.test", 1));

        let worker = {
            let frontier = frontier.clone();
            tokio::spawn(async move {
                let _ = frontier.take().await;
                let _done = frontier.done_guard();
                panic!("parser blew up");
            })
        };

        assert!(worker.await.unwrap_err().is_panic());
        timeout(Duration::from_secs(1), frontier.wait_drained())
            .await
            .expect("a panicking item must still be marked done");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn test_stats_balanced_while_workers_run() {
        const ROUNDS: usize = 2000;
        let frontier = Arc::new(Frontier::new());
        let stop = Arc::new(AtomicBool::new(false));

        let observer = {
            let frontier = frontier.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut observed = 0usize;
                loop {
                    let stats = frontier.stats();
                    assert_eq!(stats.pending, stats.submitted - stats.completed, "{:?}", stats);
                    assert!(stats.in_flight <= stats.pending, "{:?}", stats);
                    observed += 1;
                    if stop.load(Ordering::SeqCst) {
                        return observed;
                    }
                }
            })
        };

        let workers: Vec<_> = (0..3)
            .map(|n| {
                let frontier = frontier.clone();
                tokio::spawn(async move {
                    for i in 0..ROUNDS {
                        frontier.submit(item(&format!("http://w{}.test/{}", n, i), 1));
                        let _ = frontier.take().await;
                        frontier.mark_done();
                    }
                })
            })
            .collect();

        for worker in workers {
            timeout(Duration::from_secs(10), worker).await.unwrap().unwrap();
        }
        stop.store(true, Ordering::SeqCst);

        let observed = observer.join().expect("every snapshot must be balanced");
        assert!(observed > 0);
        assert_eq!(
            frontier.stats(),
            FrontierStats {
                submitted: 3 * ROUNDS,
                completed: 3 * ROUNDS,
                pending: 0,
                in_flight: 0,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_drain_then_sentinels_stops_every_worker() {
        const WORKERS: usize = 4;
        let frontier = Arc::new(Frontier::new());
        frontier.submit(item("http://root.test", 1));

        // Every item at depth < 4 fans out to two children
        let workers: Vec<_> = (0..WORKERS)
            .map(|_| {
                let frontier = frontier.clone();
                tokio::spawn(async move {
                    let mut processed = 0usize;
                    loop {
                        match frontier.take().await {
                            Slot::Sentinel => return processed,
                            Slot::Item(parent) => {
                                let _done = frontier.done_guard();
                                if parent.depth < 4 {
                                    for n in 0..2 {
                                        frontier.submit(parent.child(format!("{}/{}", parent.url, n)));
                                    }
                                }
                                processed += 1;
                            }
                        }
                    }
                })
            })
            .collect();

        timeout(Duration::from_secs(5), frontier.wait_drained()).await.unwrap();
        assert_balanced(&frontier);
        for _ in 0..WORKERS {
            frontier.submit_sentinel();
        }

        let mut total = 0;
        for worker in workers {
            total += timeout(Duration::from_secs(5), worker).await.unwrap().unwrap();
        }

        // 1 + 2 + 4 + 8
        assert_eq!(total, 15);
        let stats = frontier.stats();
        assert_eq!(stats.submitted, 15);
        assert_eq!(stats.completed, 15);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.in_flight, 0);
    }
}
