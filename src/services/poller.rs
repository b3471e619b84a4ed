use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::Source;
use crate::services::collector::{Collector, FetchFailure};
use crate::storage::ItemCache;

/// Outcome of one collect-and-absorb cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub added: usize,
    pub skipped: usize,
    pub failures: Vec<FetchFailure>,
}

#[derive(Debug)]
pub enum StartOutcome {
    /// The first cycle ran and the background loop is scheduled.
    Started(CycleReport),
    /// A loop was already running; nothing changed.
    AlreadyRunning,
}

/// Collect from every source once and absorb the results.
pub async fn run_cycle(collector: &Collector, cache: &ItemCache) -> CycleReport {
    let mut stream = collector.collect();
    let stats = cache.absorb(&mut stream).await;
    let failures = stream.failures();

    debug!(
        added = stats.added,
        skipped = stats.skipped,
        failed = failures.len(),
        pending = cache.pending_count(),
        "poll cycle finished"
    );

    CycleReport {
        added: stats.added,
        skipped: stats.skipped,
        failures,
    }
}

/// Drives the cache on a fixed interval in a background task.
///
/// `is_running` is a plain atomic flag and is not synchronized with the
/// cache: right after [`stop`](Self::stop) the loop may still be finishing
/// a tick, and cycles already spawned still absorb their results.
pub struct Poller {
    cache: Arc<ItemCache>,
    collector: Collector,
    interval: Duration,
    running: AtomicBool,
    stop_token: Mutex<Option<CancellationToken>>,
}

impl Poller {
    pub fn new(cache: Arc<ItemCache>, collector: Collector, interval: Duration) -> Self {
        Self {
            cache,
            collector,
            interval,
            running: AtomicBool::new(false),
            stop_token: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &Arc<ItemCache> {
        &self.cache
    }

    pub fn sources(&self) -> &[Source] {
        self.collector.sources()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one cycle now, then keep polling every interval until stopped.
    ///
    /// The first cycle completes before this returns, so callers see results
    /// without waiting a full interval. Calling it while a loop is active
    /// returns [`StartOutcome::AlreadyRunning`] and changes nothing.
    pub async fn start(&self) -> StartOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return StartOutcome::AlreadyRunning;
        }

        let token = CancellationToken::new();
        *self.stop_token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        let report = run_cycle(&self.collector, &self.cache).await;

        info!(
            sources = self.collector.sources().len(),
            interval_secs = self.interval.as_secs(),
            "polling started"
        );
        tokio::spawn(poll_loop(
            self.collector.clone(),
            Arc::clone(&self.cache),
            self.interval,
            token,
        ));

        StartOutcome::Started(report)
    }

    /// Ask the loop to exit after its current wait.
    ///
    /// Returns `false` and does nothing if no loop is running. In-flight
    /// fetches are not cancelled.
    pub fn stop(&self) -> bool {
        let token = self
            .stop_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match token {
            Some(token) => {
                token.cancel();
                self.running.store(false, Ordering::SeqCst);
                info!("polling stopped");
                true
            }
            None => false,
        }
    }
}

async fn poll_loop(
    collector: Collector,
    cache: Arc<ItemCache>,
    interval: Duration,
    token: CancellationToken,
) {
    // The first cycle already ran synchronously in start()
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("poll loop exiting");
                return;
            }
            _ = ticker.tick() => {
                // Spawned so a slow cycle never delays the next tick
                let collector = collector.clone();
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    run_cycle(&collector, &cache).await;
                });
            }
        }
    }
}
