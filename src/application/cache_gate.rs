use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// How a scrape request was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// This request ran a refresh cycle
    Refreshed,
    /// The cached snapshot was still valid
    Cached,
    /// Another request refreshed while this one waited
    Coalesced,
}

/// Cache bookkeeping, only touched under the gate's lock
#[derive(Debug)]
struct CacheState {
    ttl: Duration,
    last_refresh: Option<Instant>,
    valid_until: Option<Instant>,
}

impl CacheState {
    fn is_stale(&self, now: Instant) -> bool {
        if self.ttl.is_zero() {
            return true;
        }
        match self.valid_until {
            Some(valid_until) => now > valid_until,
            None => true,
        }
    }
}

/// Decides whether a scrape must re-measure or may serve the last snapshot.
///
/// Refreshes are serialised: a single refresh is in flight at any time, and
/// requests that queued behind it reuse its result.
pub struct CacheGate {
    state: Mutex<CacheState>,
    completed: AtomicU64,
}

impl CacheGate {
    /// `ttl` of zero re-measures on every request
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                ttl,
                last_refresh: None,
                valid_until: None,
            }),
            completed: AtomicU64::new(0),
        }
    }

    /// Run `refresh` if the snapshot is stale, holding the lock for the
    /// whole cycle so concurrent requests wait on it.
    pub async fn ensure_fresh<F, Fut>(&self, refresh: F) -> Freshness
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let seen = self.completed.load(Ordering::SeqCst);
        let mut state = self.state.lock().await;

        if self.completed.load(Ordering::SeqCst) != seen {
            debug!("CacheGate: refresh completed while waiting, reusing it");
            return Freshness::Coalesced;
        }

        if !state.is_stale(Instant::now()) {
            return Freshness::Cached;
        }

        refresh().await;

        let now = Instant::now();
        state.last_refresh = Some(now);
        state.valid_until = Some(now + state.ttl);
        self.completed.fetch_add(1, Ordering::SeqCst);
        debug!("CacheGate: snapshot valid for {:?}", state.ttl);

        Freshness::Refreshed
    }

    /// Time since the last completed refresh, if any
    pub async fn age(&self) -> Option<Duration> {
        self.state
            .lock()
            .await
            .last_refresh
            .map(|at| Instant::now().saturating_duration_since(at))
    }
}
