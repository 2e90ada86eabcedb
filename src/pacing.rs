//! Per-source pacing of upstream calls.
//!
//! Each caller IP gets its own clock: consecutive upstream calls on behalf
//! of the same source are spaced at least `min_interval` apart, while
//! distinct sources never wait on each other. The first call from a source
//! is always immediate.
//!
//! The pacer delays, it never rejects — callers queue on their source's
//! mutex and proceed in arrival order.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Per-source minimum-interval pacer.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_call: DashMap<IpAddr, Arc<Mutex<Option<Instant>>>>,
}

impl Pacer {
    /// Creates a pacer enforcing `min_interval` between calls per source.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: DashMap::new(),
        }
    }

    /// Creates a pacer that never delays.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Builds a pacer from an operator override in milliseconds, falling
    /// back to the upstream-advertised crawl delay when no override is
    /// given. An explicit zero disables pacing.
    #[must_use]
    pub fn seeded(override_ms: Option<u64>, crawl_delay: Duration) -> Self {
        match override_ms {
            Some(0) => Self::disabled(),
            Some(ms) => Self::new(Duration::from_millis(ms)),
            None => Self::new(crawl_delay),
        }
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the source's minimum interval has elapsed, then stamps
    /// the source's clock.
    ///
    /// The stamp is taken after any wait, so a burst from one source drains
    /// at exactly one call per interval.
    pub async fn pace(&self, source: IpAddr) {
        if self.min_interval.is_zero() {
            return;
        }

        let slot = self
            .last_call
            .entry(source)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut last = slot.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(%source, ?wait, "pacing upstream call");
                tokio::time::sleep(wait).await;
            }
        } else {
            trace!(%source, "first call from source, no pacing");
        }
        *last = Some(Instant::now());
    }
}
