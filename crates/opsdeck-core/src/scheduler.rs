// ── Fetch scheduling ──
//
// One refresh cycle fans out a fetch per source, each bounded by the
// same timeout, and joins them all before anything is drawn. A fetch
// that outlives its bound is dropped and replaced by a "timed out"
// placeholder; nothing from an earlier cycle is carried over.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::DashboardConfig;
use crate::sources::{self, Depth, Outcome, Placeholder, Source, SourceId};

/// The latest outcome of one source, with when and how long it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResult {
    pub outcome: Outcome,
    pub fetched_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl SourceResult {
    pub fn timed_out(&self) -> bool {
        matches!(self.outcome, Outcome::Unavailable(Placeholder::TimedOut { .. }))
    }
}

/// Everything one cycle produced, keyed in registration order.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub results: IndexMap<SourceId, SourceResult>,
}

impl CycleReport {
    pub fn get(&self, id: SourceId) -> Option<&SourceResult> {
        self.results.get(&id)
    }
}

/// Runs bounded, concurrent fetches over a fixed set of sources.
pub struct FetchScheduler {
    sources: Vec<Arc<dyn Source>>,
    timeout: Duration,
}

impl FetchScheduler {
    pub fn new(sources: Vec<Arc<dyn Source>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    /// The five standard sources, bounded by the configured fetch timeout.
    pub fn from_config(cfg: &DashboardConfig) -> Self {
        Self::new(sources::default_sources(cfg), cfg.fetch_timeout)
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    /// Fetch every source at summary depth.
    ///
    /// Returns once every fetch has completed or expired, so the whole
    /// cycle is bounded by a single timeout rather than their sum.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let start = Instant::now();

        let fetches = self
            .sources
            .iter()
            .map(|source| self.bounded_fetch(source.as_ref(), Depth::Summary));
        let results: IndexMap<SourceId, SourceResult> = self
            .sources
            .iter()
            .map(|s| s.id())
            .zip(join_all(fetches).await)
            .collect();

        let elapsed = start.elapsed();
        debug!(
            sources = results.len(),
            timed_out = results.values().filter(|r| r.timed_out()).count(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "fetch cycle complete"
        );

        CycleReport {
            started_at,
            elapsed,
            results,
        }
    }

    /// Fetch one source under the same bound, for detail views.
    pub async fn fetch_one(&self, id: SourceId, depth: Depth) -> Option<SourceResult> {
        let source = self.sources.iter().find(|s| s.id() == id)?;
        Some(self.bounded_fetch(source.as_ref(), depth).await)
    }

    async fn bounded_fetch(&self, source: &dyn Source, depth: Depth) -> SourceResult {
        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, source.fetch(depth)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    source = %source.id(),
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "fetch timed out"
                );
                Outcome::Unavailable(Placeholder::TimedOut {
                    after: self.timeout,
                })
            }
        };
        SourceResult {
            outcome,
            fetched_at: Utc::now(),
            elapsed: start.elapsed(),
        }
    }
}
