//! Metrics collection module
//!
//! Tracks provider performance, error rates and how search outcomes were
//! resolved. [`Metrics`] is a [`SearchObserver`] and can be handed straight to
//! the orchestrator.

use crate::search::{SearchEvent, SearchObserver};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Rolling window of response times kept per provider
const RESPONSE_TIME_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    calls: u64,
    hits: u64,
    empty: u64,
    failures: u64,
    response_times: VecDeque<u64>,
}

/// Search metrics collector
pub struct Metrics {
    /// Requests that reached the providers
    started: AtomicU64,
    /// Requests skipped for an empty or unidentified subject
    short_circuited: AtomicU64,
    committed: AtomicU64,
    failed: AtomicU64,
    stale_discarded: AtomicU64,
    providers: RwLock<HashMap<String, ProviderCounters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            started: AtomicU64::new(0),
            short_circuited: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            stale_discarded: AtomicU64::new(0),
            providers: RwLock::new(HashMap::new()),
        }
    }

    fn record_provider(&self, provider: &str, f: impl FnOnce(&mut ProviderCounters)) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(providers.entry(provider.to_string()).or_default());
    }

    /// Record a provider response
    pub fn record_result(&self, provider: &str, count: usize, time_ms: u64) {
        self.record_provider(provider, |c| {
            c.calls += 1;
            if count > 0 {
                c.hits += 1;
            } else {
                c.empty += 1;
            }
            push_response_time(&mut c.response_times, time_ms);
        });
    }

    /// Record a provider failure
    pub fn record_error(&self, provider: &str, time_ms: u64) {
        self.record_provider(provider, |c| {
            c.calls += 1;
            c.failures += 1;
            push_response_time(&mut c.response_times, time_ms);
        });
    }

    /// Statistics for one provider (zeroed if it was never called)
    pub fn provider_stats(&self, provider: &str) -> ProviderStats {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers
            .get(provider)
            .map(ProviderStats::from)
            .unwrap_or_default()
    }

    /// Statistics for every provider seen so far
    pub fn all_provider_stats(&self) -> HashMap<String, ProviderStats> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers
            .iter()
            .map(|(name, c)| (name.clone(), ProviderStats::from(c)))
            .collect()
    }

    /// Outcome totals
    pub fn summary(&self) -> OutcomeStats {
        OutcomeStats {
            started: self.started.load(Ordering::Relaxed),
            short_circuited: self.short_circuited.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
        }
    }
}

fn push_response_time(times: &mut VecDeque<u64>, time_ms: u64) {
    if times.len() >= RESPONSE_TIME_WINDOW {
        times.pop_front();
    }
    times.push_back(time_ms);
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchObserver for Metrics {
    fn on_event(&self, event: &SearchEvent<'_>) {
        match event {
            SearchEvent::ShortCircuited { .. } => {
                self.short_circuited.fetch_add(1, Ordering::Relaxed);
            }
            SearchEvent::Started { .. } => {
                self.started.fetch_add(1, Ordering::Relaxed);
            }
            SearchEvent::ProviderReturned {
                provider,
                count,
                elapsed,
            } => self.record_result(provider, *count, elapsed.as_millis() as u64),
            SearchEvent::ProviderFailed {
                provider, elapsed, ..
            } => self.record_error(provider, elapsed.as_millis() as u64),
            SearchEvent::Committed { failed: true, .. } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            SearchEvent::Committed { failed: false, .. } => {
                self.committed.fetch_add(1, Ordering::Relaxed);
            }
            SearchEvent::StaleDiscarded { .. } => {
                self.stale_discarded.fetch_add(1, Ordering::Relaxed);
            }
            SearchEvent::ProviderSkipped { .. } | SearchEvent::Reset => {}
        }
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderStats {
    pub calls: u64,
    /// Calls that returned at least one result
    pub hits: u64,
    pub empty: u64,
    pub failures: u64,
    pub avg_response_time: Option<u64>,
}

impl ProviderStats {
    /// Percentage of calls that did not fail
    pub fn reliability(&self) -> f64 {
        if self.calls == 0 {
            100.0
        } else {
            ((self.calls - self.failures) as f64 / self.calls as f64) * 100.0
        }
    }
}

impl From<&ProviderCounters> for ProviderStats {
    fn from(c: &ProviderCounters) -> Self {
        let avg_response_time = if c.response_times.is_empty() {
            None
        } else {
            Some(c.response_times.iter().sum::<u64>() / c.response_times.len() as u64)
        };
        Self {
            calls: c.calls,
            hits: c.hits,
            empty: c.empty,
            failures: c.failures,
            avg_response_time,
        }
    }
}

/// How search requests were resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeStats {
    pub started: u64,
    pub short_circuited: u64,
    pub committed: u64,
    pub failed: u64,
    pub stale_discarded: u64,
}
