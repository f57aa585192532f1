//! Observability hook injected into the orchestrator

use super::generation::Generation;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Query type tracked by its own generation counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    VisualMatches,
    Appraisal,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VisualMatches => write!(f, "visual_matches"),
            Self::Appraisal => write!(f, "appraisal"),
        }
    }
}

/// Something that happened while serving a query
#[derive(Debug, Clone)]
pub enum SearchEvent<'a> {
    /// Empty or unidentified subject, nothing was sent
    ShortCircuited { kind: QueryKind },
    /// A new generation was issued
    Started {
        kind: QueryKind,
        generation: Generation,
        subject: &'a str,
    },
    /// Provider was skipped because it is not enabled
    ProviderSkipped { provider: &'a str },
    /// Provider answered
    ProviderReturned {
        provider: &'a str,
        count: usize,
        elapsed: Duration,
    },
    /// Provider call failed
    ProviderFailed {
        provider: &'a str,
        error: &'a str,
        elapsed: Duration,
    },
    /// Result or error written to state
    Committed {
        kind: QueryKind,
        generation: Generation,
        failed: bool,
    },
    /// Response belonged to a superseded generation
    StaleDiscarded {
        kind: QueryKind,
        generation: Generation,
    },
    /// Both query types were reset
    Reset,
}

/// Receives orchestrator events
pub trait SearchObserver: Send + Sync {
    fn on_event(&self, event: &SearchEvent<'_>);
}

/// Observer that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SearchObserver for TracingObserver {
    fn on_event(&self, event: &SearchEvent<'_>) {
        match event {
            SearchEvent::ShortCircuited { kind } => {
                debug!(%kind, "no identified subject, skipping search");
            }
            SearchEvent::Started {
                kind,
                generation,
                subject,
            } => {
                info!(%kind, %generation, subject, "search started");
            }
            SearchEvent::ProviderSkipped { provider } => {
                debug!(provider, "provider not enabled, skipping");
            }
            SearchEvent::ProviderReturned {
                provider,
                count,
                elapsed,
            } => {
                debug!(provider, count, ?elapsed, "provider returned");
            }
            SearchEvent::ProviderFailed {
                provider,
                error,
                elapsed,
            } => {
                warn!(provider, error, ?elapsed, "provider failed");
            }
            SearchEvent::Committed {
                kind,
                generation,
                failed,
            } => {
                info!(%kind, %generation, failed, "search state committed");
            }
            SearchEvent::StaleDiscarded { kind, generation } => {
                debug!(%kind, %generation, "discarding superseded response");
            }
            SearchEvent::Reset => {
                debug!("search state reset");
            }
        }
    }
}

/// Fans events out to several observers
#[derive(Clone, Default)]
pub struct Observers {
    observers: Vec<Arc<dyn SearchObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn SearchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl SearchObserver for Observers {
    fn on_event(&self, event: &SearchEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
