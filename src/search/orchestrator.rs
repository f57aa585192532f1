//! Visual-match and appraisal orchestration with stale-response suppression

use super::generation::FencedState;
use super::models::{
    AppraisalQuery, AppraisalResult, FetchOutcome, OrchestratorSnapshot, SearchRequest,
    SearchState, VisualMatch, UNIDENTIFIED_SENTINEL,
};
use super::observer::{QueryKind, SearchEvent, SearchObserver, TracingObserver};
use super::SearchError;
use crate::providers::{AppraisalProvider, ProviderChain};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::debug;

/// Outcome of [`SearchOrchestrator::retry`]; `None` means the query was not re-issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryOutcome {
    pub visual_matches: Option<FetchOutcome>,
    pub appraisal: Option<FetchOutcome>,
}

/// Runs visual-match and appraisal queries and owns their observable state.
///
/// Each query type has its own generation counter. A response is written
/// only if the generation it was issued under is still current, so the most
/// recently issued request always wins regardless of completion order.
pub struct SearchOrchestrator {
    chain: ProviderChain,
    appraiser: Arc<dyn AppraisalProvider>,
    observer: Arc<dyn SearchObserver>,
    sentinel: String,
    visual: FencedState<Vec<VisualMatch>>,
    appraisal: FencedState<Option<AppraisalResult>>,
    updates: watch::Sender<OrchestratorSnapshot>,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator").finish_non_exhaustive()
    }
}

impl SearchOrchestrator {
    /// Create an orchestrator with idle state
    pub fn new(chain: ProviderChain, appraiser: Arc<dyn AppraisalProvider>) -> Self {
        let (updates, _) = watch::channel(OrchestratorSnapshot::default());
        Self {
            chain,
            appraiser,
            observer: Arc::new(TracingObserver),
            sentinel: UNIDENTIFIED_SENTINEL.to_string(),
            visual: FencedState::new(),
            appraisal: FencedState::new(),
            updates,
        }
    }

    /// Replace the default tracing observer
    pub fn with_observer(mut self, observer: Arc<dyn SearchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the subject name that means "nothing identified"
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Current state of both query types
    pub fn snapshot(&self) -> OrchestratorSnapshot {
        OrchestratorSnapshot::new(self.visual.snapshot(), self.appraisal.snapshot())
    }

    /// Watch every state change
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorSnapshot> {
        self.updates.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }

    /// Rejects an empty subject or the unidentified sentinel
    fn check_subject(&self, subject_name: &str) -> Result<(), SearchError> {
        if subject_name.trim().is_empty() || subject_name == self.sentinel {
            return Err(SearchError::EmptyInput);
        }
        Ok(())
    }

    /// Find visual matches for a subject using the provider chain
    pub async fn fetch_visual_matches(
        &self,
        subject_name: &str,
        category: Option<&str>,
        image_reference: Option<&str>,
    ) -> FetchOutcome {
        let kind = QueryKind::VisualMatches;
        if let Err(reason) = self.check_subject(subject_name) {
            debug!(%reason, ?kind, "skipping query");
            self.visual.set(SearchState::short_circuited());
            self.observer.on_event(&SearchEvent::ShortCircuited { kind });
            self.publish();
            return FetchOutcome::ShortCircuited;
        }

        let request = SearchRequest {
            subject_name: subject_name.to_string(),
            category: category.map(str::to_string),
            image_reference: image_reference.map(str::to_string),
        };

        let generation = self.visual.begin();
        self.observer.on_event(&SearchEvent::Started {
            kind,
            generation,
            subject: subject_name,
        });
        self.publish();

        let result = self
            .chain
            .first_non_empty(&request, self.observer.as_ref())
            .await;

        let failed = result.is_err();
        let committed = self.visual.commit_if_current(generation, |state| match result {
            Ok(hit) => state.succeed(hit.matches),
            Err(e) => state.fail(e.user_message()),
        });

        self.finish(kind, generation, committed, failed)
    }

    /// Estimate the value of a subject from its materials
    pub async fn fetch_appraisal(&self, subject_name: &str, materials: &[String]) -> FetchOutcome {
        let kind = QueryKind::Appraisal;
        if let Err(reason) = self.check_subject(subject_name) {
            debug!(%reason, ?kind, "skipping query");
            self.appraisal.set(SearchState::short_circuited());
            self.observer.on_event(&SearchEvent::ShortCircuited { kind });
            self.publish();
            return FetchOutcome::ShortCircuited;
        }

        let query = AppraisalQuery::new(subject_name, materials.to_vec());

        let generation = self.appraisal.begin();
        self.observer.on_event(&SearchEvent::Started {
            kind,
            generation,
            subject: subject_name,
        });
        self.publish();

        let provider = self.appraiser.name();
        let start = Instant::now();
        let result = match self.appraiser.search_appraisal_value(&query).await {
            Ok(estimate) => {
                self.observer.on_event(&SearchEvent::ProviderReturned {
                    provider,
                    count: usize::from(estimate.is_some()),
                    elapsed: start.elapsed(),
                });
                Ok(estimate)
            }
            Err(e) => {
                let error = SearchError::provider(provider, &e);
                self.observer.on_event(&SearchEvent::ProviderFailed {
                    provider,
                    error: &error.user_message(),
                    elapsed: start.elapsed(),
                });
                Err(error)
            }
        };

        let failed = result.is_err();
        let committed = self
            .appraisal
            .commit_if_current(generation, |state| match result {
                Ok(estimate) => state.succeed(estimate),
                Err(e) => state.fail(e.user_message()),
            });

        self.finish(kind, generation, committed, failed)
    }

    fn finish(
        &self,
        kind: QueryKind,
        generation: super::Generation,
        committed: bool,
        failed: bool,
    ) -> FetchOutcome {
        if !committed {
            self.observer
                .on_event(&SearchEvent::StaleDiscarded { kind, generation });
            return FetchOutcome::Discarded;
        }

        self.observer.on_event(&SearchEvent::Committed {
            kind,
            generation,
            failed,
        });
        self.publish();

        if failed {
            FetchOutcome::Failed
        } else {
            FetchOutcome::Committed
        }
    }

    /// Invalidate in-flight requests and return both query types to idle
    pub fn reset(&self) {
        self.visual.reset();
        self.appraisal.reset();
        self.observer.on_event(&SearchEvent::Reset);
        self.publish();
    }

    /// Re-issue whichever queries currently hold an error.
    ///
    /// The appraisal is only re-issued when `materials` is supplied. Both
    /// re-issued queries run concurrently.
    pub async fn retry(
        &self,
        subject_name: &str,
        category: Option<&str>,
        materials: Option<&[String]>,
        image_reference: Option<&str>,
    ) -> RetryOutcome {
        let retry_visual = self.visual.snapshot().has_error();
        let retry_appraisal = materials.filter(|_| self.appraisal.snapshot().has_error());

        let visual = async {
            if retry_visual {
                Some(
                    self.fetch_visual_matches(subject_name, category, image_reference)
                        .await,
                )
            } else {
                None
            }
        };
        let appraisal = async {
            match retry_appraisal {
                Some(materials) => Some(self.fetch_appraisal(subject_name, materials).await),
                None => None,
            }
        };

        let (visual_matches, appraisal) = futures::join!(visual, appraisal);
        RetryOutcome {
            visual_matches,
            appraisal,
        }
    }
}
