//! itemlens: visual search and appraisal orchestration for scanned items
//!
//! Given the name of an identified item, queries an ordered chain of
//! visual-match providers (first non-empty answer wins) and a separate
//! appraisal provider, discarding responses from superseded requests.

pub mod config;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod search;

pub use config::Settings;
pub use providers::{AppraisalProvider, ProviderChain, VisualMatchProvider};
pub use search::{
    AppraisalQuery, AppraisalResult, FetchOutcome, OrchestratorSnapshot, SearchOrchestrator,
    SearchRequest, SearchState, VisualMatch,
};

use network::HttpClient;
use providers::ProviderLoader;
use std::sync::Arc;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build an orchestrator with providers, sentinel and HTTP client taken from settings
pub fn orchestrator_from_settings(
    settings: &Settings,
    observer: Arc<dyn search::SearchObserver>,
) -> anyhow::Result<SearchOrchestrator> {
    let client = HttpClient::with_settings(&settings.outgoing)?;
    let chain = ProviderLoader::load_chain(settings, &client);
    let appraiser = ProviderLoader::load_appraisal(settings, &client)?;

    Ok(SearchOrchestrator::new(chain, appraiser)
        .with_sentinel(settings.search.unidentified_sentinel.clone())
        .with_observer(observer))
}
