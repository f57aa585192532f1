//! Search orchestration module
//!
//! Runs visual-match queries through the provider chain and appraisal
//! queries through the appraisal provider, fencing each query type with its
//! own generation counter so superseded responses are dropped.

mod error;
mod generation;
mod models;
mod observer;
mod orchestrator;

pub use error::SearchError;
pub use generation::{FencedState, Generation};
pub use models::*;
pub use observer::{Observers, QueryKind, SearchEvent, SearchObserver, TracingObserver};
pub use orchestrator::{RetryOutcome, SearchOrchestrator};
