//! Search request, result and state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subject name reported when identification failed
pub const UNIDENTIFIED_SENTINEL: &str = "Unable to Identify";

/// Input to a visual-match query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Identified subject name
    pub subject_name: String,
    /// Optional category hint (e.g. "ceramics")
    pub category: Option<String>,
    /// Optional reference to the scanned image (URL or upload id)
    pub image_reference: Option<String>,
}

impl SearchRequest {
    pub fn new(subject_name: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            category: None,
            image_reference: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_image_reference(mut self, image: impl Into<String>) -> Self {
        self.image_reference = Some(image.into());
        self
    }
}

/// A single visual match returned by a provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualMatch {
    /// Title of the matched listing or page
    pub title: String,
    /// Thumbnail or full image URL
    pub image_url: Option<String>,
    /// Page the match was found on
    pub source_url: Option<String>,
    /// Price signal as displayed by the source (e.g. "$120.00")
    pub price: Option<String>,
    /// Provider that produced the match
    pub source: Option<String>,
}

impl VisualMatch {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Input to an appraisal query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppraisalQuery {
    pub subject_name: String,
    /// Materials in the order they were identified
    pub materials: Vec<String>,
}

impl AppraisalQuery {
    pub fn new(subject_name: impl Into<String>, materials: Vec<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            materials,
        }
    }
}

/// Estimated market value of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalResult {
    /// Lower bound of the estimated value
    pub low: f64,
    /// Upper bound of the estimated value
    pub high: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Where the estimate came from
    pub source: Option<String>,
    /// Short human-readable explanation
    pub summary: Option<String>,
}

impl AppraisalResult {
    pub fn new(low: f64, high: f64, currency: impl Into<String>) -> Self {
        Self {
            low: low.min(high),
            high: high.max(low),
            currency: currency.into(),
            source: None,
            summary: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Midpoint of the estimated range
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Observable state of one query type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState<T> {
    pub result: T,
    pub is_loading: bool,
    pub error: Option<String>,
    /// When the last terminal outcome was committed
    pub completed_at: Option<DateTime<Utc>>,
}

impl<T: Default> Default for SearchState<T> {
    fn default() -> Self {
        Self {
            result: T::default(),
            is_loading: false,
            error: None,
            completed_at: None,
        }
    }
}

impl<T: Default> SearchState<T> {
    /// Idle state with an empty result
    pub fn idle() -> Self {
        Self::default()
    }

    /// Terminal state for an empty or unidentified subject
    pub(crate) fn short_circuited() -> Self {
        Self {
            completed_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Mark as loading, keeping the previous result
    pub(crate) fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub(crate) fn succeed(&mut self, result: T) {
        self.result = result;
        self.is_loading = false;
        self.error = None;
        self.completed_at = Some(Utc::now());
    }

    /// Record an error, keeping the previous result
    pub(crate) fn fail(&mut self, message: String) {
        self.is_loading = false;
        self.error = Some(message);
        self.completed_at = Some(Utc::now());
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything the UI layer observes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrchestratorSnapshot {
    pub visual_matches: SearchState<Vec<VisualMatch>>,
    pub appraisal: SearchState<Option<AppraisalResult>>,
    /// True while either query type is loading
    pub is_loading: bool,
}

impl OrchestratorSnapshot {
    pub(crate) fn new(
        visual_matches: SearchState<Vec<VisualMatch>>,
        appraisal: SearchState<Option<AppraisalResult>>,
    ) -> Self {
        let is_loading = visual_matches.is_loading || appraisal.is_loading;
        Self {
            visual_matches,
            appraisal,
            is_loading,
        }
    }
}

/// What happened to a single fetch call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Empty or unidentified subject; no provider was called
    ShortCircuited,
    /// The result was written to state
    Committed,
    /// The error was written to state
    Failed,
    /// A newer request or a reset superseded this one
    Discarded,
}
