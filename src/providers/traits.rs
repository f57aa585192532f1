//! Provider traits and transport types

use crate::search::{AppraisalQuery, AppraisalResult, SearchRequest, VisualMatch};
use async_trait::async_trait;
use std::collections::HashMap;

/// A backend that returns visual matches for an identified subject
#[async_trait]
pub trait VisualMatchProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Whether the provider can be queried (e.g. credentials are configured)
    fn is_enabled(&self) -> bool {
        true
    }

    /// Search for visual matches
    async fn search_visual_matches(&self, request: &SearchRequest)
        -> anyhow::Result<Vec<VisualMatch>>;
}

/// A backend that estimates the market value of an item
#[async_trait]
pub trait AppraisalProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Estimate the value of the subject; `None` when the provider has no estimate
    async fn search_appraisal_value(
        &self,
        query: &AppraisalQuery,
    ) -> anyhow::Result<Option<AppraisalResult>>;
}

/// HTTP request to be made by a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// Request body
    pub data: Option<RequestBody>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter only when a value is present
    pub fn param_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => self.param(key, v),
            _ => self,
        }
    }

    /// Add JSON body
    pub fn json(mut self, data: serde_json::Value) -> Self {
        self.data = Some(RequestBody::Json(data));
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body types
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
}

/// HTTP response returned to a provider
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl ProviderResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with the status code unless the response is 2xx
    pub fn error_for_status(self) -> anyhow::Result<Self> {
        if self.is_success() {
            Ok(self)
        } else if self.status == 429 {
            Err(anyhow::anyhow!("HTTP error: 429 (rate limited)"))
        } else {
            Err(anyhow::anyhow!("HTTP error: {}", self.status))
        }
    }
}

/// Join a path onto a configured base URL
pub fn endpoint(base_url: &str, path: &str) -> anyhow::Result<String> {
    let base = if base_url.ends_with('/') {
        url::Url::parse(base_url)?
    } else {
        url::Url::parse(&format!("{}/", base_url))?
    };
    Ok(base.join(path.trim_start_matches('/'))?.to_string())
}
