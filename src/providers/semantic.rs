//! Semantic search provider
//!
//! Primary provider: an embedding-backed search API that understands
//! descriptive subject names well. Requires an API key and reports itself
//! disabled without one.

use super::traits::*;
use crate::config::ProviderConfig;
use crate::network::HttpClient;
use crate::search::{SearchRequest, VisualMatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SemanticResponse {
    #[serde(default)]
    results: Vec<SemanticHit>,
}

#[derive(Debug, Deserialize)]
struct SemanticHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    price: Option<String>,
}

/// Semantic search API provider
pub struct SemanticProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    max_results: u32,
    timeout: Option<Duration>,
    client: HttpClient,
}

impl SemanticProvider {
    pub fn from_config(config: &ProviderConfig, client: HttpClient, max_results: u32) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("provider {} has no base_url", config.name))?;

        Ok(Self {
            name: config.name.clone(),
            base_url,
            api_key: config.configured_api_key().map(str::to_string),
            max_results: config.max_results.unwrap_or(max_results),
            timeout: config.timeout_override()?,
            client,
        })
    }

    /// Build the search request
    pub fn request(&self, request: &SearchRequest) -> Result<ProviderRequest> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("{} has no API key configured", self.name))?;

        let query = match request.category.as_deref() {
            Some(category) if !category.trim().is_empty() => {
                format!("{} ({})", request.subject_name, category)
            }
            _ => request.subject_name.clone(),
        };

        Ok(ProviderRequest::post(endpoint(&self.base_url, "search")?)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(json!({
                "query": query,
                "num_results": self.max_results,
                "contents": { "image": true },
            })))
    }

    /// Parse the search response into visual matches
    pub fn response(&self, response: ProviderResponse) -> Result<Vec<VisualMatch>> {
        let response = response.error_for_status()?;
        let parsed: SemanticResponse = response.json().context("invalid semantic search response")?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(|hit| {
                let title = hit.title.filter(|t| !t.trim().is_empty())?;
                let mut m = VisualMatch::new(title.trim()).with_source(&self.name);
                m.source_url = hit.url;
                m.image_url = hit.image;
                m.price = hit.price;
                Some(m)
            })
            .take(self.max_results as usize)
            .collect())
    }
}

#[async_trait]
impl VisualMatchProvider for SemanticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search_visual_matches(&self, request: &SearchRequest) -> Result<Vec<VisualMatch>> {
        let http_request = self.request(request)?;
        let timeout = self.timeout.unwrap_or_else(|| self.client.default_timeout());
        let response = self.client.execute_with_timeout(http_request, timeout).await?;
        let matches = self.response(response)?;
        debug!("{} returned {} matches", self.name, matches.len());
        Ok(matches)
    }
}
