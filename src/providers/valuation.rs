//! Valuation provider for appraisal estimates

use super::traits::*;
use crate::config::ProviderConfig;
use crate::network::HttpClient;
use crate::search::{AppraisalQuery, AppraisalResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ValuationResponse {
    #[serde(default)]
    estimate: Option<Estimate>,
}

#[derive(Debug, Deserialize)]
struct Estimate {
    low: f64,
    high: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

/// Market value estimation API
pub struct ValuationProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
    client: HttpClient,
}

impl ValuationProvider {
    pub fn from_config(config: &ProviderConfig, client: HttpClient) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("provider {} has no base_url", config.name))?;

        Ok(Self {
            name: config.name.clone(),
            base_url,
            api_key: config.configured_api_key().map(str::to_string),
            timeout: config.timeout_override()?,
            client,
        })
    }

    /// Build the appraisal request
    pub fn request(&self, query: &AppraisalQuery) -> Result<ProviderRequest> {
        let mut req = ProviderRequest::post(endpoint(&self.base_url, "appraise")?).json(json!({
            "name": query.subject_name,
            "materials": query.materials,
        }));

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        Ok(req)
    }

    /// Parse the estimate; a missing or null estimate yields `None`
    pub fn response(&self, response: ProviderResponse) -> Result<Option<AppraisalResult>> {
        let response = response.error_for_status()?;
        let parsed: ValuationResponse = response.json().context("invalid valuation response")?;

        Ok(parsed.estimate.map(|e| {
            let mut result = AppraisalResult::new(
                e.low,
                e.high,
                e.currency.unwrap_or_else(|| "USD".to_string()),
            );
            result.source = e.source.or_else(|| Some(self.name.clone()));
            result.summary = e.summary;
            result
        }))
    }
}

#[async_trait]
impl AppraisalProvider for ValuationProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search_appraisal_value(&self, query: &AppraisalQuery) -> Result<Option<AppraisalResult>> {
        let http_request = self.request(query)?;
        let timeout = self.timeout.unwrap_or_else(|| self.client.default_timeout());
        let response = self.client.execute_with_timeout(http_request, timeout).await?;
        let estimate = self.response(response)?;
        debug!("{} estimate present: {}", self.name, estimate.is_some());
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn provider() -> ValuationProvider {
        let config = ProviderConfig::new("valuation", "valuation")
            .base_url("https://value.test")
            .api_key("v-1");
        ValuationProvider::from_config(&config, HttpClient::new().unwrap()).unwrap()
    }

    fn ok(text: &str) -> ProviderResponse {
        ProviderResponse {
            status: 200,
            headers: HashMap::new(),
            text: text.to_string(),
            url: String::new(),
        }
    }

    #[test]
    fn test_request_keeps_material_order() {
        let req = provider()
            .request(&AppraisalQuery::new(
                "Pocket watch",
                vec!["silver".to_string(), "enamel".to_string()],
            ))
            .unwrap();

        assert_eq!(req.url, "https://value.test/appraise");
        assert_eq!(req.headers.get("Authorization").map(String::as_str), Some("Bearer v-1"));
        match req.data {
            Some(RequestBody::Json(body)) => {
                assert_eq!(body["name"], "Pocket watch");
                assert_eq!(body["materials"], json!(["silver", "enamel"]));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_response_estimate() {
        let estimate = provider()
            .response(ok(r#"{"estimate":{"low":150,"high":400,"currency":"EUR","summary":"Victorian era"}}"#))
            .unwrap()
            .unwrap();

        assert_eq!(estimate.low, 150.0);
        assert_eq!(estimate.high, 400.0);
        assert_eq!(estimate.currency, "EUR");
        assert_eq!(estimate.source.as_deref(), Some("valuation"));
        assert_eq!(estimate.summary.as_deref(), Some("Victorian era"));
    }

    #[test]
    fn test_response_without_estimate() {
        assert!(provider().response(ok(r#"{"estimate":null}"#)).unwrap().is_none());
        assert!(provider().response(ok("{}")).unwrap().is_none());
    }

    #[test]
    fn test_response_invalid_json() {
        let err = provider().response(ok("<html>")).unwrap_err();
        assert!(err.to_string().contains("invalid valuation response"));
    }
}
