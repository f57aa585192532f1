//! Catalog provider
//!
//! Domain-focused marketplace catalog API. Passes the scanned image
//! reference along with the subject name, which improves match accuracy for
//! collectibles and antiques.

use super::traits::*;
use crate::config::ProviderConfig;
use crate::network::HttpClient;
use crate::search::{SearchRequest, VisualMatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    items: Vec<CatalogItem>,
}

#[derive(Debug, Deserialize)]
struct CatalogItem {
    name: String,
    #[serde(default)]
    listing_url: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    price: Option<CatalogPrice>,
}

#[derive(Debug, Deserialize)]
struct CatalogPrice {
    amount: f64,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Render a price the way listings display it
pub fn format_price(amount: f64, currency: &str) -> String {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => format!("${:.2}", amount),
        "EUR" => format!("€{:.2}", amount),
        "GBP" => format!("£{:.2}", amount),
        other => format!("{:.2} {}", amount, other),
    }
}

/// Marketplace catalog provider
pub struct CatalogProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    max_results: u32,
    timeout: Option<Duration>,
    client: HttpClient,
}

impl CatalogProvider {
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

    /// Build the catalog lookup request
    pub fn request(&self, request: &SearchRequest) -> Result<ProviderRequest> {
        let mut req = ProviderRequest::get(endpoint(&self.base_url, "items")?)
            .param("q", request.subject_name.clone())
            .param("limit", self.max_results.to_string())
            .param_opt("category", request.category.as_deref())
            .param_opt("image_url", request.image_reference.as_deref());

        if let Some(ref key) = self.api_key {
            req = req.header("X-Api-Key", key.clone());
        }

        Ok(req)
    }

    /// Parse catalog items into visual matches
    pub fn response(&self, response: ProviderResponse) -> Result<Vec<VisualMatch>> {
        let response = response.error_for_status()?;
        let parsed: CatalogResponse = response.json().context("invalid catalog response")?;

        Ok(parsed
            .items
            .into_iter()
            .filter(|item| !item.name.trim().is_empty())
            .map(|item| {
                let mut m = VisualMatch::new(item.name.trim()).with_source(&self.name);
                m.source_url = item.listing_url;
                m.image_url = item.thumbnail;
                m.price = item.price.map(|p| format_price(p.amount, &p.currency));
                m
            })
            .collect())
    }
}

#[async_trait]
impl VisualMatchProvider for CatalogProvider {
    fn name(&self) -> &str {
        &self.name
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn provider() -> CatalogProvider {
        let config = ProviderConfig::new("catalog", "catalog").base_url("https://catalog.test/v2/");
        CatalogProvider::from_config(&config, HttpClient::new().unwrap(), 20).unwrap()
    }

    #[test]
    fn test_request_with_image() {
        let req = provider()
            .request(
                &SearchRequest::new("Tiffany lamp")
                    .with_category("lighting")
                    .with_image_reference("https://img.test/scan.jpg"),
            )
            .unwrap();

        assert_eq!(req.url, "https://catalog.test/v2/items");
        assert_eq!(req.params.get("q").map(String::as_str), Some("Tiffany lamp"));
        assert_eq!(req.params.get("category").map(String::as_str), Some("lighting"));
        assert_eq!(
            req.params.get("image_url").map(String::as_str),
            Some("https://img.test/scan.jpg")
        );
        assert_eq!(req.params.get("limit").map(String::as_str), Some("20"));
        assert!(!req.headers.contains_key("X-Api-Key"));
    }

    #[test]
    fn test_request_without_optional_fields() {
        let req = provider().request(&SearchRequest::new("Tiffany lamp")).unwrap();
        assert!(!req.params.contains_key("category"));
        assert!(!req.params.contains_key("image_url"));
    }

    #[test]
    fn test_response() {
        let matches = provider()
            .response(ProviderResponse {
                status: 200,
                headers: HashMap::new(),
                text: r#"{"items":[
                    {"name":"Tiffany Studios dragonfly lamp","listing_url":"https://shop.test/1","thumbnail":"https://shop.test/1.jpg","price":{"amount":4500,"currency":"usd"}},
                    {"name":"Leaded glass shade","price":{"amount":80.5,"currency":"CHF"}},
                    {"name":"   "}
                ]}"#
                .to_string(),
                url: String::new(),
            })
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].price.as_deref(), Some("$4500.00"));
        assert_eq!(matches[0].image_url.as_deref(), Some("https://shop.test/1.jpg"));
        assert_eq!(matches[1].price.as_deref(), Some("80.50 CHF"));
        assert!(matches[1].source_url.is_none());
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(12.0, "EUR"), "€12.00");
        assert_eq!(format_price(3.456, "GBP"), "£3.46");
    }
}
