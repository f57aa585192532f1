//! Web search fallback provider
//!
//! Text-only search over a plain HTML results page. Used when the semantic
//! and catalog providers come back empty.

use super::traits::*;
use crate::config::ProviderConfig;
use crate::network::HttpClient;
use crate::search::{SearchRequest, VisualMatch};
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {}: {:?}", css, e))
}

/// Unwrap redirect links of the form `//host/l/?uddg=<target>`
fn resolve_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    let url = Url::parse(&absolute).ok()?;
    if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
        return Some(target.into_owned());
    }
    match url.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

/// HTML web search provider
pub struct WebProvider {
    name: String,
    search_url: String,
    max_results: u32,
    timeout: Option<Duration>,
    price_pattern: Regex,
    client: HttpClient,
}

impl WebProvider {
    pub fn from_config(config: &ProviderConfig, client: HttpClient, max_results: u32) -> Result<Self> {
        let search_url = config
            .base_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("provider {} has no base_url", config.name))?;

        Ok(Self {
            name: config.name.clone(),
            search_url,
            max_results: config.max_results.unwrap_or(max_results),
            timeout: config.timeout_override()?,
            price_pattern: Regex::new(r"[$€£]\s?\d[\d,]*(?:\.\d{1,2})?")?,
            client,
        })
    }

    /// Build the results page request
    pub fn request(&self, request: &SearchRequest) -> Result<ProviderRequest> {
        let query = match request.category.as_deref() {
            Some(category) if !category.trim().is_empty() => {
                format!("{} {}", request.subject_name, category)
            }
            _ => request.subject_name.clone(),
        };

        Ok(ProviderRequest::get(&self.search_url).param("q", query))
    }

    /// Scrape matches from the results page
    pub fn response(&self, response: ProviderResponse) -> Result<Vec<VisualMatch>> {
        let response = response.error_for_status()?;
        self.parse_results(&response.text)
    }

    fn parse_results(&self, html: &str) -> Result<Vec<VisualMatch>> {
        let document = Html::parse_document(html);

        let result_selector = selector("div.result")?;
        let title_selector = selector("a.result__a")?;
        let snippet_selector = selector(".result__snippet")?;
        let image_selector = selector("img.result__icon__img")?;

        let mut matches = Vec::new();

        for element in document.select(&result_selector) {
            if matches.len() >= self.max_results as usize {
                break;
            }

            let title_elem = match element.select(&title_selector).next() {
                Some(t) => t,
                None => continue,
            };

            let title = title_elem.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                continue;
            }

            let link = match title_elem.value().attr("href").and_then(resolve_link) {
                Some(link) => link,
                None => continue,
            };

            let snippet = element
                .select(&snippet_selector)
                .next()
                .map(|s| s.text().collect::<String>());

            let price = snippet
                .as_deref()
                .and_then(|s| self.price_pattern.find(s))
                .map(|m| m.as_str().replace(' ', ""));

            let image = element
                .select(&image_selector)
                .next()
                .and_then(|img| img.value().attr("src"))
                .and_then(resolve_link);

            let mut m = VisualMatch::new(title)
                .with_source_url(link)
                .with_source(&self.name);
            m.price = price;
            m.image_url = image;
            matches.push(m);
        }

        Ok(matches)
    }
}

#[async_trait]
impl VisualMatchProvider for WebProvider {
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
