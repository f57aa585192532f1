//! Settings structures for itemlens configuration

use crate::search::UNIDENTIFIED_SENTINEL;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    /// Visual-match providers in priority order
    pub providers: Vec<ProviderConfig>,
    /// Appraisal provider
    pub appraisal: ProviderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            providers: default_providers(),
            appraisal: ProviderConfig::new("valuation", "valuation")
                .base_url("https://api.valuation.example.com/v1"),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (ITEMLENS_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("ITEMLENS_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("ITEMLENS_SENTINEL") {
            self.search.unidentified_sentinel = val;
        }
        if let Some(val) = var("ITEMLENS_REQUEST_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.outgoing.request_timeout = timeout;
            }
        }
        for provider in self
            .providers
            .iter_mut()
            .chain(std::iter::once(&mut self.appraisal))
        {
            if let Some(key) = var(&provider.api_key_var()) {
                provider.api_key = Some(key);
            }
        }
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Get all enabled providers in priority order
    pub fn enabled_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|p| !p.disabled).collect()
    }
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Subject name reported when identification failed
    pub unidentified_sentinel: String,
    /// Maximum matches requested from each provider
    pub max_matches: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            unidentified_sentinel: UNIDENTIFIED_SENTINEL.to_string(),
            max_matches: 20,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
            user_agent: None,
        }
    }
}

impl OutgoingSettings {
    /// Default request timeout as a `Duration`
    pub fn timeout(&self) -> Result<Duration> {
        seconds(self.request_timeout)
    }
}

/// Convert seconds to a `Duration`, rejecting negative and non-finite values
pub fn seconds(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| anyhow::anyhow!("Invalid timeout {}: {}", secs, e))
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Provider implementation to use (semantic, catalog, web, valuation)
    pub engine: String,
    /// Whether the provider is disabled
    pub disabled: bool,
    /// Base URL of the provider API
    pub base_url: Option<String>,
    /// API key if required
    pub api_key: Option<String>,
    /// Custom timeout for this provider in seconds
    pub timeout: Option<f64>,
    /// Maximum results to request
    pub max_results: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: String::new(),
            disabled: false,
            base_url: None,
            api_key: None,
            timeout: None,
            max_results: None,
        }
    }
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: engine.into(),
            ..Default::default()
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> String {
        let name: String = self
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("ITEMLENS_{}_API_KEY", name)
    }

    /// Per-provider timeout override
    pub fn timeout_override(&self) -> Result<Option<Duration>> {
        self.timeout.map(seconds).transpose()
    }

    /// API key, ignoring blank values
    pub fn configured_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Default provider chain: semantic, then catalog, then web
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("semantic", "semantic").base_url("https://api.semantic.example.com/v1"),
        ProviderConfig::new("catalog", "catalog").base_url("https://api.catalog.example.com/v2"),
        ProviderConfig::new("web", "web").base_url("https://html.duckduckgo.com/html/"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.search.unidentified_sentinel, "Unable to Identify");
        let names: Vec<_> = settings.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["semantic", "catalog", "web"]);
        assert_eq!(settings.appraisal.engine, "valuation");
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = r#"
general:
  debug: true
search:
  unidentified_sentinel: "Unknown"
providers:
  - name: catalog
    engine: catalog
    base_url: http://localhost:9000
  - name: web
    engine: web
    disabled: true
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert!(settings.general.debug);
        assert_eq!(settings.search.unidentified_sentinel, "Unknown");
        assert_eq!(settings.search.max_matches, 20);
        assert_eq!(settings.providers.len(), 2);
        assert_eq!(settings.enabled_providers().len(), 1);
        assert_eq!(
            settings.get_provider("catalog").and_then(|p| p.base_url.as_deref()),
            Some("http://localhost:9000")
        );
        assert_eq!(settings.outgoing.request_timeout, 10.0);
    }

    #[test]
    fn test_merge_vars() {
        let mut settings = Settings::default();
        let vars: HashMap<&str, &str> = [
            ("ITEMLENS_DEBUG", "true"),
            ("ITEMLENS_REQUEST_TIMEOUT", "2.5"),
            ("ITEMLENS_SEMANTIC_API_KEY", "sk-test"),
            ("ITEMLENS_VALUATION_API_KEY", "val-key"),
        ]
        .into_iter()
        .collect();

        settings.merge_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert!(settings.general.debug);
        assert_eq!(settings.outgoing.request_timeout, 2.5);
        assert_eq!(
            settings.get_provider("semantic").and_then(|p| p.configured_api_key()),
            Some("sk-test")
        );
        assert_eq!(settings.appraisal.configured_api_key(), Some("val-key"));
        assert!(settings.get_provider("catalog").unwrap().api_key.is_none());
    }

    #[test]
    fn test_invalid_timeouts_are_rejected() {
        assert_eq!(seconds(2.5).unwrap(), Duration::from_millis(2500));
        assert!(seconds(-1.0).is_err());
        assert!(seconds(f64::NAN).is_err());
        assert!(seconds(f64::INFINITY).is_err());

        let mut settings = Settings::default();
        settings.merge_vars(|k| (k == "ITEMLENS_REQUEST_TIMEOUT").then(|| "-1".to_string()));
        assert!(settings.outgoing.timeout().is_err());

        let config = ProviderConfig {
            timeout: Some(-3.0),
            ..ProviderConfig::new("web", "web")
        };
        assert!(config.timeout_override().is_err());
        assert_eq!(ProviderConfig::new("web", "web").timeout_override().unwrap(), None);
    }

    #[test]
    fn test_api_key_var_name() {
        let config = ProviderConfig::new("google-lens", "catalog");
        assert_eq!(config.api_key_var(), "ITEMLENS_GOOGLE_LENS_API_KEY");
        assert_eq!(config.api_key("  ").configured_api_key(), None);
    }
}
