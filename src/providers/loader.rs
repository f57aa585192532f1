//! Provider loader for building the provider chain from configuration

use super::chain::ProviderChain;
use super::traits::{AppraisalProvider, VisualMatchProvider};
use super::{catalog, semantic, valuation, web};
use crate::config::{ProviderConfig, Settings};
use crate::network::HttpClient;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Build the visual-match chain in configured priority order
    pub fn load_chain(settings: &Settings, client: &HttpClient) -> ProviderChain {
        let mut chain = ProviderChain::new();
        let max_matches = settings.search.max_matches;

        for config in &settings.providers {
            if config.disabled {
                info!("Skipping disabled provider: {}", config.name);
                continue;
            }

            match Self::create_provider(config, client.clone(), max_matches) {
                Ok(provider) => {
                    info!("Loaded provider: {} ({})", config.name, config.engine);
                    chain.push(provider);
                }
                Err(e) => {
                    warn!("Failed to load provider {}: {}", config.name, e);
                }
            }
        }

        info!("Provider chain: {:?}", chain.names());
        chain
    }

    /// Build the appraisal provider
    pub fn load_appraisal(
        settings: &Settings,
        client: &HttpClient,
    ) -> Result<Arc<dyn AppraisalProvider>> {
        let config = &settings.appraisal;
        match config.engine.as_str() {
            "valuation" => Ok(Arc::new(valuation::ValuationProvider::from_config(
                config,
                client.clone(),
            )?)),
            other => Err(anyhow::anyhow!("Unknown appraisal provider type: {}", other)),
        }
    }

    /// Create a visual-match provider instance by engine type
    fn create_provider(
        config: &ProviderConfig,
        client: HttpClient,
        max_matches: u32,
    ) -> Result<Arc<dyn VisualMatchProvider>> {
        let provider: Arc<dyn VisualMatchProvider> = match config.engine.as_str() {
            "semantic" => Arc::new(semantic::SemanticProvider::from_config(
                config,
                client,
                max_matches,
            )?),
            "catalog" => Arc::new(catalog::CatalogProvider::from_config(
                config,
                client,
                max_matches,
            )?),
            "web" => Arc::new(web::WebProvider::from_config(config, client, max_matches)?),
            other => {
                return Err(anyhow::anyhow!("Unknown provider type: {}", other));
            }
        };

        Ok(provider)
    }

    /// Get list of available provider types
    pub fn available_providers() -> Vec<&'static str> {
        vec!["semantic", "catalog", "web"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_order() {
        let settings = Settings::default();
        let chain = ProviderLoader::load_chain(&settings, &HttpClient::new().unwrap());
        assert_eq!(chain.names(), vec!["semantic", "catalog", "web"]);
        // no API key configured by default
        assert!(!chain.get("semantic").unwrap().is_enabled());
        assert!(chain.get("catalog").unwrap().is_enabled());
    }

    #[test]
    fn test_skips_disabled_and_unknown() {
        let mut settings = Settings::default();
        settings.providers = vec![
            ProviderConfig::new("lens", "lens").base_url("https://lens.test"),
            ProviderConfig {
                disabled: true,
                ..ProviderConfig::new("catalog", "catalog").base_url("https://c.test")
            },
            ProviderConfig::new("no-url", "web"),
            ProviderConfig::new("web", "web").base_url("https://w.test"),
        ];

        let chain = ProviderLoader::load_chain(&settings, &HttpClient::new().unwrap());
        assert_eq!(chain.names(), vec!["web"]);
    }

    #[test]
    fn test_invalid_provider_timeout() {
        let client = HttpClient::new().unwrap();
        let mut settings = Settings::default();
        settings.providers[1].timeout = Some(-1.0);
        settings.appraisal.timeout = Some(f64::NAN);

        let chain = ProviderLoader::load_chain(&settings, &client);
        assert_eq!(chain.names(), vec!["semantic", "web"]);
        assert!(ProviderLoader::load_appraisal(&settings, &client).is_err());
    }

    #[test]
    fn test_load_appraisal() {
        let client = HttpClient::new().unwrap();
        let settings = Settings::default();
        let provider = ProviderLoader::load_appraisal(&settings, &client).unwrap();
        assert_eq!(provider.name(), "valuation");

        let mut settings = Settings::default();
        settings.appraisal.engine = "oracle".to_string();
        assert!(ProviderLoader::load_appraisal(&settings, &client).is_err());
    }
}
