//! Ordered chain of visual-match providers

use super::traits::VisualMatchProvider;
use crate::search::{SearchError, SearchEvent, SearchObserver, SearchRequest, VisualMatch};
use std::sync::Arc;
use std::time::Instant;

/// Matches produced by the first provider that returned any
#[derive(Debug, Clone, Default)]
pub struct ChainHit {
    /// Provider that produced the matches, `None` when every provider came back empty
    pub provider: Option<String>,
    pub matches: Vec<VisualMatch>,
}

/// Providers in priority order; the first non-empty answer wins
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn VisualMatchProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest priority
    pub fn push(&mut self, provider: Arc<dyn VisualMatchProvider>) {
        self.providers.push(provider);
    }

    pub fn with(mut self, provider: Arc<dyn VisualMatchProvider>) -> Self {
        self.push(provider);
        self
    }

    /// Provider names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn VisualMatchProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Query providers in order until one returns a non-empty result.
    ///
    /// Falls through on an empty result only. The first provider error ends
    /// the chain and is returned; later providers are not consulted.
    pub async fn first_non_empty(
        &self,
        request: &SearchRequest,
        observer: &dyn SearchObserver,
    ) -> Result<ChainHit, SearchError> {
        for provider in &self.providers {
            let name = provider.name();
            if !provider.is_enabled() {
                observer.on_event(&SearchEvent::ProviderSkipped { provider: name });
                continue;
            }

            let start = Instant::now();
            match provider.search_visual_matches(request).await {
                Ok(matches) => {
                    observer.on_event(&SearchEvent::ProviderReturned {
                        provider: name,
                        count: matches.len(),
                        elapsed: start.elapsed(),
                    });
                    if !matches.is_empty() {
                        return Ok(ChainHit {
                            provider: Some(name.to_string()),
                            matches,
                        });
                    }
                }
                Err(e) => {
                    let error = SearchError::provider(name, &e);
                    observer.on_event(&SearchEvent::ProviderFailed {
                        provider: name,
                        error: &error.user_message(),
                        elapsed: start.elapsed(),
                    });
                    return Err(error);
                }
            }
        }

        Ok(ChainHit::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::TracingObserver;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        enabled: bool,
        reply: Result<usize, &'static str>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, reply: Result<usize, &'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled: true,
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn disabled(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled: false,
                reply: Ok(1),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VisualMatchProvider for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn search_visual_matches(
            &self,
            _request: &SearchRequest,
        ) -> anyhow::Result<Vec<VisualMatch>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Ok(n) => Ok((0..n)
                    .map(|i| VisualMatch::new(format!("{} #{}", self.name, i)))
                    .collect()),
                Err(msg) => Err(anyhow::anyhow!(msg)),
            }
        }
    }

    #[tokio::test]
    async fn test_first_non_empty_wins() {
        let a = Fixed::new("a", Ok(0));
        let b = Fixed::new("b", Ok(2));
        let c = Fixed::new("c", Ok(5));
        let chain = ProviderChain::new()
            .with(a.clone())
            .with(b.clone())
            .with(c.clone());

        let hit = chain
            .first_non_empty(&SearchRequest::new("vase"), &TracingObserver)
            .await
            .unwrap();

        assert_eq!(hit.provider.as_deref(), Some("b"));
        assert_eq!(hit.matches.len(), 2);
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_disabled_provider_is_not_called() {
        let a = Fixed::disabled("a");
        let b = Fixed::new("b", Ok(1));
        let chain = ProviderChain::new().with(a.clone()).with(b.clone());

        let hit = chain
            .first_non_empty(&SearchRequest::new("vase"), &TracingObserver)
            .await
            .unwrap();

        assert_eq!(a.calls(), 0);
        assert_eq!(hit.provider.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_error_aborts_chain() {
        let a = Fixed::new("a", Ok(0));
        let b = Fixed::new("b", Err("quota exceeded"));
        let c = Fixed::new("c", Ok(3));
        let chain = ProviderChain::new()
            .with(a.clone())
            .with(b.clone())
            .with(c.clone());

        let err = chain
            .first_non_empty(&SearchRequest::new("vase"), &TracingObserver)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SearchError::ProviderFailure {
                provider: "b".to_string(),
                message: "quota exceeded".to_string(),
            }
        );
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_empty() {
        let chain = ProviderChain::new()
            .with(Fixed::new("a", Ok(0)))
            .with(Fixed::new("b", Ok(0)));

        let hit = chain
            .first_non_empty(&SearchRequest::new("vase"), &TracingObserver)
            .await
            .unwrap();

        assert!(hit.provider.is_none());
        assert!(hit.matches.is_empty());
        assert_eq!(chain.names(), vec!["a", "b"]);
    }
}
