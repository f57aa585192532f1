//! Search error types

use thiserror::Error;

/// Errors raised while orchestrating a search
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// Subject name was empty or the unidentified sentinel
    #[error("no subject to search for")]
    EmptyInput,

    /// A provider call failed
    #[error("{provider} failed: {message}")]
    ProviderFailure { provider: String, message: String },
}

impl SearchError {
    pub fn provider(provider: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::ProviderFailure {
            provider: provider.into(),
            message: format!("{:#}", err),
        }
    }

    /// Message shown to the user in the `error` field of the search state
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput => self.to_string(),
            Self::ProviderFailure { message, .. } => message.clone(),
        }
    }
}
