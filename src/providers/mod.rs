//! Search provider module
//!
//! Defines the provider traits and the ordered provider chain, and contains
//! the HTTP-backed provider implementations.

mod chain;
mod loader;
mod traits;

// Provider implementations
pub mod catalog;
pub mod semantic;
pub mod valuation;
pub mod web;

pub use chain::{ChainHit, ProviderChain};
pub use loader::ProviderLoader;
pub use traits::*;
