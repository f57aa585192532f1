//! HTTP networking module
//!
//! Provides the HTTP client shared by the search providers.

mod client;

pub use client::{default_user_agent, HttpClient};
