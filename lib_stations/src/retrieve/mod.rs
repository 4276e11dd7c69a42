//! # Data Retrieval Module
//!
//! Outbound HTTP lives here so the rest of the crate never builds a
//! `reqwest` client by hand.
//!
//! - **`ky_http`**: a JSON `ApiClient` on top of `reqwest-middleware` with
//!   exponential-backoff retries for transient failures.

/// Generic HTTP API client with retry middleware for resilient network requests.
pub mod ky_http;

pub use ky_http::{ApiAuth, ApiClient, ApiResponse};
