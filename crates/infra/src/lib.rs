//! # ForceLink Infrastructure
//!
//! Infrastructure implementations of the `forcelink-core` ports.
//!
//! This crate contains:
//! - The reqwest-backed [`HttpClient`] with retry and backoff
//! - The OAuth [`TokenEndpointClient`]
//! - Configuration loading (environment, TOML/JSON files)
//! - `tracing` subscriber setup
//! - [`ForceLink`], which wires the above into a `SessionManager`
//!
//! ## Architecture
//! - Implements traits defined in `forcelink-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod app;
pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod observability;

// Re-export commonly used items
pub use app::{ForceLink, RegistrationReport};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use oauth::TokenEndpointClient;
pub use observability::init_tracing;
