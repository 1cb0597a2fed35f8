//! OAuth token endpoint client

pub mod token_client;

pub use token_client::TokenEndpointClient;
