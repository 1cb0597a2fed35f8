//! # ForceLink Domain
//!
//! Domain types shared by every ForceLink crate.
//!
//! This crate contains:
//! - Tenant, session and client-handle types
//! - Paginated query result and record types
//! - The HTTP request/response values exchanged with the transport port
//! - Configuration structures
//! - The error taxonomy and `Result` alias
//!
//! ## Architecture
//! - No dependencies on other ForceLink crates
//! - No I/O; pure data and validation

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
