//! # ForceLink Core
//!
//! Session lifecycle and query pagination, independent of any concrete
//! transport.
//!
//! This crate contains:
//! - The [`SessionManager`] with its snapshot store and refresh scheduler
//! - The lazy [`QueryStream`] and the [`PageSource`] it pulls from
//! - Port interfaces for HTTP execution and OAuth token exchange
//! - Request shaping for version discovery, identity and query calls
//!
//! ## Architecture Principles
//! - Only depends on `forcelink-domain`
//! - All network access goes through [`HttpExecutor`] and [`OAuthExchanger`]
//! - The core never retries; retry policy belongs to the executor

pub mod api;
pub mod query;
pub mod session;

// Infrastructure ports
pub mod transport_ports;

pub use api::RestQuerySource;
pub use query::{PageSource, QueryStream};
pub use session::{RefreshScheduler, SessionManager, SessionStore};
pub use transport_ports::{HttpExecutor, OAuthExchanger};
