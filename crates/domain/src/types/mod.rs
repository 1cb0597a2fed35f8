//! Domain types

pub mod client;
pub mod http;
pub mod oauth;
pub mod query;
pub mod session;
pub mod tenant;

pub use client::ClientHandle;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use oauth::{OAuthGrant, TokenGrant};
pub use query::{QueryResult, Record};
pub use session::{
    Identity, PublicSessionInfo, RefreshedInfo, Session, SessionConfig, SessionHealth,
    TenantStatus,
};
pub use tenant::TenantId;
