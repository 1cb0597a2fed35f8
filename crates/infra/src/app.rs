//! Wiring of the concrete adapters into a ready-to-use session manager

use std::sync::Arc;

use forcelink_core::SessionManager;
use forcelink_domain::{Config, ForceLinkError, Result, TenantId};
use futures::future::join_all;
use tracing::{error, info};

use crate::config;
use crate::http::HttpClient;
use crate::oauth::TokenEndpointClient;

/// Outcome of [`ForceLink::register_configured`].
#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub registered: Vec<TenantId>,
    pub failed: Vec<(TenantId, ForceLinkError)>,
}

impl RegistrationReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A [`SessionManager`] backed by [`HttpClient`] and [`TokenEndpointClient`].
#[derive(Debug, Clone)]
pub struct ForceLink {
    config: Config,
    manager: SessionManager,
}

impl ForceLink {
    pub fn new(config: Config) -> Result<Self> {
        let http = Arc::new(HttpClient::from_settings(&config.http)?);
        let oauth = Arc::new(TokenEndpointClient::new(http.clone()));
        let manager = SessionManager::new(oauth, http);
        Ok(Self { config, manager })
    }

    /// Build from [`config::load`].
    pub fn from_default_sources() -> Result<Self> {
        Self::new(config::load()?)
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register every tenant listed in the configuration, concurrently.
    ///
    /// A failing tenant is logged and reported; the others still register.
    pub async fn register_configured(&self) -> RegistrationReport {
        let attempts = self.config.tenants.iter().cloned().map(|tenant| {
            let manager = self.manager.clone();
            async move {
                let tenant_id = tenant.tenant_id.clone();
                (tenant_id, manager.register(tenant).await)
            }
        });

        let mut report = RegistrationReport::default();
        for (tenant_id, outcome) in join_all(attempts).await {
            match outcome {
                Ok(_) => report.registered.push(tenant_id),
                Err(err) => {
                    error!(tenant = %tenant_id, error = %err, "configured tenant failed to register");
                    report.failed.push((tenant_id, err));
                }
            }
        }

        info!(
            registered = report.registered.len(),
            failed = report.failed.len(),
            "configured tenants processed"
        );
        report
    }

    /// Stop every refresh timer and drop all sessions.
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }
}
