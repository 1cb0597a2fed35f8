//! Tenant session lifecycle: registration, refresh and snapshot reads
//!
//! Every mutation of a tenant runs on that tenant's lane (see
//! [`SessionStore::lane`]), so registrations, attended refreshes and timer
//! driven refreshes of one tenant apply one at a time in arrival order,
//! while other tenants proceed untouched. Reads never take a lane.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use dashmap::DashMap;
use forcelink_domain::constants::REFRESH_INTERVAL;
use forcelink_domain::{
    ClientHandle, ForceLinkError, OAuthGrant, PublicSessionInfo, RefreshedInfo, Result, Session,
    SessionConfig, SessionHealth, TenantId,
};
use tracing::{debug, error, info, instrument, warn};

use super::scheduler::RefreshScheduler;
use super::store::SessionStore;
use crate::api::{fetch_identity, fetch_latest_version, RestQuerySource};
use crate::query::{PageSource, QueryStream};
use crate::transport_ports::{HttpExecutor, OAuthExchanger};

/// Owner of every tenant session.
///
/// Cloning is cheap and clones share state. Refresh timers hold only a weak
/// reference, so dropping the last clone stops them.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    oauth: Arc<dyn OAuthExchanger>,
    http: Arc<dyn HttpExecutor>,
    pages: Arc<dyn PageSource>,
    store: SessionStore,
    health: DashMap<TenantId, SessionHealth>,
    scheduler: Arc<RefreshScheduler>,
    closed: AtomicBool,
}

impl SessionManager {
    pub fn new(oauth: Arc<dyn OAuthExchanger>, http: Arc<dyn HttpExecutor>) -> Self {
        let pages: Arc<dyn PageSource> = Arc::new(RestQuerySource::new(Arc::clone(&http)));
        Self {
            inner: Arc::new(ManagerInner {
                oauth,
                http,
                pages,
                store: SessionStore::new(),
                health: DashMap::new(),
                scheduler: RefreshScheduler::new(REFRESH_INTERVAL),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Exchange the authorization code in `config`, validate the token and
    /// store the resulting session.
    ///
    /// The token is validated by resolving the latest API version and the
    /// owner's identity; failures there are reported as
    /// [`ForceLinkError::Auth`]. Nothing is stored unless every step
    /// succeeds. Registering a tenant again replaces its session.
    #[instrument(skip(self, config), fields(tenant = %config.tenant_id))]
    pub async fn register(&self, config: SessionConfig) -> Result<PublicSessionInfo> {
        self.inner.ensure_open()?;
        config.validate()?;
        let grant = config.authorization_code_grant()?;
        let tenant_id = config.tenant_id.clone();

        let lane = self.inner.store.lane(&tenant_id);
        let turn = lane.lock().await;

        let session = match self.inner.authenticate(config, &grant).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "registration failed");
                drop(turn);
                drop(lane);
                self.inner.store.release_lane(&tenant_id);
                return Err(err);
            }
        };

        let session = self.inner.commit(session)?;
        self.inner.health.insert(tenant_id.clone(), SessionHealth::active(Utc::now()));
        self.inner.arm_refresh(&tenant_id);

        info!(
            instance = %session.instance_url,
            api_version = session.client_handle.api_version(),
            "tenant registered"
        );
        Ok(session.public_info())
    }

    /// Refresh the tenant's token now.
    ///
    /// On failure the current session stays in place and keeps being served.
    /// The refresh timer is re-armed either way.
    #[instrument(skip(self), fields(tenant = %tenant_id))]
    pub async fn refresh(&self, tenant_id: &TenantId) -> Result<RefreshedInfo> {
        self.inner.refresh(tenant_id).await
    }

    /// Current session snapshot. Never performs I/O.
    pub fn get(&self, tenant_id: &TenantId) -> Result<Arc<Session>> {
        self.inner.store.get(tenant_id).ok_or_else(|| ForceLinkError::NotRegistered(tenant_id.clone()))
    }

    /// Client handle of the current session.
    pub fn client(&self, tenant_id: &TenantId) -> Result<ClientHandle> {
        Ok(self.get(tenant_id)?.client_handle.clone())
    }

    /// Start a lazy query with the tenant's current client handle.
    ///
    /// The stream keeps the handle it started with even if the session is
    /// refreshed while it is being consumed.
    pub fn query(&self, tenant_id: &TenantId, soql: impl Into<String>) -> Result<QueryStream> {
        let client = self.client(tenant_id)?;
        Ok(QueryStream::start(Arc::clone(&self.inner.pages), client, soql))
    }

    /// Remove a tenant and cancel its refresh timer.
    ///
    /// Waits for the tenant's in-flight mutations. Returns whether the tenant
    /// was registered.
    #[instrument(skip(self), fields(tenant = %tenant_id))]
    pub async fn deregister(&self, tenant_id: &TenantId) -> bool {
        let existed = {
            let lane = self.inner.store.lane(tenant_id);
            let _turn = lane.lock().await;

            self.inner.scheduler.cancel(tenant_id);
            self.inner.health.remove(tenant_id);
            self.inner.store.remove(tenant_id).is_some()
        };
        self.inner.store.release_lane(tenant_id);
        if existed {
            info!("tenant deregistered");
        }
        existed
    }

    /// Cancel every timer and drop every session. Later registrations fail.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.scheduler.cancel_all();
        self.inner.store.clear();
        self.inner.health.clear();
        info!("session manager shut down");
    }

    pub fn is_registered(&self, tenant_id: &TenantId) -> bool {
        self.inner.store.contains(tenant_id)
    }

    pub fn tenants(&self) -> Vec<TenantId> {
        self.inner.store.tenants()
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Outcome of the tenant's latest mutation. `None` for unregistered
    /// tenants.
    pub fn health(&self, tenant_id: &TenantId) -> Option<SessionHealth> {
        if !self.inner.store.contains(tenant_id) {
            return None;
        }
        self.inner.health.get(tenant_id).map(|entry| entry.value().clone())
    }

    /// Whether a refresh timer is pending for the tenant.
    pub fn refresh_scheduled(&self, tenant_id: &TenantId) -> bool {
        self.inner.scheduler.is_armed(tenant_id)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("tenants", &self.inner.store.len())
            .field("lanes", &self.inner.store.lane_count())
            .field("armed_timers", &self.inner.scheduler.armed_count())
            .finish_non_exhaustive()
    }
}

impl ManagerInner {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ForceLinkError::Internal("session manager is shut down".into()));
        }
        Ok(())
    }

    async fn authenticate(&self, config: SessionConfig, grant: &OAuthGrant) -> Result<Session> {
        let token = self.oauth.exchange(&config, grant).await?;
        let instance_url = token
            .instance_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ForceLinkError::Auth("token response carried no instance_url".into()))?;

        let version = fetch_latest_version(self.http.as_ref(), &instance_url, &token.access_token)
            .await
            .map_err(validation_failure)?;
        let handle = ClientHandle::new(instance_url, version, token.access_token.clone());
        let identity = fetch_identity(self.http.as_ref(), &handle, token.id.as_deref())
            .await
            .map_err(validation_failure)?;

        Ok(Session::establish(config, token, handle, identity))
    }

    async fn refresh(self: &Arc<Self>, tenant_id: &TenantId) -> Result<RefreshedInfo> {
        if !self.store.contains(tenant_id) {
            return Err(ForceLinkError::NotRegistered(tenant_id.clone()));
        }

        let outcome = {
            let lane = self.store.lane(tenant_id);
            let _turn = lane.lock().await;
            self.refresh_on_lane(tenant_id).await
        };
        if matches!(outcome, Err(ForceLinkError::NotRegistered(_))) {
            self.store.release_lane(tenant_id);
        }
        outcome
    }

    /// Refresh and record the outcome. The caller holds the tenant's lane.
    async fn refresh_on_lane(self: &Arc<Self>, tenant_id: &TenantId) -> Result<RefreshedInfo> {
        let outcome = self.refresh_locked(tenant_id).await;
        match &outcome {
            Ok(info) => {
                self.health.insert(tenant_id.clone(), SessionHealth::active(info.issued_at));
                info!(issued_at = %info.issued_at, "session refreshed");
            }
            Err(ForceLinkError::NotRegistered(_)) => {}
            Err(_) if self.closed.load(Ordering::SeqCst) => {}
            Err(err) => {
                self.health
                    .entry(tenant_id.clone())
                    .and_modify(|health| *health = health.failed(err))
                    .or_insert_with(|| SessionHealth::active(Utc::now()).failed(err));
                warn!(error = %err, kind = err.kind(), "refresh failed; previous session retained");
            }
        }

        if self.store.contains(tenant_id) {
            self.arm_refresh(tenant_id);
        }
        outcome
    }

    async fn refresh_locked(&self, tenant_id: &TenantId) -> Result<RefreshedInfo> {
        let current =
            self.store.get(tenant_id).ok_or_else(|| ForceLinkError::NotRegistered(tenant_id.clone()))?;
        let grant = current.config.refresh_grant()?;
        let token = self.oauth.exchange(&current.config, &grant).await?;

        let next = self.commit(current.refreshed(token))?;
        Ok(next.refreshed_info())
    }

    /// Store `session` unless the manager was shut down meanwhile.
    ///
    /// `closed` is re-read after the insert: either `shutdown` clears the
    /// store after this insert, or the insert is undone here.
    fn commit(&self, session: Session) -> Result<Arc<Session>> {
        self.ensure_open()?;
        let tenant_id = session.tenant_id.clone();
        let stored = self.store.insert(session);
        if self.closed.load(Ordering::SeqCst) {
            self.store.remove(&tenant_id);
            self.health.remove(&tenant_id);
            return Err(ForceLinkError::Internal("session manager shut down mid-exchange".into()));
        }
        Ok(stored)
    }

    /// Timer path: there is no caller, so failures are only logged.
    async fn refresh_unattended(self: &Arc<Self>, tenant_id: &TenantId) {
        match self.refresh(tenant_id).await {
            Ok(_) => debug!(tenant = %tenant_id, "scheduled refresh applied"),
            Err(ForceLinkError::NotRegistered(_)) => {
                debug!(tenant = %tenant_id, "tenant gone before scheduled refresh");
            }
            Err(err) => error!(
                tenant = %tenant_id,
                error = %err,
                kind = err.kind(),
                "scheduled refresh failed; serving stale session until next attempt"
            ),
        }
    }

    fn arm_refresh(self: &Arc<Self>, tenant_id: &TenantId) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let manager: Weak<Self> = Arc::downgrade(self);
        let tenant = tenant_id.clone();
        self.scheduler.arm(tenant_id, move || async move {
            if let Some(manager) = manager.upgrade() {
                manager.refresh_unattended(&tenant).await;
            }
        });
    }
}

/// Version or identity lookups failing at registration mean the token is
/// unusable.
fn validation_failure(err: ForceLinkError) -> ForceLinkError {
    match err {
        ForceLinkError::Api(failure) => {
            ForceLinkError::Auth(format!("token validation failed: {failure}"))
        }
        other => other,
    }
}
