//! Snapshot store of tenant sessions and their mutation lanes

use std::sync::Arc;

use dashmap::DashMap;
use forcelink_domain::{Session, TenantId};
use tokio::sync::Mutex;

/// Tenant sessions keyed by [`TenantId`].
///
/// Readers get an `Arc<Session>` snapshot and never wait on I/O. Writers
/// swap whole sessions, so a reader sees either the old or the new value.
/// Each tenant also owns a lane: a fair async mutex that queues that
/// tenant's mutations in arrival order without blocking other tenants.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<TenantId, Arc<Session>>,
    lanes: DashMap<TenantId, Arc<Mutex<()>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tenant_id: &TenantId) -> Option<Arc<Session>> {
        self.sessions.get(tenant_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Store `session`, replacing any previous one for its tenant.
    pub fn insert(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        self.sessions.insert(session.tenant_id.clone(), Arc::clone(&session));
        session
    }

    pub fn remove(&self, tenant_id: &TenantId) -> Option<Arc<Session>> {
        self.sessions.remove(tenant_id).map(|(_, session)| session)
    }

    pub fn contains(&self, tenant_id: &TenantId) -> bool {
        self.sessions.contains_key(tenant_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Registered tenants, sorted.
    pub fn tenants(&self) -> Vec<TenantId> {
        let mut tenants: Vec<TenantId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        tenants.sort();
        tenants
    }

    /// Lane of `tenant_id`, created on first use.
    pub fn lane(&self, tenant_id: &TenantId) -> Arc<Mutex<()>> {
        Arc::clone(self.lanes.entry(tenant_id.clone()).or_default().value())
    }

    /// Drop the lane of a tenant that has no session, unless someone still
    /// holds or waits on it.
    ///
    /// A lane that is still referenced stays, so a queued mutation and a new
    /// one never end up on different mutexes.
    pub fn release_lane(&self, tenant_id: &TenantId) {
        if self.sessions.contains_key(tenant_id) {
            return;
        }
        self.lanes.remove_if(tenant_id, |_, lane| Arc::strong_count(lane) == 1);
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }
}
