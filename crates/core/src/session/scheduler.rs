//! One-shot refresh timers, at most one per tenant

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use forcelink_domain::TenantId;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug)]
struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Tracks the pending refresh timer of every tenant.
///
/// Arming a tenant aborts the timer it replaces. A timer that fires first
/// removes its own entry, so neither re-arming from inside the callback nor
/// cancelling the tenant can abort a callback that is already running.
#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    timers: DashMap<TenantId, ArmedTimer>,
    generation: AtomicU64,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Arc<Self> {
        Arc::new(Self { interval, timers: DashMap::new(), generation: AtomicU64::new(0) })
    }

    /// Run `callback` once after the interval unless the tenant is re-armed
    /// or cancelled first. Must be called inside a tokio runtime.
    pub fn arm<F, Fut>(self: &Arc<Self>, tenant_id: &TenantId, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let scheduler = Arc::downgrade(self);
        let interval = self.interval;
        let key = tenant_id.clone();

        // The entry is held while spawning so the timer cannot fire before it
        // is registered.
        let entry = self.timers.entry(tenant_id.clone());
        let handle = tokio::spawn(async move {
            tokio::time::sleep(interval).await;

            let Some(scheduler) = scheduler.upgrade() else {
                return;
            };
            let current = scheduler
                .timers
                .remove_if(&key, |_, armed| armed.generation == generation)
                .is_some();
            drop(scheduler);
            if !current {
                return;
            }

            trace!(tenant = %key, generation, "refresh timer fired");
            callback().await;
        });

        let armed = ArmedTimer { generation, handle };
        match entry {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(armed);
                previous.handle.abort();
            }
            Entry::Vacant(vacant) => {
                vacant.insert(armed);
            }
        }
        debug!(tenant = %tenant_id, in_secs = interval.as_secs(), "refresh timer armed");
    }

    /// Abort the tenant's pending timer. Returns whether one was armed.
    pub fn cancel(&self, tenant_id: &TenantId) -> bool {
        match self.timers.remove(tenant_id) {
            Some((_, armed)) => {
                armed.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        self.timers.retain(|_, armed| {
            armed.handle.abort();
            false
        });
    }

    pub fn is_armed(&self, tenant_id: &TenantId) -> bool {
        self.timers.contains_key(tenant_id)
    }

    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
