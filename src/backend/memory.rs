//! In-process reference backend.
//!
//! A complete, internally synchronized implementation of the [`Backend`]
//! contract backed by an ordered map. It exists as an executable model of
//! the capability semantics and as the fixture for the integration suite:
//! transactions evaluate their predicate and apply their mutation under one
//! state lock, watch delivery preserves mutation order per watcher, leases
//! expire on timer tasks, and locks are per-key sessions.
//!
//! Mutations hold the state lock across watch delivery, so a watcher that
//! stops draining its stream eventually blocks writers. That is the
//! contract's flow-control behavior, not a defect.

use super::{
    Backend, BackendEntry, BackendEvent, BackendEventKind, BackendEventStream, Compare, LeaseId,
    LockSession, TxnOp,
};
use crate::core::error::BackendError;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Buffered events per watcher before senders block.
const WATCH_BUFFER: usize = 16;

/// A stored value and the lease backing it, if any.
#[derive(Debug, Clone)]
struct StoredValue {
    value: Bytes,
    lease: Option<LeaseId>,
}

/// One registered watch.
struct Watcher {
    key: String,
    prefix: bool,
    include_prior: bool,
    sender: mpsc::Sender<BackendEvent>,
}

impl Watcher {
    fn matches(&self, key: &str) -> bool {
        if self.prefix {
            key.starts_with(&self.key)
        } else {
            key == self.key
        }
    }
}

/// Mutable backend state, guarded by one async lock.
#[derive(Default)]
struct State {
    entries: BTreeMap<String, StoredValue>,
    watchers: Vec<Watcher>,
    leases: HashSet<LeaseId>,
}

impl State {
    /// Deliver an event to every matching watcher, in registration order.
    ///
    /// Watchers whose receiver was dropped are forgotten.
    async fn dispatch(&mut self, event: BackendEvent) {
        let mut dead = Vec::new();
        for (idx, watcher) in self.watchers.iter().enumerate() {
            if !watcher.matches(&event.key) {
                continue;
            }
            let mut event = event.clone();
            if !watcher.include_prior {
                event.prior_value = None;
            }
            if watcher.sender.send(event).await.is_err() {
                dead.push(idx);
            }
        }
        for idx in dead.into_iter().rev() {
            self.watchers.remove(idx);
        }
    }

    /// Insert an entry and notify watchers.
    async fn apply_put(&mut self, key: String, value: Bytes, lease: Option<LeaseId>) {
        let prior = self.entries.insert(
            key.clone(),
            StoredValue {
                value: value.clone(),
                lease,
            },
        );
        self.dispatch(BackendEvent {
            kind: BackendEventKind::Put,
            key,
            value,
            prior_value: prior.map(|p| p.value),
        })
        .await;
    }

    /// Remove an entry (if present) and notify watchers.
    async fn apply_delete(&mut self, key: String) {
        let Some(prior) = self.entries.remove(&key) else {
            return;
        };
        self.dispatch(BackendEvent {
            kind: BackendEventKind::Delete,
            key,
            value: Bytes::new(),
            prior_value: Some(prior.value),
        })
        .await;
    }

    fn prefix_keys(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn check_lease(&self, lease: Option<LeaseId>) -> Result<(), BackendError> {
        match lease {
            Some(id) if !self.leases.contains(&id) => {
                Err(BackendError::Other(format!("lease {} not found", id.0)))
            }
            _ => Ok(()),
        }
    }
}

struct Inner {
    state: Mutex<State>,
    /// Per-key lock sessions. Sync map access only; permits are awaited
    /// outside this lock.
    locks: parking_lot::Mutex<HashMap<String, Arc<Semaphore>>>,
    closed: AtomicBool,
    next_lease_id: AtomicI64,
    /// Flipped to `true` by [`Backend::close`]; lease timer tasks subscribe
    /// and end without waiting out their TTL.
    shutdown: watch::Sender<bool>,
}

/// In-memory [`Backend`] implementation.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                locks: parking_lot::Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
                next_lease_id: AtomicI64::new(1),
                shutdown: watch::channel(false).0,
            }),
        }
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(BackendError::Unavailable("backend closed".into()));
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, key: &str, prefix: bool) -> Result<Vec<BackendEntry>, BackendError> {
        self.ensure_open()?;
        let state = self.inner.state.lock().await;
        let entries = if prefix {
            state
                .entries
                .range(key.to_string()..)
                .take_while(|(k, _)| k.starts_with(key))
                .map(|(k, v)| BackendEntry {
                    key: k.clone(),
                    value: v.value.clone(),
                })
                .collect()
        } else {
            state
                .entries
                .get(key)
                .map(|v| BackendEntry {
                    key: key.to_string(),
                    value: v.value.clone(),
                })
                .into_iter()
                .collect()
        };
        Ok(entries)
    }

    async fn put(
        &self,
        key: &str,
        value: Bytes,
        lease: Option<LeaseId>,
    ) -> Result<(), BackendError> {
        self.ensure_open()?;
        let mut state = self.inner.state.lock().await;
        state.check_lease(lease)?;
        state.apply_put(key.to_string(), value, lease).await;
        Ok(())
    }

    async fn delete(&self, key: &str, prefix: bool) -> Result<(), BackendError> {
        self.ensure_open()?;
        let mut state = self.inner.state.lock().await;
        if prefix {
            for key in state.prefix_keys(key) {
                state.apply_delete(key).await;
            }
        } else {
            state.apply_delete(key.to_string()).await;
        }
        Ok(())
    }

    async fn grant_lease(&self, ttl: Duration) -> Result<LeaseId, BackendError> {
        self.ensure_open()?;
        let id = LeaseId(self.inner.next_lease_id.fetch_add(1, Ordering::Relaxed));
        self.inner.state.lock().await.leases.insert(id);

        let inner = Arc::clone(&self.inner);
        let mut shutdown = self.inner.shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(ttl) => {}
                _ = shutdown.changed() => return,
            }
            let mut state = inner.state.lock().await;
            if !state.leases.remove(&id) {
                // Revoked by close() in the meantime.
                return;
            }
            let expired: Vec<String> = state
                .entries
                .iter()
                .filter(|(_, v)| v.lease == Some(id))
                .map(|(k, _)| k.clone())
                .collect();
            tracing::debug!(lease = id.0, keys = expired.len(), "lease expired");
            for key in expired {
                state.apply_delete(key).await;
            }
        });

        Ok(id)
    }

    async fn watch(
        &self,
        key: &str,
        prefix: bool,
        include_prior: bool,
    ) -> Result<BackendEventStream, BackendError> {
        self.ensure_open()?;
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        self.inner.state.lock().await.watchers.push(Watcher {
            key: key.to_string(),
            prefix,
            include_prior,
            sender: tx,
        });
        Ok(rx)
    }

    async fn transact(&self, compare: Compare, then: TxnOp) -> Result<bool, BackendError> {
        self.ensure_open()?;
        let mut state = self.inner.state.lock().await;

        let passed = match &compare {
            Compare::CreateAbsent { key } => !state.entries.contains_key(key),
            Compare::ValueEquals { key, value } => state
                .entries
                .get(key)
                .map_or(false, |stored| stored.value == *value),
        };
        if !passed {
            return Ok(false);
        }

        match then {
            TxnOp::Put { key, value, lease } => {
                state.check_lease(lease)?;
                state.apply_put(key, value, lease).await;
            }
            TxnOp::Delete { key } => {
                state.apply_delete(key).await;
            }
        }
        Ok(true)
    }

    async fn acquire_lock(&self, key: &str) -> Result<Box<dyn LockSession>, BackendError> {
        self.ensure_open()?;
        let semaphore = {
            let mut locks = self.inner.locks.lock();
            Arc::clone(
                locks
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Semaphore::new(1))),
            )
        };
        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|e| BackendError::LockSession(e.to_string()))?;
        Ok(Box::new(MemoryLockSession {
            permit: Some(permit),
        }))
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.inner.closed.store(true, Ordering::Release);
        let _ = self.inner.shutdown.send(true);
        let mut state = self.inner.state.lock().await;
        // Dropping senders ends every open watch stream.
        state.watchers.clear();
        state.leases.clear();
        Ok(())
    }
}

/// Lock session backed by a per-key semaphore permit.
struct MemoryLockSession {
    permit: Option<OwnedSemaphorePermit>,
}

#[async_trait]
impl LockSession for MemoryLockSession {
    async fn release(&mut self) -> Result<(), BackendError> {
        self.permit.take();
        Ok(())
    }
}
