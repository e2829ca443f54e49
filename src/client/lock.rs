//! Distributed lock façade.
//!
//! Wraps the backend's session-based mutual exclusion behind a minimal
//! acquire/release contract. Exclusivity is enforced by the backend: at most
//! one session holds a given key system-wide at any instant, and a session
//! lost out-of-band (e.g. client disconnect) releases the lock without local
//! involvement.

use super::KvClient;
use crate::backend::{Backend, LockSession};
use crate::core::error::StoreResult;
use crate::core::key::normalize;
use crate::core::types::LockOptions;
use std::sync::Arc;

/// Handle to a distributed lock bound to one key.
///
/// Constructed not-yet-held via [`KvClient::new_lock`].
pub struct KvLock<B: Backend> {
    backend: Arc<B>,
    key: String,
    options: LockOptions,
    session: Option<Box<dyn LockSession>>,
}

impl<B: Backend> KvClient<B> {
    /// Construct a lock handle bound to `key`, not yet held.
    ///
    /// `options` are accepted for interface compatibility but are not
    /// currently honored; see [`LockOptions`].
    pub fn new_lock(&self, key: &str, options: LockOptions) -> KvLock<B> {
        KvLock {
            backend: Arc::clone(self.backend()),
            key: normalize(key),
            options,
            session: None,
        }
    }
}

impl<B: Backend> KvLock<B> {
    /// Block until the backend grants exclusive ownership of the key.
    ///
    /// Fails if the underlying session cannot be established. Acquiring a
    /// handle that is already held is a no-op.
    pub async fn acquire(&mut self) -> StoreResult<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let session = self.backend.acquire_lock(&self.key).await?;
        tracing::debug!(key = %self.key, "lock acquired");
        self.session = Some(session);
        Ok(())
    }

    /// Relinquish ownership. Releasing an unheld handle is a no-op.
    pub async fn release(&mut self) -> StoreResult<()> {
        if let Some(mut session) = self.session.take() {
            session.release().await?;
            tracing::debug!(key = %self.key, "lock released");
        }
        Ok(())
    }

    /// Whether this handle currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.session.is_some()
    }

    /// The canonical key this lock is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The options this handle was constructed with. Not honored.
    pub fn options(&self) -> &LockOptions {
        &self.options
    }
}
