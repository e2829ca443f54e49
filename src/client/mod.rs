//! Client-facing key-value adapter.
//!
//! [`KvClient`] maps the uniform key-value contract onto the backend
//! capability set: keys are normalized, backend "nothing matched" becomes
//! [`StoreError::KeyNotFound`], and TTL writes are a lease grant followed by
//! a put with the lease attached. The conditional-write engine lives in
//! [`txn`], watch translation in [`watch`], and the lock façade in [`lock`].

use crate::backend::Backend;
use crate::core::error::{StoreError, StoreResult};
use crate::core::key::normalize;
use crate::core::types::{KvEntry, WriteOptions};
use bytes::Bytes;
use std::sync::Arc;

pub mod lock;
pub mod watch;

mod txn;

/// Client over a revisioned coordination backend.
///
/// Holds the backend handle behind an `Arc`; clones share it. The client
/// keeps no mutable state of its own, so any number of concurrent callers
/// may use one instance. All serialization of conflicting writes is the
/// backend's transactional layer.
pub struct KvClient<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> Clone for KvClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: Backend> KvClient<B> {
    /// Create a client owning `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Create a client over an already shared backend handle.
    pub fn from_shared(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub(crate) fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Read the entry at `key`.
    ///
    /// Fails with [`StoreError::KeyNotFound`] when the backend reports no
    /// matching entry. If the backend ever returns several entries for an
    /// exact-match read, the first is authoritative.
    pub async fn get(&self, key: &str) -> StoreResult<KvEntry> {
        let entries = self.backend.get(&normalize(key), false).await?;
        let first = entries.into_iter().next().ok_or(StoreError::KeyNotFound)?;
        Ok(KvEntry::new(first.key, first.value))
    }

    /// List every entry under `directory`.
    ///
    /// Materialized from a single backend response; fails with
    /// [`StoreError::KeyNotFound`] when no entry shares the prefix.
    pub async fn list(&self, directory: &str) -> StoreResult<Vec<KvEntry>> {
        let entries = self.backend.get(&normalize(directory), true).await?;
        if entries.is_empty() {
            return Err(StoreError::KeyNotFound);
        }
        Ok(entries
            .into_iter()
            .map(|e| KvEntry::new(e.key, e.value))
            .collect())
    }

    /// Write `value` under `key`.
    ///
    /// With a TTL in `options`, a lease of that duration is requested first
    /// and the write carries it; the backend then expires the entry on its
    /// own. A failed lease grant is fatal to the write and surfaces
    /// immediately, never retried.
    pub async fn put(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        options: Option<WriteOptions>,
    ) -> StoreResult<()> {
        let key = normalize(key);
        let lease = match options.and_then(|o| o.ttl) {
            Some(ttl) => Some(self.backend.grant_lease(ttl).await?),
            None => None,
        };
        self.backend.put(&key, value.into(), lease).await?;
        Ok(())
    }

    /// Remove `key` unconditionally. Removing an absent key succeeds.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        self.backend.delete(&normalize(key), false).await?;
        Ok(())
    }

    /// Remove every key under `directory` in one backend operation.
    ///
    /// Atomic from the caller's perspective per the backend's transactional
    /// range-delete guarantee.
    pub async fn delete_tree(&self, directory: &str) -> StoreResult<()> {
        self.backend.delete(&normalize(directory), true).await?;
        Ok(())
    }

    /// Check whether `key` currently exists.
    ///
    /// `KeyNotFound` maps to `false`; any other error propagates.
    pub async fn exists(&self, key: &str) -> StoreResult<bool> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::KeyNotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Release the backend connection.
    ///
    /// Scoped resource: invoke exactly once when the client is no longer
    /// needed. Open watch streams end and further operations fail.
    pub async fn close(&self) -> StoreResult<()> {
        tracing::debug!("closing backend connection");
        self.backend.close().await?;
        Ok(())
    }
}
