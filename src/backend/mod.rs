//! Backend capability interface.
//!
//! The narrow contract through which the client reaches the coordination
//! store. The client depends on this trait only and never assumes a specific
//! backend implementation; replication, consensus, storage, deadlines, and
//! credentials all live behind it.
//!
//! Keys crossing this boundary are already canonical (see
//! [`crate::core::key::normalize`]); implementations treat them as opaque
//! flat identifiers.

use crate::core::error::BackendError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

pub mod memory;

/// Backend-managed expiry handle attached to writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(pub i64);

/// One key-value pair as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEntry {
    /// Flat canonical key.
    pub key: String,
    /// Stored value.
    pub value: Bytes,
}

/// Kind discriminant of a raw backend watch event.
///
/// `Unknown` carries the raw wire discriminant of an event kind this layer
/// has no translation for; emitting one is a contract violation by the
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendEventKind {
    Put,
    Delete,
    Unknown(i32),
}

/// Raw change event as pushed by the backend's watch machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEvent {
    /// Event kind.
    pub kind: BackendEventKind,
    /// Affected key.
    pub key: String,
    /// New value. Empty for deletes.
    pub value: Bytes,
    /// Value before the change, when the backend tracked it.
    pub prior_value: Option<Bytes>,
}

/// Ordered stream of raw backend events for one watch.
///
/// The receiver is owned exclusively by the forwarding task that consumes
/// it; dropping it tells the backend the watch is gone.
pub type BackendEventStream = mpsc::Receiver<BackendEvent>;

/// Comparison predicate for conditional writes.
///
/// The closed set the conditional-write engine needs: "this key was never
/// created" and "this key still holds the value I last saw". Backends map
/// these onto their native revision or value comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compare {
    /// Passes when the key does not currently exist.
    CreateAbsent { key: String },
    /// Passes when the stored value equals `value` exactly.
    ValueEquals { key: String, value: Bytes },
}

/// Mutation executed when a transaction's predicate passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnOp {
    /// Write `value` under `key`, optionally bound to a lease.
    Put {
        key: String,
        value: Bytes,
        lease: Option<LeaseId>,
    },
    /// Remove `key`.
    Delete { key: String },
}

/// Exclusive ownership of a lock key, bound to a backend session.
///
/// At most one session holds a given key system-wide at any instant; the
/// backend enforces this, not local state. The session ends on release or
/// when the backend loses it (e.g. client disconnect).
#[async_trait]
pub trait LockSession: Send {
    /// Relinquish ownership. Releasing twice is a no-op.
    async fn release(&mut self) -> Result<(), BackendError>;
}

/// Capability set of a revisioned coordination store.
///
/// All methods suspend the caller until the backend responds; this layer
/// imposes no local timeout. The handle is shared read-only across
/// concurrent callers, so implementations must be internally synchronized.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Read the entry at `key`, or every entry sharing it as a prefix.
    ///
    /// An empty result means nothing matched; that is not an error at this
    /// layer.
    async fn get(&self, key: &str, prefix: bool) -> Result<Vec<BackendEntry>, BackendError>;

    /// Write `value` under `key`, optionally bound to a lease.
    async fn put(
        &self,
        key: &str,
        value: Bytes,
        lease: Option<LeaseId>,
    ) -> Result<(), BackendError>;

    /// Remove `key`, or every key sharing it as a prefix in one atomic
    /// operation. Removing nothing is not an error.
    async fn delete(&self, key: &str, prefix: bool) -> Result<(), BackendError>;

    /// Grant a lease that expires after `ttl`.
    async fn grant_lease(&self, ttl: Duration) -> Result<LeaseId, BackendError>;

    /// Open a push-based event stream for `key` (or the prefix).
    ///
    /// Events arrive in backend emission order per key. With
    /// `include_prior`, each event carries the value before the change where
    /// the backend tracks it.
    async fn watch(
        &self,
        key: &str,
        prefix: bool,
        include_prior: bool,
    ) -> Result<BackendEventStream, BackendError>;

    /// Evaluate `compare` and apply `then` as one indivisible operation.
    ///
    /// Returns whether the predicate passed (and the mutation was applied).
    async fn transact(&self, compare: Compare, then: TxnOp) -> Result<bool, BackendError>;

    /// Block until exclusive ownership of `key` is granted.
    async fn acquire_lock(&self, key: &str) -> Result<Box<dyn LockSession>, BackendError>;

    /// Release the backend connection. Further calls fail.
    async fn close(&self) -> Result<(), BackendError>;
}
