//! Client-facing data model.
//!
//! Entries and change events are constructed fresh from each backend
//! response; nothing here is cached or mutated in place.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One stored item at a point in time.
///
/// Immutable snapshot: a new entry is constructed per read. The value an
/// entry carries is also what the conditional-write engine compares against
/// when the entry is passed back as an expected prior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    /// Canonical key.
    pub key: String,

    /// Stored value.
    pub value: Bytes,
}

impl KvEntry {
    /// Construct an entry.
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Options for plain writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteOptions {
    /// When set, the written entry is backed by a lease of this duration and
    /// the backend removes it automatically on expiry. The lease belongs to
    /// the backend, not the caller.
    pub ttl: Option<Duration>,
}

impl WriteOptions {
    /// Options for a write that expires after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }
}

/// What a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    /// A key was created or updated.
    Put,
    /// A key was removed.
    Delete,
}

/// A normalized change record delivered on a watch stream.
///
/// Invariant: for [`ChangeAction::Put`], `current` is always present; for
/// [`ChangeAction::Delete`], `current` is always absent and `prior` reflects
/// the last known value when the backend supplied one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Kind of change.
    pub action: ChangeAction,

    /// State before the change, if the backend supplied it.
    pub prior: Option<KvEntry>,

    /// State after the change. Present for puts, absent for deletes.
    pub current: Option<KvEntry>,
}

/// Per-lock options accepted by the lock façade.
///
/// Accepted for interface compatibility but not currently honored: the
/// backend's session defaults govern lock lifetime and the lock key carries
/// no caller value. This is a known limitation, not a guarantee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockOptions {
    /// Requested session lifetime. Ignored.
    pub ttl: Option<Duration>,

    /// Value to store under the lock key while held. Ignored.
    pub value: Option<Bytes>,
}
