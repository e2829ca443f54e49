//! Error taxonomy.
//!
//! Trellis defines a closed set of error conditions returned explicitly from
//! each operation. The conflict variants (`KeyExists`, `KeyModified`) are
//! produced only by the conditional-write engine and indicate a concurrent
//! writer; callers are expected to re-read and decide. Everything outside the
//! typed set surfaces verbatim as a [`BackendError`]. No operation is retried
//! internally.

use thiserror::Error;

/// Error conditions for client-facing operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read or listing found nothing matching the key or prefix.
    #[error("key not found")]
    KeyNotFound,

    /// A conditional create failed because the key already exists.
    ///
    /// Indicates a concurrent creator; recoverable.
    #[error("key already exists")]
    KeyExists,

    /// A conditional update or delete failed because the stored value
    /// changed since the caller last observed it.
    ///
    /// Recoverable: re-read the entry and retry with the fresh prior.
    #[error("key was modified by a concurrent writer")]
    KeyModified,

    /// An atomic delete was invoked without an expected prior entry.
    ///
    /// There is no unconditional atomic delete; this is a programming error
    /// and never succeeds on retry.
    #[error("atomic delete requires an expected prior entry")]
    PreviousNotSpecified,

    /// The backend emitted a watch event kind with no defined translation.
    ///
    /// The backend contract is broken; the watch stream that observed this
    /// yields one such error and then closes.
    #[error("backend emitted an event kind with no defined translation")]
    UnexpectedEvent,

    /// Transport or backend failure, passed through unmodified.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StoreError {
    /// Check if this error indicates a lost conditional-write race.
    ///
    /// Conflicts are recoverable: the caller re-reads and retries with the
    /// freshly observed entry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::KeyExists | Self::KeyModified)
    }

    /// Check if this error means the key was simply absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }
}

/// Result type using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors originating from the backend or its transport.
///
/// These are carried through [`StoreError::Backend`] without translation;
/// retry and deadline policy belong to the backend connection, not to this
/// layer.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend is unreachable or refused the connection.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A lease could not be granted.
    ///
    /// Fatal to the write that requested it; surfaced immediately.
    #[error("lease grant failed: {0}")]
    LeaseGrant(String),

    /// A lock session could not be established or maintained.
    #[error("lock session failed: {0}")]
    LockSession(String),

    /// Any other backend-reported failure.
    #[error("backend error: {0}")]
    Other(String),
}
