//! Trellis - Backend-agnostic client for revisioned key-value coordination stores.
//!
//! Trellis layers a small, uniform key-value contract — point reads, prefix
//! listings, writes with optional expiry, atomic conditional writes, change
//! notification streams, and distributed locks — over a replicated
//! coordination backend such as etcd. The backend's native vocabulary (range
//! queries, lease IDs, transaction builders, watch channels, lock sessions)
//! stays behind the [`Backend`] capability trait; callers see only keys,
//! values, and a closed set of typed error conditions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Caller                                │
//! │   get/list │ put/delete │ atomic_put/atomic_delete │ watch/lock │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          KvClient                               │
//! │   key normalization │ lease-on-write │ predicate construction   │
//! │   event translation │ watch task lifecycle │ lock façade        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Backend (trait)                            │
//! │   Get │ Put │ Delete │ GrantLease │ Watch │ Transact │ Lock     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            Replicated coordination store (external)             │
//! │              Consensus │ Storage │ Leases │ Sessions            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::key`] - Key normalization
//! - [`core::types`] - Entries, write options, change events
//! - [`core::error`] - Error taxonomy
//!
//! ## Backend
//! - [`backend`] - The capability trait consumed by the client
//! - [`backend::memory`] - In-process reference backend
//!
//! ## Client
//! - [`client`] - Read/write adapter ([`KvClient`])
//! - [`client::watch`] - Watch translation and forwarding tasks
//! - [`client::lock`] - Distributed lock façade
//!
//! # Guarantees
//!
//! - Conditional writes are submitted as a single backend transaction; there
//!   is no read-then-write window on the client side.
//! - Watch streams preserve backend emission order and never drop events;
//!   slow consumers block the forwarding task instead.
//! - No operation is retried internally. Backend errors surface to the
//!   caller, translated into typed conditions only where the contract
//!   defines one (`KeyNotFound`, `KeyExists`, `KeyModified`).
//!
//! # Example
//!
//! ```
//! use trellis::{KvClient, MemoryBackend};
//!
//! # async fn demo() -> trellis::StoreResult<()> {
//! let client = KvClient::new(MemoryBackend::new());
//! client.put("/services/web", "10.0.0.1:80", None).await?;
//! let entry = client.get("/services/web").await?;
//! assert_eq!(&entry.value[..], b"10.0.0.1:80");
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

// Core data model and errors
pub mod core;

// Backend capability interface
pub mod backend;

// Client-facing adapter
pub mod client;

// Re-exports for convenience
pub use crate::core::error::{BackendError, StoreError, StoreResult};
pub use crate::core::key::normalize;
pub use crate::core::types::{ChangeAction, ChangeEvent, KvEntry, LockOptions, WriteOptions};
pub use backend::memory::MemoryBackend;
pub use backend::{
    Backend, BackendEntry, BackendEvent, BackendEventKind, BackendEventStream, Compare, LeaseId,
    LockSession, TxnOp,
};
pub use client::lock::KvLock;
pub use client::watch::WatchStream;
pub use client::KvClient;
