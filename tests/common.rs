//! Common test utilities.
//!
//! Shared helpers for the integration suite. Import with `mod common;` in
//! test files.

use tokio::sync::watch;
use trellis::{KvClient, MemoryBackend};

/// Create a client over a fresh in-memory backend.
pub fn client() -> KvClient<MemoryBackend> {
    KvClient::new(MemoryBackend::new())
}

/// Create a cancellation signal pair, initially not fired.
pub fn cancel_pair() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}
