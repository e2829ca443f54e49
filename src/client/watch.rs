//! Watch translation and forwarding.
//!
//! Each watch spawns one forwarding task that owns the backend event stream
//! exclusively, translates every raw event into a [`ChangeEvent`], and sends
//! it into a bounded output channel. The task runs until the cancellation
//! signal fires, the backend stream closes, or the caller drops the
//! [`WatchStream`]; in every case the stream closes and the backend handle
//! is released. Events are forwarded in exact backend emission order; a slow
//! consumer blocks the task rather than losing events.

use super::KvClient;
use crate::backend::{Backend, BackendEvent, BackendEventKind};
use crate::core::error::{StoreError, StoreResult};
use crate::core::key::normalize;
use crate::core::types::{ChangeAction, ChangeEvent, KvEntry};
use tokio::sync::{mpsc, watch};

/// Buffered translated events before the forwarding task blocks.
const EVENT_BUFFER: usize = 16;

/// Continuous ordered stream of change events for one watch.
///
/// Yields `Err(StoreError::UnexpectedEvent)` exactly once, then closes, if
/// the backend emits an event kind outside its contract. Dropping the stream
/// stops the forwarding task.
pub struct WatchStream {
    rx: mpsc::Receiver<StoreResult<ChangeEvent>>,
}

impl WatchStream {
    /// Receive the next change, or `None` once the stream has closed
    /// (cancellation, backend stream end, or client close).
    pub async fn recv(&mut self) -> Option<StoreResult<ChangeEvent>> {
        self.rx.recv().await
    }
}

impl<B: Backend> KvClient<B> {
    /// Watch a single key for changes until `cancel` is set to `true`.
    pub async fn watch(
        &self,
        key: &str,
        cancel: watch::Receiver<bool>,
    ) -> StoreResult<WatchStream> {
        self.watch_inner(key, false, cancel).await
    }

    /// Watch every key under `directory` for changes until `cancel` is set
    /// to `true`.
    pub async fn watch_tree(
        &self,
        directory: &str,
        cancel: watch::Receiver<bool>,
    ) -> StoreResult<WatchStream> {
        self.watch_inner(directory, true, cancel).await
    }

    async fn watch_inner(
        &self,
        key: &str,
        prefix: bool,
        mut cancel: watch::Receiver<bool>,
    ) -> StoreResult<WatchStream> {
        let key = normalize(key);
        // Prior values are always requested; translation degrades gracefully
        // when the backend did not track one.
        let mut source = self.backend().watch(&key, prefix, true).await?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(async move {
            tracing::debug!(key = %key, prefix, "watch started");
            loop {
                if *cancel.borrow() {
                    break;
                }
                tokio::select! {
                    // Checked first so an event racing the signal is never
                    // forwarded after cancellation.
                    biased;
                    changed = cancel.changed() => {
                        if changed.is_err() {
                            // Signal sender gone; treat as cancellation.
                            break;
                        }
                    }
                    event = source.recv() => {
                        let Some(event) = event else {
                            // Backend stream closed.
                            break;
                        };
                        let item = translate(event);
                        let fatal = item.is_err();
                        if fatal {
                            tracing::error!(key = %key, "backend emitted unrecognized watch event kind");
                        }
                        if tx.send(item).await.is_err() {
                            // Caller dropped the stream.
                            break;
                        }
                        if fatal {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(key = %key, "watch stopped");
        });

        Ok(WatchStream { rx })
    }
}

/// Translate one raw backend event into the normalized change record.
fn translate(event: BackendEvent) -> StoreResult<ChangeEvent> {
    match event.kind {
        BackendEventKind::Put => Ok(ChangeEvent {
            action: ChangeAction::Put,
            prior: event
                .prior_value
                .map(|v| KvEntry::new(event.key.clone(), v)),
            current: Some(KvEntry::new(event.key, event.value)),
        }),
        BackendEventKind::Delete => Ok(ChangeEvent {
            action: ChangeAction::Delete,
            prior: event.prior_value.map(|v| KvEntry::new(event.key, v)),
            current: None,
        }),
        BackendEventKind::Unknown(_) => Err(StoreError::UnexpectedEvent),
    }
}
