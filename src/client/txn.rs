//! Conditional-write engine.
//!
//! Compare-and-write must be one indivisible backend operation: a naive
//! read-then-write leaves a window between the two steps in which a
//! concurrent writer can slip in. Both operations here build a comparison
//! predicate plus a mutation and submit them as a single backend
//! transaction, delegating atomicity entirely to the backend.

use super::KvClient;
use crate::backend::{Backend, Compare, TxnOp};
use crate::core::error::{StoreError, StoreResult};
use crate::core::key::normalize;
use crate::core::types::{KvEntry, WriteOptions};
use bytes::Bytes;

impl<B: Backend> KvClient<B> {
    /// Write `value` under `key` only if the caller's view is still current.
    ///
    /// With `expected_prior = None` the write succeeds only if the key does
    /// not exist yet; a concurrent creator surfaces as
    /// [`StoreError::KeyExists`]. With an expected prior entry, the write
    /// succeeds only while the stored value still equals the prior's value;
    /// a concurrent change surfaces as [`StoreError::KeyModified`].
    ///
    /// A TTL in `options` is honored the same way as in [`KvClient::put`]:
    /// lease grant first, grant failure fatal to the write.
    pub async fn atomic_put(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        expected_prior: Option<&KvEntry>,
        options: Option<WriteOptions>,
    ) -> StoreResult<()> {
        let key = normalize(key);
        let lease = match options.and_then(|o| o.ttl) {
            Some(ttl) => Some(self.backend().grant_lease(ttl).await?),
            None => None,
        };
        let then = TxnOp::Put {
            key: key.clone(),
            value: value.into(),
            lease,
        };
        let compare = match expected_prior {
            None => Compare::CreateAbsent { key },
            Some(prior) => Compare::ValueEquals {
                key,
                value: prior.value.clone(),
            },
        };

        if self.backend().transact(compare, then).await? {
            Ok(())
        } else if expected_prior.is_none() {
            Err(StoreError::KeyExists)
        } else {
            Err(StoreError::KeyModified)
        }
    }

    /// Remove `key` only while it still holds `expected_prior`'s value.
    ///
    /// There is no unconditional atomic delete: passing `None` fails
    /// immediately with [`StoreError::PreviousNotSpecified`]. A concurrent
    /// change surfaces as [`StoreError::KeyModified`].
    pub async fn atomic_delete(
        &self,
        key: &str,
        expected_prior: Option<&KvEntry>,
    ) -> StoreResult<()> {
        let prior = expected_prior.ok_or(StoreError::PreviousNotSpecified)?;
        let key = normalize(key);
        let compare = Compare::ValueEquals {
            key: key.clone(),
            value: prior.value.clone(),
        };

        if self.backend().transact(compare, TxnOp::Delete { key }).await? {
            Ok(())
        } else {
            Err(StoreError::KeyModified)
        }
    }
}
