//! Tests for reads, writes, listings, and the conditional-write engine.

mod common;

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use trellis::{
    Backend, BackendEntry, BackendError, BackendEventStream, Compare, KvClient, KvEntry, LeaseId,
    LockSession, StoreError, TxnOp, WriteOptions,
};

// ============================================================================
// Reads and writes
// ============================================================================

#[tokio::test]
async fn get_never_written_key_is_not_found() {
    let client = common::client();
    let err = client.get("missing").await.unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound));
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let client = common::client();
    client.put("services/web", "10.0.0.1", None).await.unwrap();

    let entry = client.get("services/web").await.unwrap();
    assert_eq!(entry.key, "services/web");
    assert_eq!(&entry.value[..], b"10.0.0.1");
}

#[tokio::test]
async fn put_overwrites_existing_value() {
    let client = common::client();
    client.put("k", "v1", None).await.unwrap();
    client.put("k", "v2", None).await.unwrap();

    let entry = client.get("k").await.unwrap();
    assert_eq!(&entry.value[..], b"v2");
}

#[tokio::test]
async fn keys_are_normalized_consistently() {
    let client = common::client();
    client.put("/dir//sub/./key", "v", None).await.unwrap();

    // Every spelling of the same path addresses the same entry.
    let entry = client.get("dir/sub/key").await.unwrap();
    assert_eq!(entry.key, "dir/sub/key");
    assert!(client.exists("/dir/sub/key").await.unwrap());
}

#[tokio::test]
async fn exists_maps_not_found_to_false() {
    let client = common::client();
    assert!(!client.exists("k").await.unwrap());

    client.put("k", "v", None).await.unwrap();
    assert!(client.exists("k").await.unwrap());
}

#[tokio::test]
async fn delete_removes_key() {
    let client = common::client();
    client.put("k", "v", None).await.unwrap();
    client.delete("k").await.unwrap();

    assert!(matches!(
        client.get("k").await.unwrap_err(),
        StoreError::KeyNotFound
    ));
}

#[tokio::test]
async fn delete_missing_key_succeeds() {
    let client = common::client();
    client.delete("never-written").await.unwrap();
}

// ============================================================================
// Listings and tree deletes
// ============================================================================

#[tokio::test]
async fn list_returns_only_entries_under_prefix() {
    let client = common::client();
    client.put("dir/a", "1", None).await.unwrap();
    client.put("dir/b", "2", None).await.unwrap();
    client.put("other", "3", None).await.unwrap();

    let entries = client.list("dir").await.unwrap();
    assert_eq!(entries.len(), 2);
    let mut keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["dir/a", "dir/b"]);
}

#[tokio::test]
async fn list_empty_prefix_is_not_found() {
    let client = common::client();
    let err = client.list("dir").await.unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound));
}

#[tokio::test]
async fn delete_tree_removes_all_entries_under_prefix() {
    let client = common::client();
    client.put("dir/a", "1", None).await.unwrap();
    client.put("dir/b", "2", None).await.unwrap();
    client.put("other", "3", None).await.unwrap();

    client.delete_tree("dir").await.unwrap();

    assert!(matches!(
        client.list("dir").await.unwrap_err(),
        StoreError::KeyNotFound
    ));
    // Unrelated keys are untouched.
    assert!(client.exists("other").await.unwrap());
}

// ============================================================================
// Expiring writes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn ttl_write_expires() {
    let client = common::client();
    client
        .put(
            "session/abc",
            "token",
            Some(WriteOptions::with_ttl(Duration::from_secs(5))),
        )
        .await
        .unwrap();
    assert!(client.exists("session/abc").await.unwrap());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(!client.exists("session/abc").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn ttl_write_is_readable_before_expiry() {
    let client = common::client();
    client
        .put(
            "k",
            "v",
            Some(WriteOptions::with_ttl(Duration::from_secs(60))),
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(client.exists("k").await.unwrap());
}

// ============================================================================
// Conditional writes
// ============================================================================

#[tokio::test]
async fn atomic_put_creates_when_absent() {
    let client = common::client();
    client.atomic_put("k", "v1", None, None).await.unwrap();
    assert_eq!(&client.get("k").await.unwrap().value[..], b"v1");
}

#[tokio::test]
async fn atomic_put_create_on_existing_key_is_key_exists() {
    let client = common::client();
    client.atomic_put("k", "v1", None, None).await.unwrap();

    let err = client.atomic_put("k", "v2", None, None).await.unwrap_err();
    assert!(matches!(err, StoreError::KeyExists));
    assert!(err.is_conflict());
    // The losing write changed nothing.
    assert_eq!(&client.get("k").await.unwrap().value[..], b"v1");
}

#[tokio::test]
async fn atomic_put_with_current_prior_succeeds() {
    let client = common::client();
    client.put("k", "v1", None).await.unwrap();
    let prior = client.get("k").await.unwrap();

    client
        .atomic_put("k", "v2", Some(&prior), None)
        .await
        .unwrap();
    assert_eq!(&client.get("k").await.unwrap().value[..], b"v2");
}

#[tokio::test]
async fn atomic_put_with_stale_prior_is_key_modified() {
    let client = common::client();
    client.put("k", "v1", None).await.unwrap();
    let stale = client.get("k").await.unwrap();

    // A concurrent writer changes the value after our read.
    client.put("k", "v2", None).await.unwrap();

    let err = client
        .atomic_put("k", "v3", Some(&stale), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::KeyModified));
    assert_eq!(&client.get("k").await.unwrap().value[..], b"v2");
}

#[tokio::test(start_paused = true)]
async fn atomic_put_honors_ttl() {
    let client = common::client();
    client
        .atomic_put(
            "k",
            "v",
            None,
            Some(WriteOptions::with_ttl(Duration::from_secs(5))),
        )
        .await
        .unwrap();
    assert!(client.exists("k").await.unwrap());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(!client.exists("k").await.unwrap());
}

#[tokio::test]
async fn atomic_delete_without_prior_is_rejected() {
    let client = common::client();

    // Rejected whether or not the key exists.
    let err = client.atomic_delete("k", None).await.unwrap_err();
    assert!(matches!(err, StoreError::PreviousNotSpecified));

    client.put("k", "v", None).await.unwrap();
    let err = client.atomic_delete("k", None).await.unwrap_err();
    assert!(matches!(err, StoreError::PreviousNotSpecified));
    assert!(client.exists("k").await.unwrap());
}

#[tokio::test]
async fn atomic_delete_with_current_prior_succeeds() {
    let client = common::client();
    client.put("k", "v1", None).await.unwrap();
    let prior = client.get("k").await.unwrap();

    client.atomic_delete("k", Some(&prior)).await.unwrap();
    assert!(!client.exists("k").await.unwrap());
}

#[tokio::test]
async fn atomic_delete_with_stale_prior_is_key_modified() {
    let client = common::client();
    client.put("k", "v1", None).await.unwrap();
    let stale = KvEntry::new("k", "v0");

    let err = client.atomic_delete("k", Some(&stale)).await.unwrap_err();
    assert!(matches!(err, StoreError::KeyModified));
    assert!(client.exists("k").await.unwrap());
}

// ============================================================================
// Degenerate backend responses
// ============================================================================

/// Backend that answers every exact-match read with two entries.
///
/// The in-memory backend never produces this shape; a degenerate backend
/// pins down which entry an exact read treats as authoritative.
struct DuplicatingBackend;

impl DuplicatingBackend {
    fn unsupported() -> BackendError {
        BackendError::Other("not supported by duplicating backend".into())
    }
}

#[async_trait]
impl Backend for DuplicatingBackend {
    async fn get(&self, key: &str, _prefix: bool) -> Result<Vec<BackendEntry>, BackendError> {
        Ok(vec![
            BackendEntry {
                key: key.to_string(),
                value: Bytes::from_static(b"first"),
            },
            BackendEntry {
                key: key.to_string(),
                value: Bytes::from_static(b"second"),
            },
        ])
    }

    async fn put(
        &self,
        _key: &str,
        _value: Bytes,
        _lease: Option<LeaseId>,
    ) -> Result<(), BackendError> {
        Err(Self::unsupported())
    }

    async fn delete(&self, _key: &str, _prefix: bool) -> Result<(), BackendError> {
        Err(Self::unsupported())
    }

    async fn grant_lease(&self, _ttl: Duration) -> Result<LeaseId, BackendError> {
        Err(Self::unsupported())
    }

    async fn watch(
        &self,
        _key: &str,
        _prefix: bool,
        _include_prior: bool,
    ) -> Result<BackendEventStream, BackendError> {
        Err(Self::unsupported())
    }

    async fn transact(&self, _compare: Compare, _then: TxnOp) -> Result<bool, BackendError> {
        Err(Self::unsupported())
    }

    async fn acquire_lock(&self, _key: &str) -> Result<Box<dyn LockSession>, BackendError> {
        Err(Self::unsupported())
    }

    async fn close(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[tokio::test]
async fn get_takes_the_first_of_several_entries() {
    let client = KvClient::new(DuplicatingBackend);
    let entry = client.get("k").await.unwrap();
    assert_eq!(&entry.value[..], b"first");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn operations_after_close_fail() {
    let client = common::client();
    client.put("k", "v", None).await.unwrap();
    client.close().await.unwrap();

    assert!(matches!(
        client.get("k").await.unwrap_err(),
        StoreError::Backend(_)
    ));
}
