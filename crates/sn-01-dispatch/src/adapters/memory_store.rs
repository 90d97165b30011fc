//! In-memory Message Store
//!
//! TTL map for tests and single-process deployments. Expired entries read as
//! absent and are purged lazily on the next write.

use crate::error::{StoreError, StoreResult};
use crate::ports::outbound::MessageStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

struct Entry {
    value: Vec<u8>,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// `MessageStore` backed by an ordered map.
#[derive(Default)]
pub struct InMemoryMessageStore {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, e| e.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn get_all_by_prefix(&self, prefix: &str) -> StoreResult<(Vec<Vec<u8>>, Vec<String>)> {
        let now = Instant::now();
        let entries = self.entries.read();

        let mut values = Vec::new();
        let mut keys = Vec::new();
        for (key, entry) in entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            if entry.is_live(now) {
                values.push(entry.value.clone());
                keys.push(key.clone());
            }
        }
        Ok((values, keys))
    }
}

/// Scriptable store for dispatcher and handler tests.
///
/// Delegates to an `InMemoryMessageStore`, counts writes, and fails on demand.
#[derive(Default)]
pub struct MockMessageStore {
    inner: InMemoryMessageStore,
    writes: RwLock<Vec<String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    /// Fail only the n-th write (1-based), 0 = disabled
    fail_nth_write: AtomicUsize,
}

impl MockMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_nth_write(&self, n: usize) {
        self.fail_nth_write.store(n, Ordering::SeqCst);
    }

    /// Keys of every attempted write, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.read().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.read().len()
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MockMessageStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.check_reads()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()> {
        let attempt = {
            let mut writes = self.writes.write();
            writes.push(key.to_string());
            writes.len()
        };

        if self.fail_writes.load(Ordering::SeqCst)
            || self.fail_nth_write.load(Ordering::SeqCst) == attempt
        {
            return Err(StoreError::Backend("write refused".into()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        self.inner.delete(keys).await
    }

    async fn get_all_by_prefix(&self, prefix: &str) -> StoreResult<(Vec<Vec<u8>>, Vec<String>)> {
        self.check_reads()?;
        self.inner.get_all_by_prefix(prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_missing_key_is_absent_not_error() {
        let store = InMemoryMessageStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = InMemoryMessageStore::new();

        store.set("a", b"1".to_vec(), TTL).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(b"1".to_vec()));

        store.delete(&["a".to_string(), "zzz".to_string()]).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = InMemoryMessageStore::new();
        store.set("a", b"1".to_vec(), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.get("a").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let store = InMemoryMessageStore::new();
        store.set("a", b"1".to_vec(), Duration::MAX).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_restarts_ttl() {
        let store = InMemoryMessageStore::new();
        store.set("a", b"1".to_vec(), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        store.set("a", b"2".to_vec(), TTL).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(store.get("a").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_prefix_scan() {
        let store = InMemoryMessageStore::new();
        store.set("did:1+a", b"1".to_vec(), TTL).await.unwrap();
        store.set("did:1+b", b"2".to_vec(), TTL).await.unwrap();
        store.set("did:10+c", b"3".to_vec(), TTL).await.unwrap();
        store.set("plain", b"4".to_vec(), TTL).await.unwrap();

        let (values, keys) = store.get_all_by_prefix("did:1+").await.unwrap();

        assert_eq!(keys, vec!["did:1+a".to_string(), "did:1+b".to_string()]);
        assert_eq!(values, vec![b"1".to_vec(), b"2".to_vec()]);
    }

    #[tokio::test]
    async fn test_prefix_scan_no_match_is_empty() {
        let store = InMemoryMessageStore::new();

        let (values, keys) = store.get_all_by_prefix("nobody+").await.unwrap();

        assert!(values.is_empty());
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_mock_fails_nth_write() {
        let store = MockMessageStore::new();
        store.fail_nth_write(2);

        assert!(store.set("a", vec![], TTL).await.is_ok());
        assert!(store.set("b", vec![], TTL).await.is_err());
        assert!(store.set("c", vec![], TTL).await.is_ok());
        assert_eq!(store.write_count(), 3);
    }
}
