//! Redis Message Store
//!
//! Implements `MessageStore` on a multiplexed, auto-reconnecting
//! `ConnectionManager`. Prefix listing walks the keyspace with `SCAN` so it
//! never blocks the server the way `KEYS` would.

use crate::error::{StoreError, StoreResult};
use crate::ports::outbound::MessageStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};

/// `COUNT` hint passed to each `SCAN` round trip.
const DEFAULT_SCAN_COUNT: usize = 100;

/// `MessageStore` on Redis.
#[derive(Clone)]
pub struct RedisMessageStore {
    conn: ConnectionManager,
    scan_count: usize,
}

impl RedisMessageStore {
    /// Connect to `url` (`redis://[:password@]host:port[/db]`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to Redis message store");
        Ok(Self {
            conn,
            scan_count: DEFAULT_SCAN_COUNT,
        })
    }

    pub fn with_scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }

    /// Health check: the server must answer `PING` with `PONG`.
    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        if reply != "PONG" {
            return Err(StoreError::Backend(format!(
                "unexpected PING reply: {reply}"
            )));
        }
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SCAN");
        cmd.cursor_arg(0)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(self.scan_count);

        // SCAN may return a key more than once.
        let mut keys = BTreeSet::new();
        let mut iter = cmd.iter_async::<String>(&mut conn).await?;
        while let Some(key) = iter.next_item().await {
            keys.insert(key);
        }
        Ok(keys.into_iter().collect())
    }
}

#[async_trait]
impl MessageStore for RedisMessageStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        // Redis rejects expiries past i64 milliseconds
        let millis = u64::try_from(ttl.as_millis())
            .ok()
            .filter(|ms| *ms <= i64::MAX as u64)
            .ok_or_else(|| StoreError::Backend(format!("TTL out of range: {ttl:?}")))?
            .max(1);
        let _: () = conn.pset_ex(key, value, millis).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn.del(keys).await?;
        Ok(())
    }

    async fn get_all_by_prefix(&self, prefix: &str) -> StoreResult<(Vec<Vec<u8>>, Vec<String>)> {
        let pattern = format!("{}*", escape_glob(prefix));
        let keys = self.scan_keys(&pattern).await?;
        if keys.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut conn = self.conn.clone();
        let fetched: Vec<Option<Vec<u8>>> = conn.mget(&keys).await?;

        // Keys that expired between SCAN and MGET are dropped from both sides.
        let mut values = Vec::with_capacity(keys.len());
        let mut live_keys = Vec::with_capacity(keys.len());
        for (key, value) in keys.into_iter().zip(fetched) {
            if let Some(value) = value {
                values.push(value);
                live_keys.push(key);
            }
        }

        debug!(prefix = %prefix, matched = live_keys.len(), "Prefix scan complete");
        Ok((values, live_keys))
    }
}

/// Escape Redis glob metacharacters so `prefix` matches literally.
pub fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
