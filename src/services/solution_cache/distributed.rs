//! Redis-backed distributed tier shared across instances
//!
//! The tier is optional. Without a URL, or while Redis is unreachable, every
//! operation fails fast with [`TierError::Unavailable`] and the chain treats
//! it as a miss. A dropped connection is retried at most once per
//! [`RECONNECT_INTERVAL`].
//!
//! Each entry is stored as JSON under `solution:<key>`. Hits are counted in a
//! separate `solution-hits:<key>` counter so concurrent instances can bump
//! them with a single `INCR`; a lookup reports the stored count plus the
//! counter. Storing an entry resets its counter.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError, RedisResult};
use tokio::sync::RwLock;
use tokio::time::timeout;

use super::tier::{CacheTier, TierError};
use crate::types::{CacheKey, CachedSolution, TierKind, TierStats};

const KEY_PREFIX: &str = "solution:";
const HITS_PREFIX: &str = "solution-hits:";
const RECONNECT_INTERVAL: Duration = Duration::from_secs(30);
const SCAN_COUNT: usize = 200;

/// Check if a Redis error means the connection has to be rebuilt
fn is_connection_error(err: &RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout()
}

fn redis_key(key: &CacheKey) -> String {
    format!("{}{}", KEY_PREFIX, key.as_str())
}

fn hits_key(key: &CacheKey) -> String {
    format!("{}{}", HITS_PREFIX, key.as_str())
}

fn unavailable(message: impl Into<String>) -> TierError {
    TierError::Unavailable(TierKind::Distributed, message.into())
}

fn backend(message: impl ToString) -> TierError {
    TierError::Backend(TierKind::Distributed, message.to_string())
}

/// Combine a stored entry with the hits counted since it was written
fn decode_entry(
    raw: Option<String>,
    hits: Option<i64>,
) -> Result<Option<CachedSolution>, TierError> {
    let Some(json) = raw else {
        return Ok(None);
    };

    let mut solution: CachedSolution = serde_json::from_str(&json).map_err(backend)?;
    solution.hit_count += hits.unwrap_or(0).max(0);
    Ok(Some(solution))
}

pub struct DistributedTier {
    url: Option<String>,
    connection: RwLock<Option<MultiplexedConnection>>,
    last_attempt: Mutex<Option<Instant>>,
    ttl: Duration,
    op_timeout: Duration,
}

impl DistributedTier {
    /// A tier with no backing Redis; every operation is a miss
    pub fn disconnected() -> Self {
        Self {
            url: None,
            connection: RwLock::new(None),
            last_attempt: Mutex::new(None),
            ttl: Duration::from_secs(0),
            op_timeout: Duration::from_millis(0),
        }
    }

    /// Connect to Redis; a failed connection leaves the tier disconnected
    pub async fn connect(url: &str, ttl: Duration, op_timeout: Duration) -> Self {
        let tier = Self {
            url: Some(url.to_string()),
            connection: RwLock::new(None),
            last_attempt: Mutex::new(None),
            ttl,
            op_timeout,
        };

        match tier.open().await {
            Ok(conn) => {
                tracing::info!("Connected to Redis for the distributed solution cache");
                *tier.connection.write().await = Some(conn);
            }
            Err(e) => {
                tracing::warn!("Distributed solution cache disabled for now: {}", e);
            }
        }

        tier
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    async fn open(&self) -> Result<MultiplexedConnection, TierError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| unavailable("no Redis URL configured"))?;

        *self.last_attempt.lock() = Some(Instant::now());

        let client = redis::Client::open(url).map_err(|e| unavailable(e.to_string()))?;
        match timeout(
            self.op_timeout.max(Duration::from_millis(500)),
            client.get_multiplexed_tokio_connection(),
        )
        .await
        {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(unavailable(e.to_string())),
            Err(_) => Err(unavailable("timed out connecting to Redis")),
        }
    }

    /// Current connection, reconnecting when the retry interval has passed
    async fn connection(&self) -> Result<MultiplexedConnection, TierError> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }

        if self.url.is_none() {
            return Err(unavailable("no Redis URL configured"));
        }

        let last_attempt = *self.last_attempt.lock();
        let due = last_attempt.map_or(true, |at| at.elapsed() >= RECONNECT_INTERVAL);
        if !due {
            return Err(unavailable("not connected"));
        }

        let conn = self.open().await?;
        tracing::info!("Reconnected to Redis");
        *self.connection.write().await = Some(conn.clone());
        Ok(conn)
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T, TierError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let conn = self.connection().await?;

        match timeout(self.op_timeout, op(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if is_connection_error(&e) {
                    tracing::warn!("Redis connection lost, will reconnect: {}", e);
                    *self.connection.write().await = None;
                    return Err(unavailable(e.to_string()));
                }
                Err(backend(e))
            }
            Err(_) => {
                tracing::warn!("Redis operation timed out, dropping connection");
                *self.connection.write().await = None;
                Err(unavailable("operation timed out"))
            }
        }
    }

    /// Every key under a prefix, walked with a SCAN cursor
    async fn scan(&self, prefix: &str) -> Result<Vec<String>, TierError> {
        let pattern = format!("{}*", prefix);
        let mut keys = self
            .run(|mut conn| async move {
                let mut keys = Vec::new();
                let mut cursor: u64 = 0;
                loop {
                    let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_COUNT)
                        .query_async(&mut conn)
                        .await?;
                    keys.extend(batch);
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                Ok::<_, RedisError>(keys)
            })
            .await?;

        // SCAN may return a key more than once
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn delete_keys(&self, keys: Vec<String>) -> Result<u64, TierError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let removed = self
            .run(|mut conn| async move { conn.del::<_, i64>(keys).await })
            .await?;
        Ok(removed.max(0) as u64)
    }
}

#[async_trait]
impl CacheTier for DistributedTier {
    fn kind(&self) -> TierKind {
        TierKind::Distributed
    }

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedSolution>, TierError> {
        let (entry_key, hits_key) = (redis_key(key), hits_key(key));
        let (raw, hits) = self
            .run(|mut conn| async move {
                redis::pipe()
                    .cmd("GET")
                    .arg(entry_key)
                    .cmd("GET")
                    .arg(hits_key)
                    .query_async::<_, (Option<String>, Option<i64>)>(&mut conn)
                    .await
            })
            .await?;

        decode_entry(raw, hits)
    }

    async fn store(&self, key: &CacheKey, solution: &CachedSolution) -> Result<(), TierError> {
        let (entry_key, hits_key) = (redis_key(key), hits_key(key));
        let json = serde_json::to_string(solution).map_err(backend)?;
        let ttl_secs = self.ttl.as_secs().max(1);

        self.run(|mut conn| async move {
            redis::pipe()
                .atomic()
                .cmd("SET")
                .arg(entry_key)
                .arg(json)
                .arg("EX")
                .arg(ttl_secs)
                .ignore()
                .cmd("DEL")
                .arg(hits_key)
                .ignore()
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
    }

    async fn record_hit(&self, key: &CacheKey) -> Result<(), TierError> {
        let hits_key = hits_key(key);
        let ttl_secs = self.ttl.as_secs().max(1);

        self.run(|mut conn| async move {
            redis::pipe()
                .atomic()
                .cmd("INCR")
                .arg(&hits_key)
                .ignore()
                .cmd("EXPIRE")
                .arg(&hits_key)
                .arg(ttl_secs)
                .ignore()
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, TierError> {
        let (entry_key, hits_key) = (redis_key(key), hits_key(key));
        let (removed, _): (i64, i64) = self
            .run(|mut conn| async move {
                redis::pipe()
                    .atomic()
                    .cmd("DEL")
                    .arg(entry_key)
                    .cmd("DEL")
                    .arg(hits_key)
                    .query_async(&mut conn)
                    .await
            })
            .await?;
        Ok(removed > 0)
    }

    async fn clear(&self) -> Result<u64, TierError> {
        let entries = self.scan(KEY_PREFIX).await?;
        let counters = self.scan(HITS_PREFIX).await?;

        let removed = self.delete_keys(entries).await?;
        self.delete_keys(counters).await?;
        Ok(removed)
    }

    async fn stats(&self) -> Result<TierStats, TierError> {
        if !self.is_connected().await {
            return Ok(TierStats {
                entries: 0,
                connected: false,
            });
        }

        let keys = self.scan(KEY_PREFIX).await?;
        Ok(TierStats {
            entries: keys.len() as u64,
            connected: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SolutionPayload;

    fn create_payload() -> SolutionPayload {
        SolutionPayload {
            summary: String::new(),
            approaches: vec![],
            insights: vec![],
            pitfalls: vec![],
        }
    }

    #[tokio::test]
    async fn test_disconnected_tier_reports_unavailable() {
        let tier = DistributedTier::disconnected();
        let key = CacheKey::new("Two Sum", "rust");
        let solution = CachedSolution::new(&key, create_payload());

        assert!(matches!(
            tier.lookup(&key).await,
            Err(TierError::Unavailable(TierKind::Distributed, _))
        ));
        assert!(tier.store(&key, &solution).await.is_err());
        assert!(tier.record_hit(&key).await.is_err());
        assert!(tier.clear().await.is_err());

        let stats = tier.stats().await.unwrap();
        assert!(!stats.connected);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_unreachable_redis_degrades_to_disconnected() {
        // Nothing listens on port 1
        let tier = DistributedTier::connect(
            "redis://127.0.0.1:1/",
            Duration::from_secs(60),
            Duration::from_millis(100),
        )
        .await;

        assert!(!tier.is_connected().await);
        assert!(tier.lookup(&CacheKey::new("Two Sum", "rust")).await.is_err());
    }

    #[test]
    fn test_redis_key_prefix() {
        let key = CacheKey::new(" Two Sum ", "Rust");
        assert_eq!(redis_key(&key), "solution:two sum::rust");
        assert_eq!(hits_key(&key), "solution-hits:two sum::rust");
        // Counters must not match the entry SCAN pattern
        assert!(!hits_key(&key).starts_with(KEY_PREFIX));
    }

    #[test]
    fn test_decode_entry_adds_counted_hits() {
        let key = CacheKey::new("Two Sum", "rust");
        let mut stored = CachedSolution::new(&key, create_payload());
        stored.hit_count = 2;
        let json = serde_json::to_string(&stored).unwrap();

        let decoded = decode_entry(Some(json.clone()), Some(3)).unwrap().unwrap();
        assert_eq!(decoded.hit_count, 5);
        assert_eq!(decoded.payload, stored.payload);

        let uncounted = decode_entry(Some(json), None).unwrap().unwrap();
        assert_eq!(uncounted.hit_count, 2);
    }

    #[test]
    fn test_decode_entry_without_entry_is_a_miss() {
        // An orphaned counter alone is not an entry
        assert!(decode_entry(None, Some(7)).unwrap().is_none());
        assert!(matches!(
            decode_entry(Some("not json".to_string()), None),
            Err(TierError::Backend(TierKind::Distributed, _))
        ));
    }
}
