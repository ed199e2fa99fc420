//! Process-local memory tier

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::tier::{CacheTier, TierError};
use crate::types::{CacheKey, CachedSolution, TierKind, TierStats};

struct MemoryEntry {
    solution: CachedSolution,
    inserted_at: Instant,
}

/// Fastest tier with the weakest consistency: lost on restart and not
/// shared between instances.
pub struct MemoryTier {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl MemoryTier {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read();
        entries
            .values()
            .filter(|e| e.inserted_at.elapsed() < self.ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self, entries: &mut HashMap<String, MemoryEntry>) {
        entries.retain(|_, e| e.inserted_at.elapsed() < self.ttl);
    }

    /// Drop `key` if it is still expired once the write lock is held
    fn remove_if_expired(&self, key: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() >= self.ttl => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    fn kind(&self) -> TierKind {
        TierKind::Memory
    }

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedSolution>, TierError> {
        {
            let entries = self.entries.read();
            match entries.get(key.as_str()) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Ok(Some(entry.solution.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // A concurrent store may have refreshed the entry since the read
        self.remove_if_expired(key.as_str());
        Ok(None)
    }

    async fn store(&self, key: &CacheKey, solution: &CachedSolution) -> Result<(), TierError> {
        let mut entries = self.entries.write();

        if !entries.contains_key(key.as_str()) && entries.len() >= self.max_entries {
            self.purge_expired(&mut entries);
        }
        if !entries.contains_key(key.as_str()) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key.as_str().to_string(),
            MemoryEntry {
                solution: solution.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn record_hit(&self, key: &CacheKey) -> Result<(), TierError> {
        if let Some(entry) = self.entries.write().get_mut(key.as_str()) {
            entry.solution.hit_count += 1;
        }
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, TierError> {
        Ok(self.entries.write().remove(key.as_str()).is_some())
    }

    async fn clear(&self) -> Result<u64, TierError> {
        let mut entries = self.entries.write();
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }

    async fn stats(&self) -> Result<TierStats, TierError> {
        Ok(TierStats {
            entries: self.len() as u64,
            connected: true,
        })
    }
}
