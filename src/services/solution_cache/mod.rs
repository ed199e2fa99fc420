//! Multi-tier cache for generated solutions
//!
//! Tiers are consulted in order (memory, durable, distributed) and the
//! first hit wins. A hit is copied into every tier above the one that served
//! it, and the serving tier plus the tiers below it count the hit, so all
//! tiers agree on `hitCount`. Tier failures are logged and treated as misses.

pub mod distributed;
pub mod durable;
pub mod memory;
pub mod tier;

use std::sync::Arc;

use futures::future::join_all;

pub use distributed::DistributedTier;
pub use durable::DurableTier;
pub use memory::MemoryTier;
pub use tier::{CacheTier, TierError};

use crate::config::CacheConfig;
use crate::db::DbPool;
use crate::types::{
    CacheKey, CacheStats, CachedSolution, ClearReport, SolutionPayload, TierKind,
};

/// A lookup hit and the tier that served it
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    pub tier: TierKind,
    pub solution: CachedSolution,
}

pub struct SolutionCache {
    tiers: Vec<Arc<dyn CacheTier>>,
}

impl SolutionCache {
    /// Tiers in lookup order
    pub fn new(tiers: Vec<Arc<dyn CacheTier>>) -> Self {
        Self { tiers }
    }

    /// Memory, durable and (when a Redis URL is configured) distributed tiers
    pub async fn standard(pool: DbPool, config: &CacheConfig, redis_url: Option<&str>) -> Self {
        let distributed = match redis_url {
            Some(url) => {
                DistributedTier::connect(url, config.distributed_ttl, config.distributed_timeout)
                    .await
            }
            None => {
                tracing::info!("No Redis URL configured, distributed cache tier disabled");
                DistributedTier::disconnected()
            }
        };

        Self::new(vec![
            Arc::new(MemoryTier::new(config.memory_ttl, config.memory_max_entries)),
            Arc::new(DurableTier::new(pool)),
            Arc::new(distributed),
        ])
    }

    pub async fn lookup(&self, key: &CacheKey) -> Option<CacheHit> {
        for (index, tier) in self.tiers.iter().enumerate() {
            let mut solution = match tier.lookup(key).await {
                Ok(Some(solution)) => solution,
                Ok(None) => continue,
                Err(e) => {
                    log_tier_error("lookup", &e);
                    continue;
                }
            };

            solution.hit_count += 1;

            for upper in &self.tiers[..index] {
                if let Err(e) = upper.store(key, &solution).await {
                    log_tier_error("backfill", &e);
                }
            }
            for lower in &self.tiers[index..] {
                if let Err(e) = lower.record_hit(key).await {
                    log_tier_error("record hit", &e);
                }
            }

            tracing::debug!("Cache hit for {} in {} tier", key, tier.kind());
            return Some(CacheHit {
                tier: tier.kind(),
                solution,
            });
        }

        tracing::debug!("Cache miss for {}", key);
        None
    }

    /// Store a freshly generated payload in every tier
    pub async fn store(&self, key: &CacheKey, payload: SolutionPayload) -> CachedSolution {
        let solution = CachedSolution::new(key, payload);

        let results = join_all(self.tiers.iter().map(|tier| tier.store(key, &solution))).await;
        for e in results.into_iter().filter_map(Result::err) {
            log_tier_error("store", &e);
        }

        solution
    }

    /// Evict one key from every tier; true when any tier held it
    pub async fn remove(&self, key: &CacheKey) -> bool {
        let mut removed = false;
        for tier in &self.tiers {
            match tier.remove(key).await {
                Ok(hit) => removed |= hit,
                Err(e) => log_tier_error("remove", &e),
            }
        }
        removed
    }

    /// Evict the entry with a durable id from every tier
    pub async fn remove_by_id(&self, id: &str) -> bool {
        let Some(solution) = self.find_by_id(id).await else {
            return false;
        };

        let key = CacheKey::new(&solution.question_name, &solution.language);
        self.remove(&key).await
    }

    pub async fn find_by_id(&self, id: &str) -> Option<CachedSolution> {
        for tier in &self.tiers {
            match tier.find_by_id(id).await {
                Ok(Some(solution)) => return Some(solution),
                Ok(None) => {}
                Err(e) => log_tier_error("find by id", &e),
            }
        }
        None
    }

    /// Browse the durable catalog
    pub async fn list(&self, limit: usize, offset: usize) -> Vec<CachedSolution> {
        for tier in self.tiers.iter().filter(|t| t.kind() == TierKind::Durable) {
            match tier.list(limit, offset).await {
                Ok(entries) => return entries,
                Err(e) => log_tier_error("list", &e),
            }
        }
        Vec::new()
    }

    /// Empty every tier; calling it again is a no-op
    pub async fn clear_all(&self) -> ClearReport {
        let results = join_all(self.tiers.iter().map(|tier| tier.clear())).await;

        let mut report = ClearReport::default();
        for (tier, result) in self.tiers.iter().zip(results) {
            let removed = match result {
                Ok(removed) => removed,
                Err(e) => {
                    log_tier_error("clear", &e);
                    0
                }
            };
            match tier.kind() {
                TierKind::Memory => report.memory += removed,
                TierKind::Durable => report.durable += removed,
                TierKind::Distributed => report.distributed += removed,
            }
        }

        tracing::info!(
            "Cleared solution cache: memory={}, durable={}, distributed={}",
            report.memory,
            report.durable,
            report.distributed
        );
        report
    }

    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        for tier in &self.tiers {
            let tier_stats = match tier.stats().await {
                Ok(tier_stats) => tier_stats,
                Err(e) => {
                    log_tier_error("stats", &e);
                    continue;
                }
            };
            match tier.kind() {
                TierKind::Memory => stats.memory.size += tier_stats.entries,
                TierKind::Durable => stats.durable.count += tier_stats.entries,
                TierKind::Distributed => {
                    stats.distributed.connected |= tier_stats.connected;
                    stats.distributed.keys += tier_stats.entries;
                }
            }
        }

        stats
    }
}

fn log_tier_error(op: &str, error: &TierError) {
    match error {
        // Optional tier; disconnects are already logged by the tier itself
        TierError::Unavailable(TierKind::Distributed, _) => {
            tracing::debug!("Solution cache {} skipped: {}", op, error)
        }
        _ if error.kind() == TierKind::Durable => {
            tracing::error!("Solution cache {} failed: {}", op, error)
        }
        _ => tracing::warn!("Solution cache {} failed: {}", op, error),
    }
}
