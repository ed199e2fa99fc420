//! Durable tier backed by the `solution_cache` table

use async_trait::async_trait;

use super::tier::{CacheTier, TierError};
use crate::db::{DbPool, DbResult, SolutionCacheRepository};
use crate::types::{CacheKey, CachedSolution, TierKind, TierStats};

/// Source of truth for cached solutions; survives restarts and has no TTL.
pub struct DurableTier {
    repo: SolutionCacheRepository,
}

impl DurableTier {
    pub fn new(pool: DbPool) -> Self {
        Self {
            repo: SolutionCacheRepository::new(pool),
        }
    }

    /// Run a blocking repository call off the async workers
    async fn run<T, F>(&self, op: F) -> Result<T, TierError>
    where
        T: Send + 'static,
        F: FnOnce(&SolutionCacheRepository) -> DbResult<T> + Send + 'static,
    {
        let repo = self.repo.clone();
        tokio::task::spawn_blocking(move || op(&repo))
            .await
            .map_err(|e| TierError::Backend(TierKind::Durable, e.to_string()))?
            .map_err(|e| TierError::Unavailable(TierKind::Durable, e.to_string()))
    }
}

#[async_trait]
impl CacheTier for DurableTier {
    fn kind(&self) -> TierKind {
        TierKind::Durable
    }

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedSolution>, TierError> {
        let key = key.as_str().to_string();
        self.run(move |repo| repo.find_by_key(&key)).await
    }

    async fn store(&self, _key: &CacheKey, solution: &CachedSolution) -> Result<(), TierError> {
        let solution = solution.clone();
        self.run(move |repo| repo.upsert(&solution).map(|_| ())).await
    }

    async fn record_hit(&self, key: &CacheKey) -> Result<(), TierError> {
        let key = key.as_str().to_string();
        self.run(move |repo| repo.increment_hits(&key).map(|_| ())).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, TierError> {
        let key = key.as_str().to_string();
        self.run(move |repo| repo.delete_by_key(&key)).await
    }

    async fn clear(&self) -> Result<u64, TierError> {
        self.run(|repo| repo.delete_all()).await
    }

    async fn stats(&self) -> Result<TierStats, TierError> {
        let count = self.run(|repo| repo.count()).await?;
        Ok(TierStats {
            entries: count,
            connected: true,
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<CachedSolution>, TierError> {
        let id = id.to_string();
        self.run(move |repo| repo.find_by_id(&id)).await
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<CachedSolution>, TierError> {
        self.run(move |repo| repo.list(limit, offset)).await
    }
}
