//! The capability every cache backend implements

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CacheKey, CachedSolution, TierKind, TierStats};

#[derive(Error, Debug)]
pub enum TierError {
    #[error("{0} tier unavailable: {1}")]
    Unavailable(TierKind, String),
    #[error("{0} tier error: {1}")]
    Backend(TierKind, String),
}

impl TierError {
    pub fn kind(&self) -> TierKind {
        match self {
            TierError::Unavailable(kind, _) | TierError::Backend(kind, _) => *kind,
        }
    }
}

/// One backend in the lookup chain.
///
/// Implementations report failures as [`TierError`]; the chain turns every
/// error into a miss, so a tier never decides a request's outcome.
#[async_trait]
pub trait CacheTier: Send + Sync {
    fn kind(&self) -> TierKind;

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedSolution>, TierError>;

    async fn store(&self, key: &CacheKey, solution: &CachedSolution) -> Result<(), TierError>;

    /// Count a hit served by this tier or a tier above it
    async fn record_hit(&self, _key: &CacheKey) -> Result<(), TierError> {
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, TierError>;

    /// Remove every entry, returning how many were removed
    async fn clear(&self) -> Result<u64, TierError>;

    async fn stats(&self) -> Result<TierStats, TierError>;

    /// Only tiers that keep a browsable catalog answer this
    async fn find_by_id(&self, _id: &str) -> Result<Option<CachedSolution>, TierError> {
        Ok(None)
    }

    /// Only tiers that keep a browsable catalog answer this
    async fn list(&self, _limit: usize, _offset: usize) -> Result<Vec<CachedSolution>, TierError> {
        Ok(Vec::new())
    }
}
