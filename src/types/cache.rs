//! Cache tier and admin type definitions

use serde::{Deserialize, Serialize};

use super::{CachedSolution, UsageTotals, UserStats};

/// Cache tier kind, in lookup order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierKind {
    Memory,
    Durable,
    Distributed,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Memory => "memory",
            TierKind::Durable => "durable",
            TierKind::Distributed => "distributed",
        }
    }
}

impl std::fmt::Display for TierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw counters reported by a single tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierStats {
    pub entries: u64,
    pub connected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurableStats {
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributedStats {
    pub connected: bool,
    pub keys: u64,
}

/// Combined statistics for all cache tiers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub memory: MemoryStats,
    pub durable: DurableStats,
    pub distributed: DistributedStats,
}

/// Entries removed per tier by a clear
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub memory: u64,
    pub durable: u64,
    pub distributed: u64,
}

/// Response for the admin stats endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub cache: CacheStats,
    pub users: UserStats,
    pub usage_today: UsageTotals,
}

/// Response for listing durable cache entries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSolutionListResponse {
    pub solutions: Vec<CachedSolution>,
    pub total: u64,
}

/// Response for deleting cache entries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCacheResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared: Option<ClearReport>,
}
