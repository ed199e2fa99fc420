//! LeetNotes - Rust Backend Library
//!
//! This library provides the server side of LeetNotes, a revision-notes
//! service for LeetCode problems: daily usage quotas per plan, a multi-tier
//! cache of generated solutions, and the admin surface over that cache.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod types;

use std::sync::Arc;

use config::Config;
use db::DbPool;
use services::{QuotaService, SolutionCache, SolutionService};

/// Application state shared across all HTTP handlers
pub struct AppState {
    /// Database connection pool
    pub pool: DbPool,
    pub config: Config,
    /// Usage counters and plan limits
    pub quota_service: Arc<QuotaService>,
    /// Memory, durable and distributed cache tiers
    pub solution_cache: Arc<SolutionCache>,
    /// Metered solution lookup and generation
    pub solution_service: Arc<SolutionService>,
}

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use types::*;
