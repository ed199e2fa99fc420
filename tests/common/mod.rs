//! Common test utilities and helpers
//!
//! This module provides shared test infrastructure for integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use leetnotes_lib::config::Config;
use leetnotes_lib::db::{open_pool, DbPool};
use leetnotes_lib::services::{
    CacheTier, FixedClock, QuotaService, SolutionCache, SolutionGenerator, SolutionService,
};
use leetnotes_lib::services::solution_cache::{DistributedTier, DurableTier, MemoryTier};
use leetnotes_lib::AppState;

use mocks::StubGenerator;

pub const ADMIN_TOKEN: &str = "test-admin-token";

static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Test context that holds all resources needed for testing
pub struct TestContext {
    /// Database connection pool
    pub pool: DbPool,
    /// Clock pinned to 2024-03-10 12:00 UTC
    pub clock: Arc<FixedClock>,
    /// Generator that answers every miss and counts calls
    pub generator: Arc<StubGenerator>,
    pub memory_tier: Arc<MemoryTier>,
    pub quota_service: Arc<QuotaService>,
    pub solution_cache: Arc<SolutionCache>,
    pub solution_service: Arc<SolutionService>,
    /// Temporary directory for the database file
    pub temp_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with a fresh database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_path = temp_dir.path().join(format!("test_db_{}.db", counter));

        let pool = open_pool(&db_path, 8).expect("Failed to create pool");

        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
        ));
        let generator = Arc::new(StubGenerator::new());
        let memory_tier = Arc::new(MemoryTier::new(Duration::from_secs(60), 100));

        let tiers: Vec<Arc<dyn CacheTier>> = vec![
            memory_tier.clone(),
            Arc::new(DurableTier::new(pool.clone())),
            Arc::new(DistributedTier::disconnected()),
        ];

        let quota_service = Arc::new(QuotaService::new(
            pool.clone(),
            Default::default(),
            clock.clone(),
        ));
        let solution_cache = Arc::new(SolutionCache::new(tiers));
        let solution_service = Arc::new(SolutionService::new(
            quota_service.clone(),
            solution_cache.clone(),
            generator.clone() as Arc<dyn SolutionGenerator>,
        ));

        Self {
            pool,
            clock,
            generator,
            memory_tier,
            quota_service,
            solution_cache,
            solution_service,
            temp_dir,
        }
    }

    /// Application state with an admin token and usage reset enabled
    pub fn app_state(&self) -> Arc<AppState> {
        let config = Config {
            admin_token: Some(ADMIN_TOKEN.to_string()),
            allow_usage_reset: true,
            data_dir: self.temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        self.app_state_with(config)
    }

    pub fn app_state_with(&self, config: Config) -> Arc<AppState> {
        Arc::new(AppState {
            pool: self.pool.clone(),
            config,
            quota_service: self.quota_service.clone(),
            solution_cache: self.solution_cache.clone(),
            solution_service: self.solution_service.clone(),
        })
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
