//! Database layer for LeetNotes
//!
//! This module provides database connection management, migrations,
//! and repository implementations for all data access.

pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{init_database, open_pool, DbError, DbPool, DbResult};
pub use repositories::{SolutionCacheRepository, UsageRepository, UserRepository};
