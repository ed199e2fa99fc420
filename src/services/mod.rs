//! Service layer for LeetNotes
//!
//! This module contains the business logic that sits between the HTTP
//! handlers and the database, cache and generator backends.

pub mod clock;
pub mod llm_service;
pub mod quota_service;
pub mod solution_cache;
pub mod solution_service;

pub use clock::{bucket_for, Clock, DateKey, FixedClock, SystemClock};
pub use llm_service::{GeneratorError, LlmSolutionGenerator, SolutionGenerator};
pub use quota_service::{QuotaError, QuotaService};
pub use solution_cache::{CacheHit, CacheTier, SolutionCache, TierError};
pub use solution_service::{SolutionError, SolutionService};
