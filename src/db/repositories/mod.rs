//! Repository implementations for data access

pub mod solution_cache_repository;
pub mod usage_repository;
pub mod user_repository;

pub use solution_cache_repository::SolutionCacheRepository;
pub use usage_repository::UsageRepository;
pub use user_repository::UserRepository;

// Helper trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
