//! Database connection management

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Not found")]
    NotFound,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbResult<T> = Result<T, DbError>;

const DATABASE_FILE: &str = "leetnotes.db";

/// Concurrent writers wait this long for the write lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize the database connection pool and run migrations
pub fn init_database(data_dir: PathBuf) -> DbResult<DbPool> {
    // Ensure directory exists
    std::fs::create_dir_all(&data_dir).ok();

    let db_path = data_dir.join(DATABASE_FILE);
    tracing::info!("Initializing database at {:?}", db_path);

    open_pool(&db_path, 10)
}

/// Open a pool on `db_path` and bring the schema up to date
pub fn open_pool(db_path: &Path, max_size: u32) -> DbResult<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;
            PRAGMA cache_size = -64000;
            PRAGMA synchronous = NORMAL;
        "#,
        )?;
        Ok(())
    });

    let pool = Pool::builder().max_size(max_size).build(manager)?;

    {
        let conn = pool.get()?;
        super::migrations::run_migrations(&conn)?;
    }

    Ok(pool)
}
