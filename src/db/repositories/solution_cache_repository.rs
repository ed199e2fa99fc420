//! Solution cache repository, the durable cache tier's storage

use rusqlite::{params, Row};

use super::OptionalExt;
use crate::db::{DbPool, DbResult};
use crate::types::{CachedSolution, CachedSolutionRow};

const ENTRY_COLUMNS: &str =
    "id, cache_key, question_name, language, payload, hit_count, created_at";

#[derive(Clone)]
pub struct SolutionCacheRepository {
    pool: DbPool,
}

impl SolutionCacheRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find_by_key(&self, cache_key: &str) -> DbResult<Option<CachedSolution>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM solution_cache WHERE cache_key = ?",
            ENTRY_COLUMNS
        );

        let row = conn.query_row(&sql, [cache_key], map_row).optional()?;

        Ok(row.map(CachedSolution::try_from).transpose()?)
    }

    pub fn find_by_id(&self, id: &str) -> DbResult<Option<CachedSolution>> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM solution_cache WHERE id = ?", ENTRY_COLUMNS);

        let row = conn.query_row(&sql, [id], map_row).optional()?;

        Ok(row.map(CachedSolution::try_from).transpose()?)
    }

    /// Insert or replace the payload stored under the entry's key.
    ///
    /// An existing row keeps its id and creation time and never loses hits.
    pub fn upsert(&self, entry: &CachedSolution) -> DbResult<CachedSolution> {
        let conn = self.pool.get()?;
        let payload = serde_json::to_string(&entry.payload)?;
        let now = chrono::Utc::now().to_rfc3339();
        let sql = format!(
            r#"
            INSERT INTO solution_cache (id, cache_key, question_name, language, payload, hit_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (cache_key) DO UPDATE SET
                payload = excluded.payload,
                hit_count = MAX(hit_count, excluded.hit_count),
                updated_at = excluded.updated_at
            RETURNING {}
        "#,
            ENTRY_COLUMNS
        );

        let row = conn.query_row(
            &sql,
            params![
                entry.id,
                entry.key,
                entry.question_name,
                entry.language,
                payload,
                entry.hit_count,
                entry.created_at,
                now,
            ],
            map_row,
        )?;

        Ok(CachedSolution::try_from(row)?)
    }

    /// Returns false when no entry exists for the key
    pub fn increment_hits(&self, cache_key: &str) -> DbResult<bool> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE solution_cache SET hit_count = hit_count + 1 WHERE cache_key = ?",
            [cache_key],
        )?;
        Ok(updated > 0)
    }

    pub fn list(&self, limit: usize, offset: usize) -> DbResult<Vec<CachedSolution>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM solution_cache ORDER BY created_at DESC LIMIT ? OFFSET ?",
            ENTRY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params![limit as i64, offset as i64], map_row)?;

        let entries = rows
            .filter_map(|r| r.ok())
            .filter_map(|row| match CachedSolution::try_from(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable cache entry: {}", e);
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    pub fn count(&self) -> DbResult<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM solution_cache", [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }

    pub fn delete_by_key(&self, cache_key: &str) -> DbResult<bool> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM solution_cache WHERE cache_key = ?", [cache_key])?;
        Ok(deleted > 0)
    }

    pub fn delete_all(&self) -> DbResult<u64> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM solution_cache", [])?;
        Ok(deleted as u64)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<CachedSolutionRow> {
    Ok(CachedSolutionRow {
        id: row.get(0)?,
        cache_key: row.get(1)?,
        question_name: row.get(2)?,
        language: row.get(3)?,
        payload: row.get(4)?,
        hit_count: row.get(5)?,
        created_at: row.get(6)?,
    })
}
