//! Usage repository for database operations

use rusqlite::{params, Row};

use super::OptionalExt;
use crate::db::{DbPool, DbResult};
use crate::types::{UsageAction, UsageRecord, UsageRecordRow, UsageTotals};

const RECORD_COLUMNS: &str =
    "user_id, date, get_solution_count, add_solution_count, variant_count, created_at, updated_at";

pub struct UsageRepository {
    pool: DbPool,
}

impl UsageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find(&self, user_id: &str, date: &str) -> DbResult<Option<UsageRecord>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM usage_records WHERE user_id = ? AND date = ?",
            RECORD_COLUMNS
        );

        let row = conn
            .query_row(&sql, params![user_id, date], map_row)
            .optional()?;

        Ok(row.map(UsageRecord::from))
    }

    /// Atomically bump one counter of the (user, date) record, creating it if absent.
    ///
    /// The limit check is part of the same upsert statement: when the stored
    /// count has already reached `limit` nothing is written and `None` is
    /// returned. `limit == None` never rejects.
    pub fn increment(
        &self,
        user_id: &str,
        date: &str,
        action: UsageAction,
        limit: Option<i64>,
        now: &str,
    ) -> DbResult<Option<UsageRecord>> {
        if matches!(limit, Some(l) if l <= 0) {
            return Ok(None);
        }

        let conn = self.pool.get()?;
        let column = action.column();
        let sql = format!(
            r#"
            INSERT INTO usage_records (user_id, date, {column}, created_at, updated_at)
            VALUES (?1, ?2, 1, ?3, ?3)
            ON CONFLICT (user_id, date) DO UPDATE SET
                {column} = {column} + 1,
                updated_at = excluded.updated_at
            WHERE {column} < ?4
            RETURNING {returning}
        "#,
            column = column,
            returning = RECORD_COLUMNS,
        );

        let row = conn
            .query_row(
                &sql,
                params![user_id, date, now, limit.unwrap_or(i64::MAX)],
                map_row,
            )
            .optional()?;

        Ok(row.map(UsageRecord::from))
    }

    pub fn get_history(&self, user_id: &str, limit: usize) -> DbResult<Vec<UsageRecord>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM usage_records WHERE user_id = ? ORDER BY date DESC LIMIT ?",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params![user_id, limit as i64], map_row)?;

        let records: Vec<UsageRecord> = rows.filter_map(|r| r.ok()).map(UsageRecord::from).collect();

        Ok(records)
    }

    pub fn delete_for_user(&self, user_id: &str) -> DbResult<usize> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM usage_records WHERE user_id = ?", [user_id])?;
        Ok(deleted)
    }

    pub fn delete_for_user_on(&self, user_id: &str, date: &str) -> DbResult<usize> {
        let conn = self.pool.get()?;
        let deleted = conn.execute(
            "DELETE FROM usage_records WHERE user_id = ? AND date = ?",
            params![user_id, date],
        )?;
        Ok(deleted)
    }

    pub fn totals_for_date(&self, date: &str) -> DbResult<UsageTotals> {
        let conn = self.pool.get()?;

        let totals = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(get_solution_count), 0),
                   COALESCE(SUM(add_solution_count), 0),
                   COALESCE(SUM(variant_count), 0)
            FROM usage_records WHERE date = ?
        "#,
            [date],
            |row| {
                Ok(UsageTotals {
                    date: date.to_string(),
                    active_users: row.get(0)?,
                    get_solution: row.get(1)?,
                    add_solution: row.get(2)?,
                    variants: row.get(3)?,
                })
            },
        )?;

        Ok(totals)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<UsageRecordRow> {
    Ok(UsageRecordRow {
        user_id: row.get(0)?,
        date: row.get(1)?,
        get_solution_count: row.get(2)?,
        add_solution_count: row.get(3)?,
        variant_count: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::create_test_pool;

    const NOW: &str = "2024-03-10T12:00:00+00:00";

    #[test]
    fn test_find_missing_record() {
        let (pool, _dir) = create_test_pool();
        let repo = UsageRepository::new(pool);

        assert!(repo.find("user-1", "2024-03-10").unwrap().is_none());
    }

    #[test]
    fn test_increment_creates_record() {
        let (pool, _dir) = create_test_pool();
        let repo = UsageRepository::new(pool);

        let record = repo
            .increment("user-1", "2024-03-10", UsageAction::GetSolution, Some(5), NOW)
            .unwrap()
            .unwrap();

        assert_eq!(record.get_solution_count, 1);
        assert_eq!(record.add_solution_count, 0);
        assert_eq!(record.created_at, NOW);
    }

    #[test]
    fn test_increment_updates_single_row() {
        let (pool, _dir) = create_test_pool();
        let repo = UsageRepository::new(pool.clone());

        for _ in 0..3 {
            repo.increment("user-1", "2024-03-10", UsageAction::AddSolution, None, NOW)
                .unwrap();
        }

        let conn = pool.get().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM usage_records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);

        let record = repo.find("user-1", "2024-03-10").unwrap().unwrap();
        assert_eq!(record.add_solution_count, 3);
    }

    #[test]
    fn test_increment_stops_at_limit() {
        let (pool, _dir) = create_test_pool();
        let repo = UsageRepository::new(pool);

        for _ in 0..2 {
            assert!(repo
                .increment("user-1", "2024-03-10", UsageAction::GetSolution, Some(2), NOW)
                .unwrap()
                .is_some());
        }

        let rejected = repo
            .increment("user-1", "2024-03-10", UsageAction::GetSolution, Some(2), NOW)
            .unwrap();
        assert!(rejected.is_none());

        let record = repo.find("user-1", "2024-03-10").unwrap().unwrap();
        assert_eq!(record.get_solution_count, 2);
    }

    #[test]
    fn test_zero_limit_writes_nothing() {
        let (pool, _dir) = create_test_pool();
        let repo = UsageRepository::new(pool);

        let result = repo
            .increment("user-1", "2024-03-10", UsageAction::GetSolution, Some(0), NOW)
            .unwrap();
        assert!(result.is_none());
        assert!(repo.find("user-1", "2024-03-10").unwrap().is_none());
    }

    #[test]
    fn test_history_and_totals() {
        let (pool, _dir) = create_test_pool();
        let repo = UsageRepository::new(pool);

        repo.increment("user-1", "2024-03-09", UsageAction::GetSolution, None, NOW)
            .unwrap();
        repo.increment("user-1", "2024-03-10", UsageAction::GetSolution, None, NOW)
            .unwrap();
        repo.increment("user-2", "2024-03-10", UsageAction::Variant, None, NOW)
            .unwrap();

        let history = repo.get_history("user-1", 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "2024-03-10");

        let totals = repo.totals_for_date("2024-03-10").unwrap();
        assert_eq!(totals.active_users, 2);
        assert_eq!(totals.get_solution, 1);
        assert_eq!(totals.variants, 1);
    }

    #[test]
    fn test_delete_scopes() {
        let (pool, _dir) = create_test_pool();
        let repo = UsageRepository::new(pool);

        repo.increment("user-1", "2024-03-09", UsageAction::GetSolution, None, NOW)
            .unwrap();
        repo.increment("user-1", "2024-03-10", UsageAction::GetSolution, None, NOW)
            .unwrap();
        repo.increment("user-2", "2024-03-10", UsageAction::GetSolution, None, NOW)
            .unwrap();

        assert_eq!(repo.delete_for_user_on("user-1", "2024-03-10").unwrap(), 1);
        assert_eq!(repo.delete_for_user("user-1").unwrap(), 1);
        assert_eq!(repo.delete_for_user("user-1").unwrap(), 0);
        assert!(repo.find("user-2", "2024-03-10").unwrap().is_some());
    }
}
