//! User repository for database operations

use rusqlite::params;

use super::OptionalExt;
use crate::db::{DbPool, DbResult};
use crate::types::{Plan, User, UserRow, UserStats};

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT id, plan, created_at, updated_at FROM users WHERE id = ?",
                [id],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        plan: row.get(1)?,
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(row.map(User::from))
    }

    /// Fetch the user, creating it on the free plan when first seen
    pub fn ensure(&self, id: &str) -> DbResult<User> {
        {
            let conn = self.pool.get()?;
            conn.execute("INSERT OR IGNORE INTO users (id) VALUES (?)", [id])?;
        }

        self.find_by_id(id)?
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    pub fn set_plan(&self, id: &str, plan: Plan) -> DbResult<User> {
        {
            let conn = self.pool.get()?;
            conn.execute(
                r#"
                INSERT INTO users (id, plan) VALUES (?1, ?2)
                ON CONFLICT (id) DO UPDATE SET
                    plan = excluded.plan,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            "#,
                params![id, plan.as_str()],
            )?;
        }

        self.find_by_id(id)?
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    pub fn stats(&self) -> DbResult<UserStats> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT plan, COUNT(*) FROM users GROUP BY plan")?;

        let rows = stmt.query_map([], |row| {
            let plan: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((Plan::from_str(&plan), count))
        })?;

        let mut stats = UserStats::default();
        for (plan, count) in rows.filter_map(|r| r.ok()) {
            stats.total += count;
            *stats.by_plan.entry(plan).or_insert(0) += count;
        }

        Ok(stats)
    }
}
