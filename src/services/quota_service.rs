//! Quota service: daily usage counters evaluated against plan limits
//!
//! Usage is bucketed by UTC calendar day through [`bucket_for`]. There is no
//! reset job; a new day simply has no record yet, so every user gets fresh
//! limits at the same instant.

use std::sync::Arc;

use thiserror::Error;

use crate::config::PlanLimits;
use crate::db::{DbError, DbPool, UsageRepository, UserRepository};
use crate::services::clock::{bucket_for, Clock, DateKey};
use crate::types::{
    ActionUsage, Plan, ResetScope, UsageAction, UsageRecord, UsageSnapshot, UsageTotals, User,
    UserStats,
};

#[derive(Error, Debug)]
pub enum QuotaError {
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Daily {action} limit reached ({used}/{limit}) on the {plan} plan")]
    QuotaExceeded {
        action: &'static str,
        plan: &'static str,
        used: i64,
        limit: i64,
    },
    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for QuotaError {
    fn from(e: DbError) -> Self {
        QuotaError::Database(e.to_string())
    }
}

pub struct QuotaService {
    usage_repo: UsageRepository,
    user_repo: UserRepository,
    limits: PlanLimits,
    clock: Arc<dyn Clock>,
}

impl QuotaService {
    pub fn new(pool: DbPool, limits: PlanLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            usage_repo: UsageRepository::new(pool.clone()),
            user_repo: UserRepository::new(pool),
            limits,
            clock,
        }
    }

    /// Bucket the current instant falls into
    pub fn today(&self) -> DateKey {
        bucket_for(self.clock.now())
    }

    /// Get the caller's usage for the current day
    pub fn get_usage(&self, user_id: &str) -> Result<UsageSnapshot, QuotaError> {
        let user_id = require_user(user_id)?;
        let date = self.today().to_string();
        let user = self.user_repo.ensure(user_id)?;

        let record = self.usage_repo.find(user_id, &date)?;

        Ok(self.snapshot(user_id, user.plan, &date, record))
    }

    /// Count one action against today's record.
    ///
    /// Check and increment are one statement, so concurrent callers can
    /// neither lose increments nor push a counter past its limit.
    pub fn increment_usage(
        &self,
        user_id: &str,
        action: UsageAction,
    ) -> Result<UsageSnapshot, QuotaError> {
        let user_id = require_user(user_id)?;
        let now = self.clock.now();
        let date = bucket_for(now).to_string();
        let user = self.user_repo.ensure(user_id)?;
        let limit = self.limits.limit(user.plan, action);

        match self
            .usage_repo
            .increment(user_id, &date, action, limit, &now.to_rfc3339())?
        {
            Some(record) => {
                tracing::debug!(
                    "Recorded {} for {} on {} ({})",
                    action.as_str(),
                    user_id,
                    date,
                    record.count(action)
                );
                Ok(self.snapshot(user_id, user.plan, &date, Some(record)))
            }
            None => {
                let used = self
                    .usage_repo
                    .find(user_id, &date)?
                    .map(|r| r.count(action))
                    .unwrap_or(0);
                let limit = limit.unwrap_or(0);
                tracing::info!(
                    "Quota exceeded for {}: {} {}/{}",
                    user_id,
                    action.as_str(),
                    used,
                    limit
                );
                Err(QuotaError::QuotaExceeded {
                    action: action.as_str(),
                    plan: user.plan.as_str(),
                    used,
                    limit,
                })
            }
        }
    }

    /// Most recent daily records for the caller
    pub fn usage_history(&self, user_id: &str, limit: usize) -> Result<Vec<UsageRecord>, QuotaError> {
        let user_id = require_user(user_id)?;
        Ok(self.usage_repo.get_history(user_id, limit)?)
    }

    /// Delete the caller's usage records
    pub fn reset_usage(&self, user_id: &str, scope: ResetScope) -> Result<usize, QuotaError> {
        let user_id = require_user(user_id)?;

        let deleted = match scope {
            ResetScope::AllDays => self.usage_repo.delete_for_user(user_id)?,
            ResetScope::Today => self
                .usage_repo
                .delete_for_user_on(user_id, &self.today().to_string())?,
        };

        tracing::info!("Reset usage for {} ({:?}): {} record(s)", user_id, scope, deleted);
        Ok(deleted)
    }

    /// Aggregate counters across all users for the current day
    pub fn today_totals(&self) -> Result<UsageTotals, QuotaError> {
        Ok(self.usage_repo.totals_for_date(&self.today().to_string())?)
    }

    pub fn set_plan(&self, user_id: &str, plan: Plan) -> Result<User, QuotaError> {
        let user_id = require_user(user_id)?;
        let user = self.user_repo.set_plan(user_id, plan)?;
        tracing::info!("Set plan for {} to {}", user_id, plan.as_str());
        Ok(user)
    }

    pub fn user_stats(&self) -> Result<UserStats, QuotaError> {
        Ok(self.user_repo.stats()?)
    }

    fn snapshot(
        &self,
        user_id: &str,
        plan: Plan,
        date: &str,
        record: Option<UsageRecord>,
    ) -> UsageSnapshot {
        let record = record.unwrap_or_else(|| UsageRecord::empty(user_id, date));
        let usage = |action| ActionUsage::new(record.count(action), self.limits.limit(plan, action));

        UsageSnapshot {
            user_id: user_id.to_string(),
            date: date.to_string(),
            plan,
            unlimited: self.limits.for_plan(plan).is_unlimited(),
            get_solution: usage(UsageAction::GetSolution),
            add_solution: usage(UsageAction::AddSolution),
            variant_count: record.variant_count,
        }
    }
}

fn require_user(user_id: &str) -> Result<&str, QuotaError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(QuotaError::AuthenticationRequired);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::create_test_pool;
    use crate::services::clock::FixedClock;
    use crate::types::Allowance;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    fn create_service() -> (QuotaService, Arc<FixedClock>, tempfile::TempDir) {
        let (pool, dir) = create_test_pool();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
        ));
        let service = QuotaService::new(pool, PlanLimits::default(), clock.clone());
        (service, clock, dir)
    }

    #[test]
    fn test_fresh_day_has_full_allowance() {
        let (service, _clock, _dir) = create_service();

        let usage = service.get_usage("user-1").unwrap();
        assert_eq!(usage.date, "2024-03-10");
        assert_eq!(usage.plan, Plan::Free);
        assert!(!usage.unlimited);
        assert_eq!(usage.get_solution.used, 0);
        assert_eq!(usage.get_solution.left, Allowance::Remaining(5));
        assert_eq!(usage.add_solution.left, Allowance::Remaining(10));
    }

    #[test]
    fn test_blank_user_requires_authentication() {
        let (service, _clock, _dir) = create_service();

        assert_matches!(service.get_usage("  "), Err(QuotaError::AuthenticationRequired));
        assert_matches!(
            service.increment_usage("", UsageAction::GetSolution),
            Err(QuotaError::AuthenticationRequired)
        );
    }

    #[test]
    fn test_increment_until_exhausted() {
        let (service, _clock, _dir) = create_service();

        for expected_left in (0..5).rev() {
            let usage = service
                .increment_usage("user-1", UsageAction::GetSolution)
                .unwrap();
            assert_eq!(usage.get_solution.left, Allowance::Remaining(expected_left));
        }

        let err = service
            .increment_usage("user-1", UsageAction::GetSolution)
            .unwrap_err();
        assert_matches!(
            err,
            QuotaError::QuotaExceeded { used: 5, limit: 5, action: "getSolution", .. }
        );

        // Other action is unaffected
        assert!(service
            .increment_usage("user-1", UsageAction::AddSolution)
            .is_ok());
        assert_eq!(service.get_usage("user-1").unwrap().get_solution.used, 5);
    }

    #[test]
    fn test_next_utc_day_starts_fresh() {
        let (service, clock, _dir) = create_service();

        for _ in 0..5 {
            service
                .increment_usage("user-1", UsageAction::GetSolution)
                .unwrap();
        }
        assert!(service
            .increment_usage("user-1", UsageAction::GetSolution)
            .is_err());

        clock.advance(Duration::hours(12));
        let usage = service.get_usage("user-1").unwrap();
        assert_eq!(usage.date, "2024-03-11");
        assert_eq!(usage.get_solution.used, 0);
        assert!(service
            .increment_usage("user-1", UsageAction::GetSolution)
            .is_ok());

        // Yesterday's record is retained
        assert_eq!(service.usage_history("user-1", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_admin_plan_is_unlimited() {
        let (service, _clock, _dir) = create_service();
        service.set_plan("root", Plan::Admin).unwrap();

        for _ in 0..20 {
            service
                .increment_usage("root", UsageAction::GetSolution)
                .unwrap();
        }

        let usage = service.get_usage("root").unwrap();
        assert!(usage.unlimited);
        assert_eq!(usage.get_solution.used, 20);
        assert_eq!(usage.get_solution.left, Allowance::Unlimited);
        assert_eq!(usage.add_solution.left, Allowance::Unlimited);
    }

    #[test]
    fn test_variant_counter_is_unmetered() {
        let (service, _clock, _dir) = create_service();

        for _ in 0..12 {
            service.increment_usage("user-1", UsageAction::Variant).unwrap();
        }
        assert_eq!(service.get_usage("user-1").unwrap().variant_count, 12);
    }

    #[test]
    fn test_reset_scopes() {
        let (service, clock, _dir) = create_service();

        service.increment_usage("user-1", UsageAction::GetSolution).unwrap();
        clock.advance(Duration::days(1));
        service.increment_usage("user-1", UsageAction::GetSolution).unwrap();

        assert_eq!(service.reset_usage("user-1", ResetScope::Today).unwrap(), 1);
        assert_eq!(service.reset_usage("user-1", ResetScope::Today).unwrap(), 0);
        assert_eq!(service.reset_usage("user-1", ResetScope::AllDays).unwrap(), 1);
        assert!(service.usage_history("user-1", 10).unwrap().is_empty());
    }

    #[test]
    fn test_today_totals() {
        let (service, _clock, _dir) = create_service();

        service.increment_usage("a", UsageAction::GetSolution).unwrap();
        service.increment_usage("b", UsageAction::GetSolution).unwrap();
        service.increment_usage("b", UsageAction::AddSolution).unwrap();

        let totals = service.today_totals().unwrap();
        assert_eq!(totals.active_users, 2);
        assert_eq!(totals.get_solution, 2);
        assert_eq!(totals.add_solution, 1);
    }
}
