//! Usage quota type definitions

use serde::{Deserialize, Serialize, Serializer};

use super::Plan;

/// Actions counted in a user's daily usage record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UsageAction {
    GetSolution,
    AddSolution,
    /// Tracked for analytics, never limited
    Variant,
}

impl UsageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageAction::GetSolution => "getSolution",
            UsageAction::AddSolution => "addSolution",
            UsageAction::Variant => "variant",
        }
    }

    /// Counter column in `usage_records`
    pub fn column(&self) -> &'static str {
        match self {
            UsageAction::GetSolution => "get_solution_count",
            UsageAction::AddSolution => "add_solution_count",
            UsageAction::Variant => "variant_count",
        }
    }
}

/// Database row representation for a daily usage record
#[derive(Debug, Clone)]
pub struct UsageRecordRow {
    pub user_id: String,
    pub date: String,
    pub get_solution_count: i64,
    pub add_solution_count: i64,
    pub variant_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// API representation for a daily usage record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub user_id: String,
    pub date: String,
    pub get_solution_count: i64,
    pub add_solution_count: i64,
    pub variant_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl UsageRecord {
    /// A zeroed record for a day with no stored row
    pub fn empty(user_id: &str, date: &str) -> Self {
        UsageRecord {
            user_id: user_id.to_string(),
            date: date.to_string(),
            get_solution_count: 0,
            add_solution_count: 0,
            variant_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    pub fn count(&self, action: UsageAction) -> i64 {
        match action {
            UsageAction::GetSolution => self.get_solution_count,
            UsageAction::AddSolution => self.add_solution_count,
            UsageAction::Variant => self.variant_count,
        }
    }
}

impl From<UsageRecordRow> for UsageRecord {
    fn from(row: UsageRecordRow) -> Self {
        UsageRecord {
            user_id: row.user_id,
            date: row.date,
            get_solution_count: row.get_solution_count,
            add_solution_count: row.add_solution_count,
            variant_count: row.variant_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Remaining allowance for one action; serializes as a number or `"unlimited"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    Remaining(i64),
    Unlimited,
}

impl Serialize for Allowance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Allowance::Remaining(n) => serializer.serialize_i64(*n),
            Allowance::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

/// Usage of one metered action for the current day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionUsage {
    pub used: i64,
    pub limit: Option<i64>,
    pub left: Allowance,
}

impl ActionUsage {
    /// `limit == None` means the plan is unlimited for this action
    pub fn new(used: i64, limit: Option<i64>) -> Self {
        let left = match limit {
            Some(limit) => Allowance::Remaining((limit - used).max(0)),
            None => Allowance::Unlimited,
        };
        ActionUsage { used, limit, left }
    }
}

/// Current usage snapshot returned by the quota evaluator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub user_id: String,
    pub date: String,
    pub plan: Plan,
    pub unlimited: bool,
    pub get_solution: ActionUsage,
    pub add_solution: ActionUsage,
    pub variant_count: i64,
}

/// Aggregate counters across all users for one day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    pub date: String,
    pub active_users: i64,
    pub get_solution: i64,
    pub add_solution: i64,
    pub variants: i64,
}

/// Scope of a debug usage reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetScope {
    #[serde(rename = "clear-my-usage")]
    AllDays,
    #[serde(rename = "clear-today")]
    Today,
}

/// Input for incrementing a usage counter
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementUsageInput {
    pub action: UsageAction,
}

/// Input for resetting usage
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetUsageInput {
    pub action: ResetScope,
}

/// Response for a usage reset
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetUsageResponse {
    pub action: ResetScope,
    pub deleted_records: usize,
}

/// Response for usage history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageHistoryResponse {
    pub history: Vec<UsageRecord>,
}
