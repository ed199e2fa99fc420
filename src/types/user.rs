//! User and plan type definitions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Subscription plan controlling quota limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Trial,
    Pro,
    Admin,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Free, Plan::Trial, Plan::Pro, Plan::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Trial => "trial",
            Plan::Pro => "pro",
            Plan::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trial" => Plan::Trial,
            "pro" => Plan::Pro,
            "admin" => Plan::Admin,
            _ => Plan::Free,
        }
    }
}

/// Database row representation for user
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub plan: String,
    pub created_at: String,
    pub updated_at: String,
}

/// API representation for user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub plan: Plan,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            plan: Plan::from_str(&row.plan),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for changing a user's plan
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPlanInput {
    pub plan: Plan,
}

/// User counts for the admin stats endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: i64,
    pub by_plan: BTreeMap<Plan, i64>,
}
