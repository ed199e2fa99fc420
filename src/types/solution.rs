//! Solution and cache entry type definitions

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UsageSnapshot;

/// One way of solving a problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approach {
    pub name: String,
    pub explanation: String,
    pub time_complexity: String,
    pub space_complexity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Structured analysis produced by the generator and stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionPayload {
    #[serde(default)]
    pub summary: String,
    pub approaches: Vec<Approach>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub pitfalls: Vec<String>,
}

/// Case- and whitespace-insensitive identity of a question in a language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    question: String,
    language: String,
    key: String,
}

impl CacheKey {
    pub fn new(question_name: &str, language: &str) -> Self {
        let question = normalize(question_name);
        let language = normalize(language);
        let key = format!("{}::{}", question, language);
        Self {
            question,
            language,
            key,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_valid(&self) -> bool {
        !self.question.is_empty() && !self.language.is_empty()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

/// Trim, lowercase and collapse runs of whitespace to a single space
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Database row representation for a durable cache entry
#[derive(Debug, Clone)]
pub struct CachedSolutionRow {
    pub id: String,
    pub cache_key: String,
    pub question_name: String,
    pub language: String,
    pub payload: String, // JSON
    pub hit_count: i64,
    pub created_at: String,
}

/// A cached solution as held by every tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSolution {
    pub id: String,
    pub key: String,
    pub question_name: String,
    pub language: String,
    pub payload: SolutionPayload,
    pub hit_count: i64,
    pub created_at: String,
}

impl CachedSolution {
    pub fn new(key: &CacheKey, payload: SolutionPayload) -> Self {
        CachedSolution {
            id: format!(
                "sol_{}{}",
                chrono::Utc::now().timestamp_millis(),
                &uuid::Uuid::new_v4().to_string()[..8]
            ),
            key: key.as_str().to_string(),
            question_name: key.question().to_string(),
            language: key.language().to_string(),
            payload,
            hit_count: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl TryFrom<CachedSolutionRow> for CachedSolution {
    type Error = serde_json::Error;

    fn try_from(row: CachedSolutionRow) -> Result<Self, Self::Error> {
        Ok(CachedSolution {
            id: row.id,
            key: row.cache_key,
            question_name: row.question_name,
            language: row.language,
            payload: serde_json::from_str(&row.payload)?,
            hit_count: row.hit_count,
            created_at: row.created_at,
        })
    }
}

/// Input for requesting a solution analysis
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetSolutionInput {
    #[validate(length(min = 1, max = 200, message = "questionName must be 1-200 characters"))]
    pub question_name: String,
    #[validate(length(min = 1, max = 40, message = "language must be 1-40 characters"))]
    pub language: String,
}

/// Where a returned solution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionSource {
    Cache,
    Generated,
}

/// Response for a solution request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionResponse {
    pub source: SolutionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<super::TierKind>,
    pub solution: CachedSolution,
    pub usage: UsageSnapshot,
}
