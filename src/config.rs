//! Service configuration
//!
//! Every setting comes from an environment variable and falls back to a
//! default when unset. Parsing goes through a lookup function so tests can
//! supply values without mutating the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::types::{Plan, UsageAction};

const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Directory holding the SQLite database
    pub data_dir: PathBuf,
    /// Redis URL for the distributed cache tier; tier stays disconnected when unset
    pub redis_url: Option<String>,
    /// Bearer token for the admin routes; admin routes reject everything when unset
    pub admin_token: Option<String>,
    /// Enables the debug usage reset endpoint
    pub allow_usage_reset: bool,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub plan_limits: PlanLimits,
}

/// Solution generator configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LLM_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Cache tier configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub memory_ttl: Duration,
    pub memory_max_entries: usize,
    pub distributed_ttl: Duration,
    /// Upper bound on any single Redis round trip
    pub distributed_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_ttl: Duration::from_secs(60 * 60),
            memory_max_entries: 1_000,
            distributed_ttl: Duration::from_secs(24 * 60 * 60),
            distributed_timeout: Duration::from_millis(200),
        }
    }
}

/// Daily limits for one plan; `None` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionLimits {
    pub get_solution: Option<i64>,
    pub add_solution: Option<i64>,
}

impl ActionLimits {
    pub const UNLIMITED: ActionLimits = ActionLimits {
        get_solution: None,
        add_solution: None,
    };

    pub fn is_unlimited(&self) -> bool {
        self.get_solution.is_none() && self.add_solution.is_none()
    }
}

/// Daily limits for the configurable plans; admins are never limited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLimits {
    pub free: ActionLimits,
    pub trial: ActionLimits,
    pub pro: ActionLimits,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free: ActionLimits {
                get_solution: Some(5),
                add_solution: Some(10),
            },
            trial: ActionLimits {
                get_solution: Some(20),
                add_solution: Some(50),
            },
            pro: ActionLimits::UNLIMITED,
        }
    }
}

impl PlanLimits {
    pub fn for_plan(&self, plan: Plan) -> ActionLimits {
        match plan {
            Plan::Free => self.free,
            Plan::Trial => self.trial,
            Plan::Pro => self.pro,
            Plan::Admin => ActionLimits::UNLIMITED,
        }
    }

    /// Limit for one action; unmetered actions are always unlimited
    pub fn limit(&self, plan: Plan, action: UsageAction) -> Option<i64> {
        let limits = self.for_plan(plan);
        match action {
            UsageAction::GetSolution => limits.get_solution,
            UsageAction::AddSolution => limits.add_solution,
            UsageAction::Variant => None,
        }
    }

    fn for_plan_mut(&mut self, plan: Plan) -> Option<&mut ActionLimits> {
        match plan {
            Plan::Free => Some(&mut self.free),
            Plan::Trial => Some(&mut self.trial),
            Plan::Pro => Some(&mut self.pro),
            Plan::Admin => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            data_dir: default_data_dir(),
            redis_url: None,
            admin_token: None,
            allow_usage_reset: false,
            llm: LlmConfig::default(),
            cache: CacheConfig::default(),
            plan_limits: PlanLimits::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Config::default();

        if let Some(addr) = get("LEETNOTES_BIND") {
            config.bind_addr = parse("LEETNOTES_BIND", &addr)?;
        }
        if let Some(dir) = get("LEETNOTES_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.redis_url = get("REDIS_URL");
        config.admin_token = get("ADMIN_TOKEN");
        if let Some(flag) = get("LEETNOTES_ALLOW_USAGE_RESET") {
            config.allow_usage_reset = parse_bool("LEETNOTES_ALLOW_USAGE_RESET", &flag)?;
        }

        if let Some(url) = get("LLM_API_URL") {
            config.llm.api_url = url.trim_end_matches('/').to_string();
        }
        config.llm.api_key = get("LLM_API_KEY");
        if let Some(model) = get("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Some(secs) = get("LLM_TIMEOUT_SECS") {
            config.llm.timeout = Duration::from_secs(parse("LLM_TIMEOUT_SECS", &secs)?);
        }

        if let Some(secs) = get("MEMORY_CACHE_TTL_SECS") {
            config.cache.memory_ttl = Duration::from_secs(parse("MEMORY_CACHE_TTL_SECS", &secs)?);
        }
        if let Some(max) = get("MEMORY_CACHE_MAX_ENTRIES") {
            config.cache.memory_max_entries = parse("MEMORY_CACHE_MAX_ENTRIES", &max)?;
        }
        if let Some(secs) = get("DISTRIBUTED_CACHE_TTL_SECS") {
            config.cache.distributed_ttl =
                Duration::from_secs(parse("DISTRIBUTED_CACHE_TTL_SECS", &secs)?);
        }
        if let Some(ms) = get("DISTRIBUTED_CACHE_TIMEOUT_MS") {
            config.cache.distributed_timeout =
                Duration::from_millis(parse("DISTRIBUTED_CACHE_TIMEOUT_MS", &ms)?);
        }

        for plan in Plan::ALL {
            let prefix = format!("LEETNOTES_{}", plan.as_str().to_uppercase());
            let get_key = format!("{}_GET_SOLUTION_LIMIT", prefix);
            let add_key = format!("{}_ADD_SOLUTION_LIMIT", prefix);

            let Some(limits) = config.plan_limits.for_plan_mut(plan) else {
                for key in [get_key.as_str(), add_key.as_str()] {
                    if get(key).is_some() {
                        tracing::warn!(
                            "Ignoring {}: the {} plan is always unlimited",
                            key,
                            plan.as_str()
                        );
                    }
                }
                continue;
            };

            if let Some(value) = get(&get_key) {
                limits.get_solution = parse_limit(&get_key, &value)?;
            }
            if let Some(value) = get(&add_key) {
                limits.add_solution = parse_limit(&add_key, &value)?;
            }
        }

        Ok(config)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leetnotes")
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Invalid {} value: {}", key, value),
    }
}

/// A negative or `unlimited` value lifts the limit
fn parse_limit(key: &str, value: &str) -> Result<Option<i64>> {
    if value.eq_ignore_ascii_case("unlimited") {
        return Ok(None);
    }
    let limit: i64 = parse(key, value)?;
    Ok((limit >= 0).then_some(limit))
}
