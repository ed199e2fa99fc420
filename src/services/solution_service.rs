//! Solution service: the metered path from a question to its analysis

use std::sync::Arc;

use thiserror::Error;
use validator::Validate;

use crate::services::llm_service::{GeneratorError, SolutionGenerator};
use crate::services::quota_service::{QuotaError, QuotaService};
use crate::services::solution_cache::SolutionCache;
use crate::types::{
    CacheKey, GetSolutionInput, SolutionResponse, SolutionSource, UsageAction, UsageSnapshot,
};

#[derive(Error, Debug)]
pub enum SolutionError {
    #[error(transparent)]
    Quota(#[from] QuotaError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

pub struct SolutionService {
    quota: Arc<QuotaService>,
    cache: Arc<SolutionCache>,
    generator: Arc<dyn SolutionGenerator>,
}

impl SolutionService {
    pub fn new(
        quota: Arc<QuotaService>,
        cache: Arc<SolutionCache>,
        generator: Arc<dyn SolutionGenerator>,
    ) -> Self {
        Self {
            quota,
            cache,
            generator,
        }
    }

    /// Serve a solution for the caller.
    ///
    /// The GetSolution quota is charged before the cache is consulted, so a
    /// cache hit costs the same as a generation and an exhausted caller never
    /// reaches the generator.
    pub async fn get_solution(
        &self,
        user_id: &str,
        input: GetSolutionInput,
    ) -> Result<SolutionResponse, SolutionError> {
        input
            .validate()
            .map_err(|e| SolutionError::Validation(e.to_string()))?;

        let key = CacheKey::new(&input.question_name, &input.language);
        if !key.is_valid() {
            return Err(SolutionError::Validation(
                "questionName and language must not be blank".into(),
            ));
        }

        let usage = self.charge(user_id).await?;

        if let Some(hit) = self.cache.lookup(&key).await {
            return Ok(SolutionResponse {
                source: SolutionSource::Cache,
                tier: Some(hit.tier),
                solution: hit.solution,
                usage,
            });
        }

        let payload = self
            .generator
            .generate(&input.question_name, &input.language)
            .await?;
        let solution = self.cache.store(&key, payload).await;

        tracing::info!("Generated and cached solution {} for {}", solution.id, key);

        Ok(SolutionResponse {
            source: SolutionSource::Generated,
            tier: None,
            solution,
            usage,
        })
    }

    async fn charge(&self, user_id: &str) -> Result<UsageSnapshot, QuotaError> {
        let quota = self.quota.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            quota.increment_usage(&user_id, UsageAction::GetSolution)
        })
        .await
        .map_err(|e| QuotaError::Database(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanLimits;
    use crate::db::repositories::test_support::create_test_pool;
    use crate::services::clock::SystemClock;
    use crate::services::solution_cache::{DurableTier, MemoryTier};
    use crate::types::{Approach, SolutionPayload, TierKind};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SolutionGenerator for CountingGenerator {
        async fn generate(
            &self,
            question_name: &str,
            _language: &str,
        ) -> Result<SolutionPayload, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SolutionPayload {
                summary: question_name.to_string(),
                approaches: vec![Approach {
                    name: "Brute force".to_string(),
                    explanation: "Try every pair".to_string(),
                    time_complexity: "O(n^2)".to_string(),
                    space_complexity: "O(1)".to_string(),
                    code: None,
                }],
                insights: vec![],
                pitfalls: vec![],
            })
        }
    }

    fn create_service() -> (SolutionService, Arc<CountingGenerator>, tempfile::TempDir) {
        let (pool, dir) = create_test_pool();
        let quota = Arc::new(QuotaService::new(
            pool.clone(),
            PlanLimits::default(),
            Arc::new(SystemClock),
        ));
        let cache = Arc::new(SolutionCache::new(vec![
            Arc::new(MemoryTier::new(Duration::from_secs(60), 100)),
            Arc::new(DurableTier::new(pool)),
        ]));
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
        });
        (
            SolutionService::new(quota, cache, generator.clone()),
            generator,
            dir,
        )
    }

    fn input(question: &str) -> GetSolutionInput {
        GetSolutionInput {
            question_name: question.to_string(),
            language: "rust".to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_miss_generates_then_hit_serves_cache() {
        let (service, generator, _dir) = create_service();

        let first = service.get_solution("user-1", input("Two Sum")).await.unwrap();
        assert_eq!(first.source, SolutionSource::Generated);
        assert_eq!(first.usage.get_solution.used, 1);

        let second = service.get_solution("user-1", input(" two  sum")).await.unwrap();
        assert_eq!(second.source, SolutionSource::Cache);
        assert_eq!(second.tier, Some(TierKind::Memory));
        assert_eq!(second.solution.id, first.solution.id);
        assert_eq!(second.usage.get_solution.used, 2);

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_exhausted_quota_skips_generator() {
        let (service, generator, _dir) = create_service();

        for i in 0..5 {
            service
                .get_solution("user-1", input(&format!("Question {}", i)))
                .await
                .unwrap();
        }

        let err = service
            .get_solution("user-1", input("Question 6"))
            .await
            .unwrap_err();
        assert_matches!(err, SolutionError::Quota(QuotaError::QuotaExceeded { .. }));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blank_input_is_rejected_without_charge() {
        let (service, _generator, _dir) = create_service();

        let err = service.get_solution("user-1", input("   ")).await.unwrap_err();
        assert_matches!(err, SolutionError::Validation(_));

        let err = service.get_solution("user-1", input("")).await.unwrap_err();
        assert_matches!(err, SolutionError::Validation(_));

        let usage = service.quota.get_usage("user-1").unwrap();
        assert_eq!(usage.get_solution.used, 0);
    }
}
