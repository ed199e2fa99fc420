//! Mock implementations for testing
//!
//! This module provides mock implementations of the generator and cache tier
//! traits for use in integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use leetnotes_lib::services::solution_cache::MemoryTier;
use leetnotes_lib::services::{CacheTier, GeneratorError, SolutionGenerator, TierError};
use leetnotes_lib::types::{CacheKey, CachedSolution, SolutionPayload, TierKind, TierStats};

use super::fixtures::create_payload;

/// Generator that answers every request with a fixed payload
#[derive(Debug, Default)]
pub struct StubGenerator {
    calls: AtomicUsize,
    should_fail: AtomicBool,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SolutionGenerator for StubGenerator {
    async fn generate(
        &self,
        question_name: &str,
        _language: &str,
    ) -> Result<SolutionPayload, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.should_fail.load(Ordering::SeqCst) {
            return Err(GeneratorError::RequestFailed("upstream down".to_string()));
        }
        Ok(create_payload(question_name))
    }
}

/// Tier whose every operation fails, as an unreachable backend would
#[derive(Debug)]
pub struct FailingTier {
    kind: TierKind,
    pub attempts: AtomicUsize,
}

impl FailingTier {
    pub fn new(kind: TierKind) -> Self {
        Self {
            kind,
            attempts: AtomicUsize::new(0),
        }
    }

    fn fail<T>(&self) -> Result<T, TierError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TierError::Unavailable(self.kind, "connection refused".to_string()))
    }
}

#[async_trait]
impl CacheTier for FailingTier {
    fn kind(&self) -> TierKind {
        self.kind
    }

    async fn lookup(&self, _key: &CacheKey) -> Result<Option<CachedSolution>, TierError> {
        self.fail()
    }

    async fn store(&self, _key: &CacheKey, _solution: &CachedSolution) -> Result<(), TierError> {
        self.fail()
    }

    async fn remove(&self, _key: &CacheKey) -> Result<bool, TierError> {
        self.fail()
    }

    async fn clear(&self) -> Result<u64, TierError> {
        self.fail()
    }

    async fn stats(&self) -> Result<TierStats, TierError> {
        self.fail()
    }
}

/// In-process stand-in for a shared tier that counts recorded hits
pub struct RecordingTier {
    kind: TierKind,
    inner: MemoryTier,
    pub recorded_hits: AtomicUsize,
}

impl RecordingTier {
    pub fn new(kind: TierKind) -> Self {
        Self {
            kind,
            inner: MemoryTier::new(Duration::from_secs(3600), 100),
            recorded_hits: AtomicUsize::new(0),
        }
    }

    pub fn recorded_hits(&self) -> usize {
        self.recorded_hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheTier for RecordingTier {
    fn kind(&self) -> TierKind {
        self.kind
    }

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedSolution>, TierError> {
        self.inner.lookup(key).await
    }

    async fn store(&self, key: &CacheKey, solution: &CachedSolution) -> Result<(), TierError> {
        self.inner.store(key, solution).await
    }

    async fn record_hit(&self, key: &CacheKey) -> Result<(), TierError> {
        self.recorded_hits.fetch_add(1, Ordering::SeqCst);
        self.inner.record_hit(key).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, TierError> {
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<u64, TierError> {
        self.inner.clear().await
    }

    async fn stats(&self) -> Result<TierStats, TierError> {
        self.inner.stats().await
    }
}
