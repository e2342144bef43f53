use super::interface::{TypeResolver, TypeValidator};
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Caller-owned retry policy for capability calls. Only errors classified as
/// retryable are attempted again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 0,
        }
    }
}

pub fn with_retry<T>(policy: &RetryPolicy, mut op: impl FnMut() -> CoreResult<T>) -> CoreResult<T> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(attempt, max_attempts = attempts, error = %e, "capability call failed, retrying");
                if policy.backoff_ms > 0 {
                    std::thread::sleep(Duration::from_millis(policy.backoff_ms * attempt as u64));
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Wraps a resolver or validator so every call goes through `with_retry`.
pub struct Retrying<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> Retrying<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<C: TypeResolver> TypeResolver for Retrying<C> {
    fn canonical_type(&self, label: &str) -> CoreResult<Option<String>> {
        with_retry(&self.policy, || self.inner.canonical_type(label))
    }

    fn resolve_provider_type(&self, resource_type: &str) -> CoreResult<Option<String>> {
        with_retry(&self.policy, || self.inner.resolve_provider_type(resource_type))
    }
}

impl<C: TypeValidator> TypeValidator for Retrying<C> {
    fn validate_provider_type(&self, code: &str) -> CoreResult<bool> {
        with_retry(&self.policy, || self.inner.validate_provider_type(code))
    }
}
