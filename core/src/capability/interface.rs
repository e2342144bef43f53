use crate::error::{CoreError, CoreResult};
use std::sync::Arc;

/// Maps labels to canonical resource types and resource types to provider
/// type codes. Implementations may be backed by a remote lookup.
pub trait TypeResolver: Send + Sync {
    /// Canonical type id for an already canonicalized label; `Ok(None)` when
    /// the label cannot be resolved, `Err` when the resolver could not answer.
    fn canonical_type(&self, label: &str) -> CoreResult<Option<String>>;

    fn resolve_provider_type(&self, resource_type: &str) -> CoreResult<Option<String>>;
}

/// Confirms that a provider type code exists. `Ok(false)` means invalid;
/// `Err` means the validator itself could not answer.
pub trait TypeValidator: Send + Sync {
    fn validate_provider_type(&self, code: &str) -> CoreResult<bool>;
}

impl<T: TypeResolver + ?Sized> TypeResolver for &T {
    fn canonical_type(&self, label: &str) -> CoreResult<Option<String>> {
        (**self).canonical_type(label)
    }

    fn resolve_provider_type(&self, resource_type: &str) -> CoreResult<Option<String>> {
        (**self).resolve_provider_type(resource_type)
    }
}

impl<T: TypeResolver + ?Sized> TypeResolver for Arc<T> {
    fn canonical_type(&self, label: &str) -> CoreResult<Option<String>> {
        (**self).canonical_type(label)
    }

    fn resolve_provider_type(&self, resource_type: &str) -> CoreResult<Option<String>> {
        (**self).resolve_provider_type(resource_type)
    }
}

impl<T: TypeValidator + ?Sized> TypeValidator for &T {
    fn validate_provider_type(&self, code: &str) -> CoreResult<bool> {
        (**self).validate_provider_type(code)
    }
}

impl<T: TypeValidator + ?Sized> TypeValidator for Arc<T> {
    fn validate_provider_type(&self, code: &str) -> CoreResult<bool> {
        (**self).validate_provider_type(code)
    }
}

/// Turns a transport-level failure message from a remote lookup into a
/// `CapabilityUnavailable` error with a stable retryable flag.
pub fn classify_capability_error(capability: &str, err: &str) -> CoreError {
    let lower = err.to_lowercase();
    let retryable = lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("unavailable")
        || lower.contains("connection")
        || lower.contains("rate limit");
    CoreError::capability(capability, err, retryable)
}
