use super::outcome::{FilterOutcome, FilteredResource};
use crate::capability::TypeValidator;
use crate::error::CoreResult;
use crate::model::{DecisionReason, FilterDecision, MergedResource};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MINIMUM_CONFIDENCE: f64 = 0.2;

/// Rule-ordered decision tree over merged resources. A resource the user
/// dismissed stays rejected ("dismissed by user"). Otherwise rules run in
/// this order and the first match wins:
///
/// 1. unknown type -> needs clarification ("unresolved type")
/// 2. confidence under threshold -> needs clarification ("low confidence"),
///    or rejected ("below minimum confidence") under the minimum
/// 3. no provider type code -> needs clarification ("missing provider type")
/// 4. validator says no -> rejected ("invalid provider type")
/// 5. accepted
///
/// A validator outage is returned as an error and never turned into a rejection.
pub struct Filter<V: TypeValidator> {
    pub confidence_threshold: f64,
    pub minimum_confidence: f64,
    validator: V,
}

impl<V: TypeValidator> Filter<V> {
    pub fn new(validator: V) -> Self {
        Self::with_thresholds(
            validator,
            DEFAULT_CONFIDENCE_THRESHOLD,
            DEFAULT_MINIMUM_CONFIDENCE,
        )
    }

    pub fn with_thresholds(validator: V, confidence_threshold: f64, minimum_confidence: f64) -> Self {
        Self {
            confidence_threshold,
            minimum_confidence,
            validator,
        }
    }

    pub fn decide(&self, resource: &MergedResource) -> CoreResult<FilterDecision> {
        if resource.dismissed_by_user {
            return Ok(FilterDecision::Rejected(DecisionReason::DismissedByUser));
        }
        if resource.resource_type.is_unknown() {
            return Ok(FilterDecision::NeedsClarification(
                DecisionReason::UnresolvedType,
            ));
        }
        if resource.merged_confidence < self.confidence_threshold && !resource.confirmed_by_user {
            return Ok(if resource.merged_confidence >= self.minimum_confidence {
                FilterDecision::NeedsClarification(DecisionReason::LowConfidence)
            } else {
                FilterDecision::Rejected(DecisionReason::BelowMinimumConfidence)
            });
        }
        let code = match resource.provider_type_code() {
            Some(c) if !c.trim().is_empty() => c,
            _ => {
                return Ok(FilterDecision::NeedsClarification(
                    DecisionReason::MissingProviderType,
                ))
            }
        };
        if !self.validator.validate_provider_type(code)? {
            return Ok(FilterDecision::Rejected(DecisionReason::InvalidProviderType));
        }
        Ok(FilterDecision::Accepted)
    }

    pub fn filter(&self, resources: Vec<MergedResource>) -> CoreResult<FilterOutcome> {
        let mut outcome = FilterOutcome::default();
        for resource in resources {
            let decision = self.decide(&resource)?;
            tracing::debug!(identity = %resource.identity, ?decision, "filter decision");
            outcome.push(FilteredResource { resource, decision });
        }
        tracing::debug!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            needs_clarification = outcome.needs_clarification.len(),
            "filter complete"
        );
        Ok(outcome)
    }
}
