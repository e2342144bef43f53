use super::label::canonical_label;
use crate::capability::TypeResolver;
use crate::determinism::fingerprint::short_hash;
use crate::error::{CoreError, CoreResult};
use crate::model::{DetectorOutput, EvidenceRecord, ResourceType};

/// Upper bound on alias hops followed by `normalize` before giving up.
pub const MAX_ALIAS_HOPS: usize = 8;

/// Turns free-text labels into canonical resource types using an injected
/// resolver. Anything the resolver does not know becomes `unknown`.
pub struct Normalizer<R: TypeResolver> {
    resolver: R,
}

impl<R: TypeResolver> Normalizer<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// `normalize(normalize(x).id) == normalize(x)` holds for every label:
    /// results are either resolver fixpoints, the smallest member of an alias
    /// cycle, or `unknown`.
    ///
    /// A resolver outage is returned as an error, never turned into `unknown`.
    pub fn try_normalize(&self, raw_label: &str) -> CoreResult<ResourceType> {
        let slug = canonical_label(raw_label);
        if slug.is_empty() || slug == ResourceType::UNKNOWN_ID {
            return Ok(ResourceType::unknown());
        }

        let mut visited: Vec<String> = Vec::new();
        let mut current = slug;
        for _ in 0..MAX_ALIAS_HOPS {
            let next = match self.resolver.canonical_type(&current)? {
                Some(n) => canonical_label(&n),
                None => return Ok(ResourceType::unknown()),
            };
            if next.is_empty() || next == ResourceType::UNKNOWN_ID {
                return Ok(ResourceType::unknown());
            }
            if next == current {
                return Ok(ResourceType::new(current));
            }
            if let Some(start) = visited.iter().position(|v| v == &next) {
                let mut cycle: Vec<&String> = visited[start..].iter().collect();
                cycle.push(&current);
                let smallest = cycle.into_iter().min().cloned().unwrap_or(next);
                tracing::warn!(label = raw_label, resolved = %smallest, "alias cycle in type resolver");
                return Ok(ResourceType::new(smallest));
            }
            visited.push(current);
            current = next;
        }
        tracing::warn!(label = raw_label, "alias chain did not converge");
        Ok(ResourceType::unknown())
    }

    /// Like `try_normalize`, but a resolver that cannot answer yields
    /// `unknown`. Only for callers that have no way to report the outage.
    pub fn normalize(&self, raw_label: &str) -> ResourceType {
        self.try_normalize(raw_label).unwrap_or_else(|e| {
            tracing::warn!(label = raw_label, error = %e, "type resolver unavailable");
            ResourceType::unknown()
        })
    }

    /// Builds evidence records from raw detector outputs, resolving missing
    /// provider type codes through the resolver.
    pub fn ingest(&self, outputs: &[DetectorOutput]) -> CoreResult<Vec<EvidenceRecord>> {
        let mut records = Vec::with_capacity(outputs.len());
        for (ordinal, out) in outputs.iter().enumerate() {
            if !out.position.is_finite() {
                return Err(CoreError::InvalidInput(format!(
                    "detection {} ({:?}) has a non-finite position",
                    ordinal, out.raw_resource_label
                )));
            }
            let confidence = clamp_confidence(out.confidence);
            if confidence != out.confidence {
                tracing::warn!(
                    ordinal,
                    label = %out.raw_resource_label,
                    raw = out.confidence,
                    clamped = confidence,
                    "confidence outside [0,1] clamped"
                );
            }

            let mut resource_type = self.try_normalize(&out.raw_resource_label)?;
            let supplied = out.provider_type_code.trim();
            let code = if !supplied.is_empty() {
                Some(supplied.to_string())
            } else if !resource_type.is_unknown() {
                self.resolver.resolve_provider_type(&resource_type.id)?
            } else {
                None
            };
            resource_type = resource_type.with_provider_type(code);

            let category = out
                .category
                .as_deref()
                .map(canonical_label)
                .filter(|c| !c.is_empty());

            let digest_input = format!(
                "{}|{}|{}|{}|{}|{}|{}",
                out.source.as_str(),
                out.raw_resource_label,
                out.provider_type_code,
                out.position.x,
                out.position.y,
                confidence,
                out.raw_evidence
            );
            let evidence_id = format!("EV_{:04}_{}", ordinal, short_hash(digest_input.as_bytes(), 8));

            records.push(EvidenceRecord {
                evidence_id,
                position: out.position,
                raw_label: out.raw_resource_label.clone(),
                resource_type,
                confidence,
                source: out.source,
                raw_evidence: out.raw_evidence.clone(),
                category,
            });
        }
        tracing::debug!(count = records.len(), "evidence ingested");
        Ok(records)
    }
}

fn clamp_confidence(c: f64) -> f64 {
    if c.is_finite() {
        c.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
