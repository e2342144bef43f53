use super::evidence::EvidenceRecord;
use super::identity::IdentityKey;
use super::position::Position;
use super::resource::ResourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One canonical resource built from every evidence record sharing its identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedResource {
    pub identity: IdentityKey,
    pub resource_type: ResourceType,
    pub position: Position,
    pub merged_confidence: f64,
    pub evidence: Vec<EvidenceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub requirements: BTreeSet<String>,
    #[serde(default)]
    pub merge_notes: Vec<String>,
    #[serde(default)]
    pub confirmed_by_user: bool,
    /// Set by a `Dismiss` answer and kept through later merges until this
    /// identity is confirmed or reclassified.
    #[serde(default)]
    pub dismissed_by_user: bool,
}

impl MergedResource {
    pub fn provider_type_code(&self) -> Option<&str> {
        self.resource_type.provider_type_code.as_deref()
    }

    pub fn evidence_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.evidence.iter().map(|e| e.evidence_id.as_str())
    }

    pub fn max_evidence_confidence(&self) -> f64 {
        self.evidence
            .iter()
            .map(|e| e.confidence)
            .fold(0.0, f64::max)
    }
}
