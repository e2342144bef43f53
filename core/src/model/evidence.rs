use super::position::Position;
use super::resource::{ResourceType, SourceKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Raw detection as handed over by a detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectorOutput {
    pub position: Position,
    pub raw_resource_label: String,
    #[serde(default)]
    pub provider_type_code: String,
    pub confidence: f64,
    pub source: SourceKind,
    #[serde(default)]
    pub raw_evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Canonical unit of evidence produced from one detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceRecord {
    pub evidence_id: String,
    pub position: Position,
    pub raw_label: String,
    pub resource_type: ResourceType,
    pub confidence: f64,
    pub source: SourceKind,
    pub raw_evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl EvidenceRecord {
    pub fn provider_type_code(&self) -> Option<&str> {
        self.resource_type.provider_type_code.as_deref()
    }

    /// Evidence order inside a merged resource: source precedence first, then
    /// stronger detections, then content, with the evidence id as last resort.
    pub fn canonical_cmp(&self, other: &EvidenceRecord) -> Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| other.confidence.total_cmp(&self.confidence))
            .then_with(|| self.position.total_cmp(&other.position))
            .then_with(|| self.raw_label.cmp(&other.raw_label))
            .then_with(|| self.raw_evidence.cmp(&other.raw_evidence))
            .then_with(|| self.evidence_id.cmp(&other.evidence_id))
    }
}
