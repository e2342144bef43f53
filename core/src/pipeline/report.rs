use crate::audit::AuditTrail;
use crate::determinism::json_canonical;
use crate::error::CoreResult;
use crate::filter::FilterOutcome;
use crate::model::{Bucket, IdentityKey};
use serde::{Deserialize, Serialize};

/// Where one input evidence record ended up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceFate {
    pub evidence_id: String,
    pub identity: IdentityKey,
    pub bucket: Bucket,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineReport {
    pub run_id: String,
    pub evidence_count: usize,
    pub outcome: FilterOutcome,
    pub audit: AuditTrail,
}

impl PipelineReport {
    /// One entry per evidence record held by any bucket, sorted by evidence id.
    pub fn evidence_fate(&self) -> Vec<EvidenceFate> {
        let mut out: Vec<EvidenceFate> = self
            .outcome
            .iter()
            .flat_map(|item| {
                let bucket = item.decision.bucket();
                item.resource.evidence.iter().map(move |e| EvidenceFate {
                    evidence_id: e.evidence_id.clone(),
                    identity: item.resource.identity.clone(),
                    bucket,
                })
            })
            .collect();
        out.sort_by(|a, b| a.evidence_id.cmp(&b.evidence_id));
        out
    }

    pub fn to_canonical_json(&self) -> CoreResult<String> {
        json_canonical::to_canonical_string(self)
    }
}
