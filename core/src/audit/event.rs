use crate::determinism::json_canonical;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One entry of the decision trail. Entries carry no wall-clock time so two
/// runs over the same detections produce byte-identical trails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub seq: u64,
    pub event_type: String,
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    pub details: serde_json::Value,
    pub prev_event_hash: String, // hex 64
    pub event_hash: String,      // hex 64
}

pub const ZERO_HASH_64: &str = "0000000000000000000000000000000000000000000000000000000000000000";

// event_hash = SHA-256 over the canonical JSON of the event with event_hash
// forced to ZERO_HASH_64, so the key set hashed is the same as the one stored.
pub fn compute_event_hash(event: &AuditEvent) -> CoreResult<String> {
    let mut e = event.clone();
    e.event_hash = ZERO_HASH_64.to_string();
    let bytes = json_canonical::to_canonical_bytes(&e)?;
    let mut h = Sha256::new();
    h.update(bytes);
    Ok(hex::encode(h.finalize()))
}

pub fn finalize_event(mut event: AuditEvent) -> CoreResult<AuditEvent> {
    if event.prev_event_hash.len() != 64
        || !event.prev_event_hash.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(CoreError::InvalidInput(
            "prev_event_hash must be 64 hex chars".to_string(),
        ));
    }
    validate_event_taxonomy(&event)?;
    let eh = compute_event_hash(&event)?;
    event.event_hash = eh;
    Ok(event)
}

fn validate_event_taxonomy(event: &AuditEvent) -> CoreResult<()> {
    let allowed = [
        "RUN_STARTED",
        "EVIDENCE_INGESTED",
        "RESOURCE_MERGED",
        "RESOURCE_ACCEPTED",
        "RESOURCE_REJECTED",
        "CLARIFICATION_REQUIRED",
        "CLARIFICATION_ASKED",
        "ANSWER_APPLIED",
        "MODULES_MAPPED",
        "CONTRACT_VIOLATION",
        "RUN_COMPLETED",
    ];
    if !allowed.contains(&event.event_type.as_str()) {
        return Err(CoreError::InvalidInput(format!(
            "unknown event_type {}",
            event.event_type
        )));
    }
    let required = required_detail_keys(&event.event_type);
    for k in required {
        if event.details.get(k).is_none() {
            return Err(CoreError::InvalidInput(format!(
                "event {} missing details.{}",
                event.event_type, k
            )));
        }
    }
    Ok(())
}

fn required_detail_keys(event_type: &str) -> &'static [&'static str] {
    match event_type {
        "RUN_STARTED" => &["detection_count", "config"],
        "EVIDENCE_INGESTED" => &["evidence_id", "resource_type", "source"],
        "RESOURCE_MERGED" => &["evidence_ids", "merged_confidence", "merge_notes"],
        "RESOURCE_ACCEPTED" => &["decision"],
        "RESOURCE_REJECTED" | "CLARIFICATION_REQUIRED" => &["decision", "reason"],
        "CLARIFICATION_ASKED" => &["question_id", "round", "reason"],
        "ANSWER_APPLIED" => &["action", "previous_identity", "decision"],
        "MODULES_MAPPED" => &["assignments", "common_modules", "diagnostics"],
        "CONTRACT_VIOLATION" => &["kind", "message"],
        "RUN_COMPLETED" => &["accepted", "rejected", "needs_clarification"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: &str, details: serde_json::Value) -> AuditEvent {
        AuditEvent {
            seq: 0,
            event_type: event_type.to_string(),
            run_id: "r_0".to_string(),
            identity: None,
            details,
            prev_event_hash: ZERO_HASH_64.to_string(),
            event_hash: String::new(),
        }
    }

    #[test]
    fn unknown_event_types_are_refused() {
        assert!(finalize_event(event("SOMETHING_ELSE", json!({}))).is_err());
    }

    #[test]
    fn required_details_are_enforced() {
        assert!(finalize_event(event("RESOURCE_REJECTED", json!({"decision": "rejected"}))).is_err());
        let ok = finalize_event(event(
            "RESOURCE_REJECTED",
            json!({"decision": "rejected", "reason": "invalid provider type"}),
        ))
        .unwrap();
        assert_eq!(ok.event_hash.len(), 64);
    }
}
