use crate::audit::event::{compute_event_hash, finalize_event, AuditEvent, ZERO_HASH_64};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Hash-chained, append-only record of every pipeline decision for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditTrail {
    run_id: String,
    events: Vec<AuditEvent>,
}

impl AuditTrail {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            events: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn last_hash(&self) -> &str {
        self.events
            .last()
            .map(|e| e.event_hash.as_str())
            .unwrap_or(ZERO_HASH_64)
    }

    pub fn append(
        &mut self,
        event_type: &str,
        identity: Option<String>,
        details: Value,
    ) -> CoreResult<&AuditEvent> {
        let event = finalize_event(AuditEvent {
            seq: self.events.len() as u64,
            event_type: event_type.to_string(),
            run_id: self.run_id.clone(),
            identity,
            details,
            prev_event_hash: self.last_hash().to_string(),
            event_hash: String::new(),
        })?;
        self.events.push(event);
        let idx = self.events.len() - 1;
        Ok(&self.events[idx])
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Recomputes every hash and link of the chain.
    pub fn verify(&self) -> CoreResult<()> {
        let mut prev = ZERO_HASH_64.to_string();
        for (i, e) in self.events.iter().enumerate() {
            if e.seq != i as u64 {
                return Err(CoreError::DeterminismViolation(format!(
                    "audit event {} has seq {}",
                    i, e.seq
                )));
            }
            if e.prev_event_hash != prev {
                return Err(CoreError::DeterminismViolation(format!(
                    "audit chain broken at seq {}",
                    e.seq
                )));
            }
            if compute_event_hash(e)? != e.event_hash {
                return Err(CoreError::DeterminismViolation(format!(
                    "audit event hash mismatch at seq {}",
                    e.seq
                )));
            }
            prev = e.event_hash.clone();
        }
        Ok(())
    }

    pub fn to_ndjson(&self) -> CoreResult<String> {
        let mut out = String::new();
        for e in &self.events {
            out.push_str(&serde_json::to_string(e)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn write_ndjson(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = File::create(path)?;
        f.write_all(self.to_ndjson()?.as_bytes())?;
        Ok(())
    }
}
