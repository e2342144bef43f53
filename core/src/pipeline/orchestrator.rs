use super::report::PipelineReport;
use crate::audit::AuditTrail;
use crate::capability::{TypeResolver, TypeValidator};
use crate::clarify::{Answer, AnswerAction, ClarificationSession, Question};
use crate::config::PipelineConfig;
use crate::determinism::fingerprint::run_id_for_detections;
use crate::error::{CoreError, CoreResult};
use crate::filter::{Filter, FilteredResource};
use crate::mapper::{ModuleMap, ModuleMapper, RequirementAnnotations};
use crate::merge::Merger;
use crate::model::{DetectorOutput, FilterDecision, IdentityKey};
use crate::normalize::Normalizer;
use serde_json::json;

/// Wires the stages together for one configuration and one pair of
/// capabilities. Every stage decision lands in the report's audit trail.
pub struct Pipeline<R: TypeResolver, V: TypeValidator> {
    config: PipelineConfig,
    normalizer: Normalizer<R>,
    merger: Merger,
    filter: Filter<V>,
    mapper: ModuleMapper,
}

impl<R: TypeResolver, V: TypeValidator> Pipeline<R, V> {
    pub fn new(config: PipelineConfig, resolver: R, validator: V) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(resolver),
            merger: Merger::new(config.proximity_threshold, config.confidence_strategy),
            filter: Filter::with_thresholds(
                validator,
                config.confidence_threshold,
                config.minimum_confidence,
            ),
            mapper: ModuleMapper::new(config.common_module_threshold),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer<R> {
        &self.normalizer
    }

    pub fn filter(&self) -> &Filter<V> {
        &self.filter
    }

    /// Ingest, merge and filter one set of detector outputs.
    pub fn run(&self, outputs: &[DetectorOutput]) -> CoreResult<PipelineReport> {
        let run_id = run_id_for_detections(outputs)?;
        let mut audit = AuditTrail::new(&run_id);
        audit.append(
            "RUN_STARTED",
            None,
            json!({
                "detection_count": outputs.len(),
                "config": serde_json::to_value(&self.config)?,
            }),
        )?;

        let records = self.normalizer.ingest(outputs)?;
        for r in &records {
            audit.append(
                "EVIDENCE_INGESTED",
                None,
                json!({
                    "evidence_id": r.evidence_id,
                    "resource_type": r.resource_type.id,
                    "provider_type_code": r.provider_type_code(),
                    "source": r.source.as_str(),
                }),
            )?;
        }
        tracing::debug!(records = records.len(), "evidence ingested");

        let merged = self.merger.merge(records);
        for m in &merged {
            audit.append(
                "RESOURCE_MERGED",
                Some(m.identity.to_string()),
                json!({
                    "evidence_ids": m.evidence_ids().collect::<Vec<_>>(),
                    "merged_confidence": m.merged_confidence,
                    "merge_notes": m.merge_notes,
                }),
            )?;
        }

        let outcome = self.filter.filter(merged)?;
        let mut decided: Vec<&FilteredResource> = outcome.iter().collect();
        decided.sort_by(|a, b| a.resource.identity.cmp(&b.resource.identity));
        for item in decided {
            record_decision(&mut audit, &item.resource.identity, item.decision)?;
        }

        audit.append(
            "RUN_COMPLETED",
            None,
            json!({
                "accepted": outcome.accepted.len(),
                "rejected": outcome.rejected.len(),
                "needs_clarification": outcome.needs_clarification.len(),
            }),
        )?;
        tracing::info!(
            run_id = %run_id,
            detections = outputs.len(),
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            needs_clarification = outcome.needs_clarification.len(),
            "run complete"
        );

        Ok(PipelineReport {
            run_id,
            evidence_count: outputs.len(),
            outcome,
            audit,
        })
    }

    /// Maps the accepted bucket to modules. Contract violations become
    /// diagnostics and audit events; the report's buckets are not touched.
    pub fn map_modules(
        &self,
        report: &mut PipelineReport,
        annotations: &RequirementAnnotations,
    ) -> CoreResult<ModuleMap> {
        let accepted = report.outcome.accepted_resources();
        let map = self.mapper.map_modules(&accepted, annotations);

        for d in &map.diagnostics {
            report.audit.append(
                "CONTRACT_VIOLATION",
                Some(d.identity.to_string()),
                json!({
                    "kind": serde_json::to_value(d.kind)?,
                    "message": d.message,
                }),
            )?;
        }
        let common: Vec<&str> = map
            .common_modules
            .iter()
            .map(|c| c.module_key.as_str())
            .collect();
        report.audit.append(
            "MODULES_MAPPED",
            None,
            json!({
                "assignments": map.assignments.len(),
                "common_modules": common,
                "diagnostics": map.diagnostics.len(),
            }),
        )?;
        Ok(map)
    }

    /// Opens a question for a resource currently in the rejected or
    /// needs-clarification bucket.
    pub fn ask(
        &self,
        report: &mut PipelineReport,
        session: &mut ClarificationSession,
        identity: &IdentityKey,
    ) -> CoreResult<Question> {
        let item = report.outcome.find(identity).ok_or_else(|| {
            CoreError::InvalidInput(format!("no resource {} in this run", identity))
        })?;
        let question = session.ask(item)?;
        report.audit.append(
            "CLARIFICATION_ASKED",
            Some(identity.to_string()),
            json!({
                "question_id": question.question_id,
                "round": question.round,
                "reason": question.reason.as_str(),
            }),
        )?;
        Ok(question)
    }

    /// Applies `answer` and puts the resource back into the partition under
    /// its new decision. When the answer gives the resource the identity of
    /// another resource the two are folded together, so identities stay
    /// unique and no evidence is lost.
    ///
    /// If the validator is down the report is left as it was; the question is
    /// closed and has to be asked again.
    pub fn apply_answer(
        &self,
        report: &mut PipelineReport,
        session: &mut ClarificationSession,
        answer: &Answer,
    ) -> CoreResult<FilterDecision> {
        let previous = answer.identity.clone();
        if session.open_question(&previous).is_none() {
            return Err(CoreError::ClarificationMissing(previous.to_string()));
        }
        let current = report
            .outcome
            .find(&previous)
            .ok_or_else(|| CoreError::InvalidInput(format!("no resource {} in this run", previous)))?
            .resource
            .clone();

        let mut updated = session.apply_answer(&current, answer, &self.normalizer)?;
        let mut absorbed = false;
        if updated.identity != previous {
            if let Some(existing) = report.outcome.find(&updated.identity) {
                updated = self.merger.absorb(existing.resource.clone(), updated)?;
                absorbed = true;
            }
        }
        let decision = session.resolve(&updated, answer, &self.filter)?;

        report.outcome.take(&previous);
        if absorbed {
            report.outcome.take(&updated.identity);
        }
        let identity = updated.identity.clone();
        report.outcome.push(FilteredResource {
            resource: updated,
            decision,
        });
        report.outcome.sort();

        report.audit.append(
            "ANSWER_APPLIED",
            Some(identity.to_string()),
            json!({
                "action": action_name(&answer.action),
                "previous_identity": previous.to_string(),
                "decision": decision.bucket().as_str(),
                "reason": decision.reason().map(|r| r.as_str()),
                "absorbed": absorbed,
            }),
        )?;
        tracing::debug!(
            identity = %identity,
            previous = %previous,
            bucket = decision.bucket().as_str(),
            absorbed,
            "answer applied"
        );
        Ok(decision)
    }
}

fn record_decision(
    audit: &mut AuditTrail,
    identity: &IdentityKey,
    decision: FilterDecision,
) -> CoreResult<()> {
    let details = json!({
        "decision": decision.bucket().as_str(),
        "reason": decision.reason().map(|r| r.as_str()),
    });
    let event_type = match decision {
        FilterDecision::Accepted => "RESOURCE_ACCEPTED",
        FilterDecision::Rejected(_) => "RESOURCE_REJECTED",
        FilterDecision::NeedsClarification(_) => "CLARIFICATION_REQUIRED",
    };
    audit.append(event_type, Some(identity.to_string()), details)?;
    Ok(())
}

fn action_name(action: &AnswerAction) -> &'static str {
    match action {
        AnswerAction::Reclassify { .. } => "reclassify",
        AnswerAction::Confirm => "confirm",
        AnswerAction::Dismiss { .. } => "dismiss",
    }
}
