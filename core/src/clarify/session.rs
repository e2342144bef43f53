use super::question::{Answer, AnswerAction, Question};
use crate::capability::{TypeResolver, TypeValidator};
use crate::determinism::fingerprint::short_hash;
use crate::error::{CoreError, CoreResult};
use crate::filter::{Filter, FilteredResource};
use crate::model::{DecisionReason, FilterDecision, IdentityKey, MergedResource};
use crate::normalize::{canonical_label, Normalizer};
use std::collections::BTreeMap;

/// Open questions keyed by resource identity; at most one per resource.
///
/// Questions that are never answered simply stay open. Timeouts belong to
/// whoever drives the session.
#[derive(Debug, Clone, Default)]
pub struct ClarificationSession {
    open: BTreeMap<IdentityKey, Question>,
    rounds: BTreeMap<IdentityKey, u32>,
}

impl ClarificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises a question for a resource the filter did not accept. Rejected
    /// resources may be asked about too; that is the only way back in.
    pub fn ask(&mut self, item: &FilteredResource) -> CoreResult<Question> {
        let resource = &item.resource;
        let reason = match item.decision {
            FilterDecision::Accepted => {
                return Err(CoreError::InvalidInput(format!(
                    "{} is accepted; nothing to clarify",
                    resource.identity
                )))
            }
            FilterDecision::Rejected(r) | FilterDecision::NeedsClarification(r) => r,
        };
        if self.open.contains_key(&resource.identity) {
            return Err(CoreError::ClarificationConflict(format!(
                "a question is already open for {}",
                resource.identity
            )));
        }

        let round = self.rounds.get(&resource.identity).copied().unwrap_or(0) + 1;
        let question_id = format!(
            "Q_{}",
            short_hash(format!("{}#{}", resource.identity, round).as_bytes(), 12)
        );
        let question = Question {
            question_id,
            identity: resource.identity.clone(),
            reason,
            prompt: prompt_for(resource, reason),
            candidate_types: candidate_types(resource),
            round,
        };
        self.rounds.insert(resource.identity.clone(), round);
        self.open.insert(resource.identity.clone(), question.clone());
        tracing::debug!(identity = %resource.identity, round, "clarification asked");
        Ok(question)
    }

    pub fn open_question(&self, identity: &IdentityKey) -> Option<&Question> {
        self.open.get(identity)
    }

    pub fn open_questions(&self) -> impl Iterator<Item = &Question> + '_ {
        self.open.values()
    }

    /// Drops an open question without an answer so a new one may be asked.
    pub fn withdraw(&mut self, identity: &IdentityKey) -> Option<Question> {
        self.open.remove(identity)
    }

    /// Closes the open question for `resource` and returns the updated value.
    /// Only the fields the answer overrides change: type and code for
    /// `Reclassify`, the confirmation flag for `Confirm`, the dismissal flag
    /// for `Dismiss`. Confirm and Reclassify both lift an earlier dismissal.
    pub fn apply_answer<R: TypeResolver>(
        &mut self,
        resource: &MergedResource,
        answer: &Answer,
        normalizer: &Normalizer<R>,
    ) -> CoreResult<MergedResource> {
        if answer.identity != resource.identity {
            return Err(CoreError::InvalidInput(format!(
                "answer for {} applied to {}",
                answer.identity, resource.identity
            )));
        }
        if !self.open.contains_key(&resource.identity) {
            return Err(CoreError::ClarificationMissing(resource.identity.to_string()));
        }

        let updated = match &answer.action {
            AnswerAction::Reclassify {
                resource_type,
                provider_type_code,
            } => {
                let mut out = reclassify(
                    resource,
                    resource_type.as_deref(),
                    provider_type_code.as_deref(),
                    normalizer,
                )?;
                out.dismissed_by_user = false;
                out
            }
            AnswerAction::Confirm => {
                let mut out = resource.clone();
                out.confirmed_by_user = true;
                out.dismissed_by_user = false;
                out
            }
            AnswerAction::Dismiss { .. } => {
                let mut out = resource.clone();
                out.dismissed_by_user = true;
                out
            }
        };
        self.open.remove(&resource.identity);
        Ok(updated)
    }

    /// Decision for a resource after its answer was applied. Dismissals are
    /// rejections that hold until the same identity is confirmed or
    /// reclassified; everything else goes back through the filter rules.
    pub fn resolve<V: TypeValidator>(
        &self,
        updated: &MergedResource,
        answer: &Answer,
        filter: &Filter<V>,
    ) -> CoreResult<FilterDecision> {
        match answer.action {
            AnswerAction::Dismiss { .. } => {
                Ok(FilterDecision::Rejected(DecisionReason::DismissedByUser))
            }
            _ => filter.decide(updated),
        }
    }
}

fn reclassify<R: TypeResolver>(
    resource: &MergedResource,
    resource_type: Option<&str>,
    provider_type_code: Option<&str>,
    normalizer: &Normalizer<R>,
) -> CoreResult<MergedResource> {
    let mut out = resource.clone();
    let type_changed = match resource_type {
        Some(label) => {
            let normalized = normalizer.try_normalize(label)?;
            let changed = normalized.id != resource.resource_type.id;
            out.resource_type.id = normalized.id;
            changed
        }
        None => false,
    };

    let code = match provider_type_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => Some(c.to_string()),
        None if type_changed && !out.resource_type.is_unknown() => normalizer
            .resolver()
            .resolve_provider_type(&out.resource_type.id)?,
        None => resource.resource_type.provider_type_code.clone(),
    };
    out.resource_type = out.resource_type.with_provider_type(code);

    out.identity = match out.resource_type.provider_type_code.as_deref() {
        Some(code) => IdentityKey::coded(&out.resource_type.id, code),
        None => {
            let anchor = resource
                .identity
                .anchor
                .map(|a| a.to_position())
                .unwrap_or(resource.position);
            IdentityKey::anchored(&out.resource_type.id, &anchor)
        }
    };
    Ok(out)
}

fn prompt_for(resource: &MergedResource, reason: DecisionReason) -> String {
    let at = format!("({:.0}, {:.0})", resource.position.x, resource.position.y);
    let labels: Vec<&str> = resource.evidence.iter().map(|e| e.raw_label.as_str()).collect();
    let labels = if labels.is_empty() {
        "no label".to_string()
    } else {
        labels.join(" / ")
    };
    match reason {
        DecisionReason::UnresolvedType => format!(
            "Which service is the element at {} labelled \"{}\"?",
            at, labels
        ),
        DecisionReason::LowConfidence | DecisionReason::BelowMinimumConfidence => format!(
            "Is the {} at {} (confidence {:.2}) really part of the architecture?",
            resource.resource_type.id, at, resource.merged_confidence
        ),
        DecisionReason::MissingProviderType => format!(
            "Which provider resource type should the {} at {} use?",
            resource.resource_type.id, at
        ),
        DecisionReason::InvalidProviderType => format!(
            "Provider type {} for the {} at {} was not recognised. What is the correct type?",
            resource.provider_type_code().unwrap_or("(none)"),
            resource.resource_type.id,
            at
        ),
        DecisionReason::DismissedByUser => format!(
            "The {} at {} was dismissed earlier. Should it be restored?",
            resource.resource_type.id, at
        ),
    }
}

fn candidate_types(resource: &MergedResource) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if !resource.resource_type.is_unknown() {
        out.push(resource.resource_type.id.clone());
    }
    for e in &resource.evidence {
        let label = canonical_label(&e.raw_label);
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CatalogEntry, TypeCatalog};
    use crate::model::{EvidenceRecord, Position, ResourceType, SourceKind};
    use std::collections::BTreeSet;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new(vec![CatalogEntry {
            resource_type: "function-app".to_string(),
            aliases: vec!["azure functions".to_string()],
            provider_type_code: Some("Microsoft.Web/sites/functions".to_string()),
        }])
        .unwrap()
    }

    fn unresolved() -> FilteredResource {
        let position = Position::new(40.0, 80.0);
        FilteredResource {
            resource: MergedResource {
                identity: IdentityKey::anchored("unknown", &position),
                resource_type: ResourceType::unknown(),
                position,
                merged_confidence: 0.8,
                evidence: vec![EvidenceRecord {
                    evidence_id: "EV_0000_aaaa".to_string(),
                    position,
                    raw_label: "Fn Thing".to_string(),
                    resource_type: ResourceType::unknown(),
                    confidence: 0.8,
                    source: SourceKind::Vision,
                    raw_evidence: "lightning icon".to_string(),
                    category: None,
                }],
                category: Some("compute".to_string()),
                requirements: BTreeSet::from(["rbac".to_string()]),
                merge_notes: vec!["note".to_string()],
                confirmed_by_user: false,
                dismissed_by_user: false,
            },
            decision: FilterDecision::NeedsClarification(DecisionReason::UnresolvedType),
        }
    }

    #[test]
    fn only_one_open_question_per_resource() {
        let mut s = ClarificationSession::new();
        let item = unresolved();
        let q = s.ask(&item).unwrap();
        assert_eq!(q.round, 1);
        assert_eq!(q.candidate_types, vec!["fn-thing".to_string()]);
        assert!(matches!(s.ask(&item), Err(CoreError::ClarificationConflict(_))));
        s.withdraw(&item.resource.identity);
        assert_eq!(s.ask(&item).unwrap().round, 2);
    }

    #[test]
    fn reclassify_preserves_other_fields() {
        let mut s = ClarificationSession::new();
        let item = unresolved();
        s.ask(&item).unwrap();
        let n = Normalizer::new(catalog());
        let answer = Answer::reclassify(item.resource.identity.clone(), Some("Azure Functions"), None);
        let updated = s.apply_answer(&item.resource, &answer, &n).unwrap();

        assert_eq!(updated.resource_type.id, "function-app");
        assert_eq!(
            updated.provider_type_code(),
            Some("Microsoft.Web/sites/functions")
        );
        assert_eq!(
            updated.identity,
            IdentityKey::coded("function-app", "Microsoft.Web/sites/functions")
        );
        assert_eq!(updated.position, item.resource.position);
        assert_eq!(updated.merged_confidence, item.resource.merged_confidence);
        assert_eq!(updated.evidence, item.resource.evidence);
        assert_eq!(updated.category, item.resource.category);
        assert_eq!(updated.requirements, item.resource.requirements);
        assert_eq!(updated.merge_notes, item.resource.merge_notes);
        assert!(s.open_question(&item.resource.identity).is_none());
    }

    #[test]
    fn answers_need_an_open_question() {
        let mut s = ClarificationSession::new();
        let item = unresolved();
        let n = Normalizer::new(catalog());
        let answer = Answer::confirm(item.resource.identity.clone());
        assert!(matches!(
            s.apply_answer(&item.resource, &answer, &n),
            Err(CoreError::ClarificationMissing(_))
        ));
    }

    #[test]
    fn accepted_resources_cannot_be_asked_about() {
        let mut s = ClarificationSession::new();
        let mut item = unresolved();
        item.decision = FilterDecision::Accepted;
        assert!(s.ask(&item).is_err());
    }

    #[test]
    fn dismissal_resolves_to_rejection() {
        let mut s = ClarificationSession::new();
        let item = unresolved();
        s.ask(&item).unwrap();
        let n = Normalizer::new(catalog());
        let answer = Answer::dismiss(item.resource.identity.clone(), Some("legend icon"));
        let updated = s.apply_answer(&item.resource, &answer, &n).unwrap();
        assert!(updated.dismissed_by_user);
        assert_eq!(updated.evidence, item.resource.evidence);
        assert_eq!(updated.resource_type, item.resource.resource_type);
        let filter = Filter::new(catalog());
        assert_eq!(
            s.resolve(&updated, &answer, &filter).unwrap(),
            FilterDecision::Rejected(DecisionReason::DismissedByUser)
        );
    }

    #[test]
    fn confirming_lifts_an_earlier_dismissal() {
        let mut s = ClarificationSession::new();
        let mut item = unresolved();
        item.resource.dismissed_by_user = true;
        item.decision = FilterDecision::Rejected(DecisionReason::DismissedByUser);
        s.ask(&item).unwrap();
        let n = Normalizer::new(catalog());
        let answer = Answer::confirm(item.resource.identity.clone());
        let updated = s.apply_answer(&item.resource, &answer, &n).unwrap();
        assert!(!updated.dismissed_by_user);
        assert!(updated.confirmed_by_user);
    }
}
