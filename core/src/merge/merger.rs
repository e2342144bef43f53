use super::strategy::ConfidenceStrategy;
use crate::error::{CoreError, CoreResult};
use crate::model::identity::code_key;
use crate::model::{AnchorPoint, EvidenceRecord, IdentityKey, MergedResource, Position, ResourceType};
use std::collections::{BTreeMap, BTreeSet};

/// Folds evidence from independent detectors into one resource per identity.
#[derive(Debug, Clone)]
pub struct Merger {
    pub proximity_threshold: f64,
    pub strategy: ConfidenceStrategy,
}

struct Cluster {
    anchor: Position,
    anchor_key: AnchorPoint,
    records: Vec<EvidenceRecord>,
}

impl Merger {
    pub fn new(proximity_threshold: f64, strategy: ConfidenceStrategy) -> Self {
        Self {
            proximity_threshold,
            strategy,
        }
    }

    /// Pure transform; output is sorted by identity key and does not depend on
    /// the order in which detector outputs arrived.
    pub fn merge(&self, mut records: Vec<EvidenceRecord>) -> Vec<MergedResource> {
        if records.is_empty() {
            return Vec::new();
        }
        records.sort_by(|a, b| a.canonical_cmp(b));

        let mut coded: BTreeMap<IdentityKey, Vec<EvidenceRecord>> = BTreeMap::new();
        let mut uncoded: BTreeMap<String, Vec<Cluster>> = BTreeMap::new();

        for record in records {
            match record.provider_type_code() {
                Some(code) => {
                    let key = IdentityKey::coded(&record.resource_type.id, code);
                    coded.entry(key).or_default().push(record);
                }
                None => {
                    let clusters = uncoded.entry(record.resource_type.id.clone()).or_default();
                    let key = AnchorPoint::from_position(&record.position);
                    let slot = clusters.iter().position(|c| {
                        c.anchor_key == key
                            || c.anchor.within(&record.position, self.proximity_threshold)
                    });
                    match slot {
                        Some(i) => clusters[i].records.push(record),
                        None => clusters.push(Cluster {
                            anchor: record.position,
                            anchor_key: key,
                            records: vec![record],
                        }),
                    }
                }
            }
        }

        let mut merged = Vec::with_capacity(coded.len() + uncoded.len());
        for (identity, group) in coded {
            merged.push(self.build(identity, None, group));
        }
        for (resource_type, clusters) in uncoded {
            for cluster in clusters {
                let identity = IdentityKey::anchored(&resource_type, &cluster.anchor);
                merged.push(self.build(identity, None, cluster.records));
            }
        }
        merged.sort_by(|a, b| a.identity.cmp(&b.identity));

        tracing::debug!(resources = merged.len(), "evidence merged");
        merged
    }

    /// Folds `incoming` into `existing`; both must carry the same identity.
    /// The existing resource's type, requirements and notes are kept.
    pub fn absorb(
        &self,
        existing: MergedResource,
        incoming: MergedResource,
    ) -> CoreResult<MergedResource> {
        if existing.identity != incoming.identity {
            return Err(CoreError::ContractViolation(format!(
                "cannot absorb {} into {}",
                incoming.identity, existing.identity
            )));
        }
        let mut evidence = existing.evidence;
        evidence.extend(incoming.evidence);
        let mut out = self.build(
            existing.identity,
            Some(existing.resource_type),
            evidence,
        );
        out.category = existing.category.or(incoming.category).or(out.category);
        out.requirements = existing
            .requirements
            .into_iter()
            .chain(incoming.requirements)
            .collect();
        let mut notes = existing.merge_notes;
        for n in incoming.merge_notes.into_iter().chain(out.merge_notes) {
            if !notes.contains(&n) {
                notes.push(n);
            }
        }
        out.merge_notes = notes;
        out.confirmed_by_user = existing.confirmed_by_user || incoming.confirmed_by_user;
        out.dismissed_by_user = existing.dismissed_by_user || incoming.dismissed_by_user;
        Ok(out)
    }

    fn build(
        &self,
        identity: IdentityKey,
        resource_type: Option<ResourceType>,
        mut evidence: Vec<EvidenceRecord>,
    ) -> MergedResource {
        evidence.sort_by(|a, b| a.canonical_cmp(b));
        let mut notes = Vec::new();

        let confidences: Vec<f64> = evidence.iter().map(|e| e.confidence).collect();
        let merged_confidence = self.strategy.combine(&confidences);

        let positions: Vec<Position> = evidence.iter().map(|e| e.position).collect();
        let first = positions.first().copied().unwrap_or(Position::new(0.0, 0.0));
        let position = if positions
            .iter()
            .all(|p| first.within(p, self.proximity_threshold))
        {
            first
        } else {
            let c = Position::centroid(&positions).unwrap_or(first);
            notes.push(format!(
                "detector positions disagree; using centroid ({:.1}, {:.1})",
                c.x, c.y
            ));
            c
        };

        let spellings: BTreeSet<&str> = evidence
            .iter()
            .filter_map(|e| e.provider_type_code())
            .collect();
        if spellings.len() > 1 {
            notes.push(format!(
                "conflicting provider type codes: {}",
                spellings.iter().copied().collect::<Vec<_>>().join(", ")
            ));
        }

        let categories: BTreeSet<&str> = evidence
            .iter()
            .filter_map(|e| e.category.as_deref())
            .collect();
        if categories.len() > 1 {
            notes.push(format!(
                "conflicting categories: {}",
                categories.iter().copied().collect::<Vec<_>>().join(", ")
            ));
        }
        let category = evidence.iter().find_map(|e| e.category.clone());

        let resource_type = resource_type.unwrap_or_else(|| {
            let code = evidence
                .iter()
                .find_map(|e| e.provider_type_code())
                .map(str::to_string);
            ResourceType::new(identity.resource_type.clone()).with_provider_type(code)
        });
        debug_assert_eq!(
            resource_type
                .provider_type_code
                .as_deref()
                .map(code_key)
                .unwrap_or_default(),
            identity.provider_type_code
        );

        MergedResource {
            identity,
            resource_type,
            position,
            merged_confidence,
            evidence,
            category,
            requirements: BTreeSet::new(),
            merge_notes: notes,
            confirmed_by_user: false,
            dismissed_by_user: false,
        }
    }
}
