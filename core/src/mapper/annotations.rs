use crate::error::CoreResult;
use crate::model::{IdentityKey, MergedResource};
use crate::normalize::canonical_label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Shared-capability tags per resource identity, produced by an external
/// analysis stage. Serialized as a JSON object keyed by rendered identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RequirementAnnotations {
    tags: BTreeMap<IdentityKey, BTreeSet<String>>,
}

impl RequirementAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: IdentityKey, tag: &str) {
        let tag = canonical_label(tag);
        if tag.is_empty() {
            return;
        }
        self.tags.entry(identity).or_default().insert(tag);
    }

    pub fn with(mut self, identity: IdentityKey, tags: &[&str]) -> Self {
        for t in tags {
            self.insert(identity.clone(), t);
        }
        self
    }

    pub fn tags_for(&self, identity: &IdentityKey) -> impl Iterator<Item = &String> + '_ {
        self.tags.get(identity).into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn from_json_str(s: &str) -> CoreResult<Self> {
        let raw: Self = serde_json::from_str(s)?;
        Ok(raw.canonicalized())
    }

    /// Re-inserts every tag so values deserialized elsewhere are canonical too.
    pub fn canonicalized(self) -> Self {
        let mut out = Self::new();
        for (identity, tags) in self.tags {
            for t in tags {
                out.insert(identity.clone(), &t);
            }
        }
        out
    }
}

/// Returns copies of `resources` with their annotation tags merged into
/// `requirements`. The inputs are left untouched.
pub fn attach_requirements(
    resources: &[MergedResource],
    annotations: &RequirementAnnotations,
) -> Vec<MergedResource> {
    resources
        .iter()
        .map(|r| {
            let mut out = r.clone();
            out.requirements
                .extend(annotations.tags_for(&r.identity).cloned());
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_json_keyed_by_identity() {
        let a = RequirementAnnotations::from_json_str(
            r#"{"vm|p/vm": ["Requires Private Endpoint", "requires-diagnostic-logging"]}"#,
        )
        .unwrap();
        let tags: Vec<_> = a.tags_for(&IdentityKey::coded("vm", "p/vm")).collect();
        assert_eq!(tags, vec!["requires-diagnostic-logging", "requires-private-endpoint"]);
    }

    #[test]
    fn bad_identity_keys_fail_to_load() {
        assert!(RequirementAnnotations::from_json_str(r#"{"novm": ["x"]}"#).is_err());
    }
}
