use crate::model::{Bucket, FilterDecision, IdentityKey, MergedResource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilteredResource {
    pub resource: MergedResource,
    pub decision: FilterDecision,
}

/// Partition of the merged set. Every merged resource sits in exactly one
/// bucket; nothing is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterOutcome {
    pub accepted: Vec<FilteredResource>,
    pub rejected: Vec<FilteredResource>,
    pub needs_clarification: Vec<FilteredResource>,
}

impl FilterOutcome {
    pub fn push(&mut self, item: FilteredResource) {
        match item.decision.bucket() {
            Bucket::Accepted => self.accepted.push(item),
            Bucket::Rejected => self.rejected.push(item),
            Bucket::NeedsClarification => self.needs_clarification.push(item),
        }
    }

    pub fn accepted_resources(&self) -> Vec<MergedResource> {
        self.accepted.iter().map(|f| f.resource.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.accepted.len() + self.rejected.len() + self.needs_clarification.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilteredResource> + '_ {
        self.accepted
            .iter()
            .chain(self.rejected.iter())
            .chain(self.needs_clarification.iter())
    }

    pub fn find(&self, identity: &IdentityKey) -> Option<&FilteredResource> {
        self.iter().find(|f| &f.resource.identity == identity)
    }

    pub fn bucket_of(&self, identity: &IdentityKey) -> Option<Bucket> {
        self.find(identity).map(|f| f.decision.bucket())
    }

    /// Removes and returns the resource with this identity from whichever
    /// bucket holds it.
    pub fn take(&mut self, identity: &IdentityKey) -> Option<FilteredResource> {
        for bucket in [
            &mut self.accepted,
            &mut self.rejected,
            &mut self.needs_clarification,
        ] {
            if let Some(i) = bucket.iter().position(|f| &f.resource.identity == identity) {
                return Some(bucket.remove(i));
            }
        }
        None
    }

    /// Restores identity order inside every bucket.
    pub fn sort(&mut self) {
        for bucket in [
            &mut self.accepted,
            &mut self.rejected,
            &mut self.needs_clarification,
        ] {
            bucket.sort_by(|a, b| a.resource.identity.cmp(&b.resource.identity));
        }
    }
}
