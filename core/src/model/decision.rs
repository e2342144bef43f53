use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    UnresolvedType,
    LowConfidence,
    BelowMinimumConfidence,
    MissingProviderType,
    InvalidProviderType,
    DismissedByUser,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::UnresolvedType => "unresolved type",
            DecisionReason::LowConfidence => "low confidence",
            DecisionReason::BelowMinimumConfidence => "below minimum confidence",
            DecisionReason::MissingProviderType => "missing provider type",
            DecisionReason::InvalidProviderType => "invalid provider type",
            DecisionReason::DismissedByUser => "dismissed by user",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output bucket of the filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Accepted,
    Rejected,
    NeedsClarification,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Accepted => "accepted",
            Bucket::Rejected => "rejected",
            Bucket::NeedsClarification => "needs_clarification",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum FilterDecision {
    Accepted,
    Rejected(DecisionReason),
    NeedsClarification(DecisionReason),
}

impl FilterDecision {
    pub fn bucket(&self) -> Bucket {
        match self {
            FilterDecision::Accepted => Bucket::Accepted,
            FilterDecision::Rejected(_) => Bucket::Rejected,
            FilterDecision::NeedsClarification(_) => Bucket::NeedsClarification,
        }
    }

    pub fn reason(&self) -> Option<DecisionReason> {
        match self {
            FilterDecision::Accepted => None,
            FilterDecision::Rejected(r) | FilterDecision::NeedsClarification(r) => Some(*r),
        }
    }
}
