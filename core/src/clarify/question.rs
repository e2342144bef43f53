use crate::model::{DecisionReason, IdentityKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub question_id: String,
    pub identity: IdentityKey,
    pub reason: DecisionReason,
    pub prompt: String,
    pub candidate_types: Vec<String>,
    pub round: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AnswerAction {
    /// Overrides the resource type and/or the provider type code.
    Reclassify {
        #[serde(default)]
        resource_type: Option<String>,
        #[serde(default)]
        provider_type_code: Option<String>,
    },
    /// The user vouches for the detection as it stands.
    Confirm,
    /// The detection is a false positive.
    Dismiss {
        #[serde(default)]
        note: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub identity: IdentityKey,
    #[serde(flatten)]
    pub action: AnswerAction,
}

impl Answer {
    pub fn reclassify(identity: IdentityKey, resource_type: Option<&str>, provider_type_code: Option<&str>) -> Self {
        Self {
            identity,
            action: AnswerAction::Reclassify {
                resource_type: resource_type.map(str::to_string),
                provider_type_code: provider_type_code.map(str::to_string),
            },
        }
    }

    pub fn confirm(identity: IdentityKey) -> Self {
        Self {
            identity,
            action: AnswerAction::Confirm,
        }
    }

    pub fn dismiss(identity: IdentityKey, note: Option<&str>) -> Self {
        Self {
            identity,
            action: AnswerAction::Dismiss {
                note: note.map(str::to_string),
            },
        }
    }
}
