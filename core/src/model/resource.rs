use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical resource type plus the provider-specific type code, when known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceType {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type_code: Option<String>,
}

impl ResourceType {
    pub const UNKNOWN_ID: &'static str = "unknown";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider_type_code: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN_ID)
    }

    pub fn is_unknown(&self) -> bool {
        self.id == Self::UNKNOWN_ID
    }

    pub fn with_provider_type(mut self, code: Option<String>) -> Self {
        self.provider_type_code = code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self
    }

    pub fn has_provider_type(&self) -> bool {
        self.provider_type_code.is_some()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider_type_code {
            Some(code) => write!(f, "{} ({})", self.id, code),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Detector modality. Declaration order is the evidence precedence order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Vision,
    Text,
    Narrative,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Vision => "vision",
            SourceKind::Text => "text",
            SourceKind::Narrative => "narrative",
        }
    }
}
