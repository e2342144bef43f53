use super::identity::IdentityKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-resource module derived from the provider type code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleAssignment {
    pub identity: IdentityKey,
    pub module_key: String,
    /// Capabilities required by this resource alone; generated inside its module.
    pub embedded_capabilities: BTreeSet<String>,
    /// Capabilities promoted to shared modules that this resource links to.
    pub common_modules: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommonModule {
    pub module_key: String,
    pub usage_count: usize,
    pub used_by: BTreeSet<IdentityKey>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    MissingProviderType,
}

/// Input-contract violation found while mapping; the run continues without
/// the offending resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub identity: IdentityKey,
    pub kind: DiagnosticKind,
    pub message: String,
}
