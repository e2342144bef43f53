use super::annotations::RequirementAnnotations;
use super::module_key::module_key_for;
use crate::model::{CommonModule, Diagnostic, DiagnosticKind, IdentityKey, MergedResource, ModuleAssignment};
use crate::normalize::canonical_label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_COMMON_MODULE_THRESHOLD: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "module_key", rename_all = "snake_case")]
pub enum ModuleRef {
    Common(String),
    Resource(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleMap {
    pub assignments: Vec<ModuleAssignment>,
    pub common_modules: Vec<CommonModule>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ModuleMap {
    pub fn assignment_for(&self, identity: &IdentityKey) -> Option<&ModuleAssignment> {
        self.assignments.iter().find(|a| &a.identity == identity)
    }

    pub fn common_module(&self, key: &str) -> Option<&CommonModule> {
        self.common_modules.iter().find(|c| c.module_key == key)
    }

    /// Identities of every resource whose own module is `module_key`.
    pub fn resources_for_module(&self, module_key: &str) -> Vec<&IdentityKey> {
        self.assignments
            .iter()
            .filter(|a| a.module_key == module_key)
            .map(|a| &a.identity)
            .collect()
    }

    /// Order in which modules must be generated: shared modules first, since
    /// resource modules link against them, then each distinct resource module.
    pub fn generation_order(&self) -> Vec<ModuleRef> {
        let mut order: Vec<ModuleRef> = self
            .common_modules
            .iter()
            .map(|c| ModuleRef::Common(c.module_key.clone()))
            .collect();
        let resource_keys: BTreeSet<&str> = self
            .assignments
            .iter()
            .map(|a| a.module_key.as_str())
            .collect();
        order.extend(resource_keys.into_iter().map(|k| ModuleRef::Resource(k.to_string())));
        order
    }
}

/// Assigns every accepted resource its own module and promotes capabilities
/// needed by at least `common_module_threshold` resources to shared modules.
#[derive(Debug, Clone)]
pub struct ModuleMapper {
    pub common_module_threshold: usize,
}

impl Default for ModuleMapper {
    fn default() -> Self {
        Self {
            common_module_threshold: DEFAULT_COMMON_MODULE_THRESHOLD,
        }
    }
}

impl ModuleMapper {
    pub fn new(common_module_threshold: usize) -> Self {
        Self {
            common_module_threshold: common_module_threshold.max(1),
        }
    }

    /// Reads the accepted set without modifying it. Resources without a
    /// provider type code break the filter's contract; they are reported as
    /// diagnostics and left out while the rest is mapped.
    pub fn map_modules(
        &self,
        accepted: &[MergedResource],
        annotations: &RequirementAnnotations,
    ) -> ModuleMap {
        let mut diagnostics = Vec::new();
        let mut mapped: Vec<(&MergedResource, String, BTreeSet<String>)> = Vec::new();
        let mut usage: BTreeMap<String, BTreeSet<IdentityKey>> = BTreeMap::new();

        for resource in accepted {
            let code = match resource.provider_type_code() {
                Some(c) if !c.trim().is_empty() => c,
                _ => {
                    tracing::warn!(identity = %resource.identity, "accepted resource has no provider type code");
                    diagnostics.push(Diagnostic {
                        identity: resource.identity.clone(),
                        kind: DiagnosticKind::MissingProviderType,
                        message: format!(
                            "accepted resource {} has no provider type code; module not assigned",
                            resource.identity
                        ),
                    });
                    continue;
                }
            };

            let tags: BTreeSet<String> = resource
                .requirements
                .iter()
                .map(|t| canonical_label(t))
                .chain(annotations.tags_for(&resource.identity).cloned())
                .filter(|t| !t.is_empty())
                .collect();
            for tag in &tags {
                usage
                    .entry(tag.clone())
                    .or_default()
                    .insert(resource.identity.clone());
            }
            mapped.push((resource, module_key_for(code), tags));
        }

        let common_modules: Vec<CommonModule> = usage
            .into_iter()
            .filter(|(_, used_by)| used_by.len() >= self.common_module_threshold)
            .map(|(module_key, used_by)| CommonModule {
                module_key,
                usage_count: used_by.len(),
                used_by,
            })
            .collect();
        let common_keys: BTreeSet<&str> = common_modules
            .iter()
            .map(|c| c.module_key.as_str())
            .collect();

        let mut assignments: Vec<ModuleAssignment> = mapped
            .into_iter()
            .map(|(resource, module_key, tags)| {
                let (shared, embedded): (BTreeSet<String>, BTreeSet<String>) = tags
                    .into_iter()
                    .partition(|t| common_keys.contains(t.as_str()));
                ModuleAssignment {
                    identity: resource.identity.clone(),
                    module_key,
                    embedded_capabilities: embedded,
                    common_modules: shared,
                }
            })
            .collect();
        assignments.sort_by(|a, b| a.identity.cmp(&b.identity));

        tracing::debug!(
            assignments = assignments.len(),
            common_modules = common_modules.len(),
            diagnostics = diagnostics.len(),
            "modules mapped"
        );
        ModuleMap {
            assignments,
            common_modules,
            diagnostics,
        }
    }
}
