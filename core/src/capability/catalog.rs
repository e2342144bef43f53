use super::interface::{TypeResolver, TypeValidator};
use crate::error::{CoreError, CoreResult};
use crate::model::identity::code_key;
use crate::normalize::label::canonical_label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub resource_type: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
    #[serde(default)]
    pub extra_valid_provider_types: Vec<String>,
    #[serde(default)]
    pub open_world: bool,
}

/// In-memory resolver and validator built from injected entries.
///
/// With `open_world` set, labels missing from the catalog resolve to
/// themselves instead of `unknown`.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    canonical: BTreeMap<String, Option<String>>,
    aliases: BTreeMap<String, String>,
    valid_codes: BTreeSet<String>,
    open_world: bool,
}

impl TypeCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> CoreResult<Self> {
        Self::from_file(CatalogFile {
            entries,
            ..CatalogFile::default()
        })
    }

    pub fn open_world() -> Self {
        Self {
            open_world: true,
            ..Self::default()
        }
    }

    pub fn from_file(file: CatalogFile) -> CoreResult<Self> {
        let mut catalog = Self {
            open_world: file.open_world,
            ..Self::default()
        };
        for entry in file.entries {
            let id = canonical_label(&entry.resource_type);
            if id.is_empty() {
                return Err(CoreError::InvalidInput(format!(
                    "catalog entry has an empty resource type: {:?}",
                    entry.resource_type
                )));
            }
            if catalog.canonical.contains_key(&id) {
                return Err(CoreError::InvalidInput(format!(
                    "catalog lists resource type {} twice",
                    id
                )));
            }
            let code = entry
                .provider_type_code
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            if let Some(c) = &code {
                catalog.valid_codes.insert(code_key(c));
            }
            for alias in entry.aliases {
                let alias = canonical_label(&alias);
                if alias.is_empty() || alias == id {
                    continue;
                }
                if let Some(existing) = catalog.aliases.get(&alias) {
                    if existing != &id {
                        return Err(CoreError::InvalidInput(format!(
                            "alias {} maps to both {} and {}",
                            alias, existing, id
                        )));
                    }
                }
                catalog.aliases.insert(alias, id.clone());
            }
            catalog.canonical.insert(id, code);
        }
        // A canonical id always wins over an alias spelled the same way.
        let canonical = &catalog.canonical;
        catalog.aliases.retain(|alias, _| !canonical.contains_key(alias));
        for code in file.extra_valid_provider_types {
            let key = code_key(&code);
            if !key.is_empty() {
                catalog.valid_codes.insert(key);
            }
        }
        Ok(catalog)
    }

    pub fn from_json_str(s: &str) -> CoreResult<Self> {
        let file: CatalogFile = serde_json::from_str(s)?;
        Self::from_file(file)
    }

    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl TypeResolver for TypeCatalog {
    fn canonical_type(&self, label: &str) -> CoreResult<Option<String>> {
        if self.canonical.contains_key(label) {
            return Ok(Some(label.to_string()));
        }
        if let Some(id) = self.aliases.get(label) {
            return Ok(Some(id.clone()));
        }
        if self.open_world && !label.is_empty() {
            return Ok(Some(label.to_string()));
        }
        Ok(None)
    }

    fn resolve_provider_type(&self, resource_type: &str) -> CoreResult<Option<String>> {
        Ok(self.canonical.get(resource_type).cloned().flatten())
    }
}

impl TypeValidator for TypeCatalog {
    fn validate_provider_type(&self, code: &str) -> CoreResult<bool> {
        Ok(self.valid_codes.contains(&code_key(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new(vec![
            CatalogEntry {
                resource_type: "App Service".to_string(),
                aliases: vec!["Web App".to_string(), "app_service_plan site".to_string()],
                provider_type_code: Some("Microsoft.Web/sites".to_string()),
            },
            CatalogEntry {
                resource_type: "key-vault".to_string(),
                aliases: vec![],
                provider_type_code: None,
            },
        ])
        .unwrap()
    }

    #[test]
    fn aliases_resolve_to_canonical_ids() {
        let c = catalog();
        assert_eq!(c.canonical_type("web-app").unwrap().as_deref(), Some("app-service"));
        assert_eq!(c.canonical_type("app-service").unwrap().as_deref(), Some("app-service"));
        assert_eq!(c.canonical_type("cdn").unwrap(), None);
    }

    #[test]
    fn provider_codes_resolve_and_validate() {
        let c = catalog();
        assert_eq!(
            c.resolve_provider_type("app-service").unwrap().as_deref(),
            Some("Microsoft.Web/sites")
        );
        assert_eq!(c.resolve_provider_type("key-vault").unwrap(), None);
        assert!(c.validate_provider_type("microsoft.web/SITES").unwrap());
        assert!(!c.validate_provider_type("Microsoft.Fake/thing").unwrap());
    }

    #[test]
    fn conflicting_aliases_are_rejected() {
        let err = TypeCatalog::new(vec![
            CatalogEntry {
                resource_type: "a".to_string(),
                aliases: vec!["shared".to_string()],
                provider_type_code: None,
            },
            CatalogEntry {
                resource_type: "b".to_string(),
                aliases: vec!["shared".to_string()],
                provider_type_code: None,
            },
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn open_world_catalog_accepts_any_label() {
        let c = TypeCatalog::open_world();
        assert_eq!(c.canonical_type("cdn").unwrap().as_deref(), Some("cdn"));
    }
}
