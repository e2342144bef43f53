use super::position::Position;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anchor position quantized to thousandths of a diagram unit so it can take
/// part in value equality and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorPoint {
    pub x_milli: i64,
    pub y_milli: i64,
}

impl AnchorPoint {
    pub fn from_position(p: &Position) -> Self {
        Self {
            x_milli: (p.x * 1000.0).round() as i64,
            y_milli: (p.y * 1000.0).round() as i64,
        }
    }

    pub fn to_position(self) -> Position {
        Position::new(self.x_milli as f64 / 1000.0, self.y_milli as f64 / 1000.0)
    }
}

/// Deduplication key of a merged resource.
///
/// The anchor is only set when the provider type code is empty; in that case
/// the position of the proximity cluster disambiguates same-typed resources.
/// Rendered as `type|code` or `type|@x,y`. A code that itself starts with
/// `@` is written with the `@` doubled so it never reads as an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct IdentityKey {
    pub resource_type: String,
    pub provider_type_code: String,
    pub anchor: Option<AnchorPoint>,
}

impl IdentityKey {
    pub fn coded(resource_type: &str, provider_type_code: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            provider_type_code: code_key(provider_type_code),
            anchor: None,
        }
    }

    pub fn anchored(resource_type: &str, anchor: &Position) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            provider_type_code: String::new(),
            anchor: Some(AnchorPoint::from_position(anchor)),
        }
    }

    pub fn has_provider_type(&self) -> bool {
        !self.provider_type_code.is_empty()
    }
}

/// Comparison form of a provider type code: trimmed and lower-cased.
pub fn code_key(code: &str) -> String {
    code.trim().to_lowercase()
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor {
            Some(a) if self.provider_type_code.is_empty() => {
                let p = a.to_position();
                write!(f, "{}|@{},{}", self.resource_type, p.x, p.y)
            }
            _ if self.provider_type_code.starts_with('@') => {
                write!(f, "{}|@{}", self.resource_type, self.provider_type_code)
            }
            _ => write!(f, "{}|{}", self.resource_type, self.provider_type_code),
        }
    }
}

impl FromStr for IdentityKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource_type, rest) = s
            .split_once('|')
            .ok_or_else(|| CoreError::InvalidInput(format!("identity key missing '|': {}", s)))?;
        if resource_type.is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "identity key has empty resource type: {}",
                s
            )));
        }
        if let Some(code) = rest.strip_prefix("@@") {
            return Ok(IdentityKey::coded(resource_type, &format!("@{}", code)));
        }
        if let Some(coords) = rest.strip_prefix('@') {
            let (x, y) = coords.split_once(',').ok_or_else(|| {
                CoreError::InvalidInput(format!("identity anchor must be '@x,y': {}", s))
            })?;
            let x: f64 = x
                .parse()
                .map_err(|_| CoreError::InvalidInput(format!("bad anchor x in {}", s)))?;
            let y: f64 = y
                .parse()
                .map_err(|_| CoreError::InvalidInput(format!("bad anchor y in {}", s)))?;
            return Ok(IdentityKey::anchored(resource_type, &Position::new(x, y)));
        }
        Ok(IdentityKey::coded(resource_type, rest))
    }
}

impl From<IdentityKey> for String {
    fn from(k: IdentityKey) -> Self {
        k.to_string()
    }
}

impl TryFrom<String> for IdentityKey {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_keys_parse_back() {
        let coded = IdentityKey::coded("storage-account", "Microsoft.Storage/storageAccounts");
        assert_eq!(coded.to_string(), "storage-account|microsoft.storage/storageaccounts");
        assert_eq!(coded.to_string().parse::<IdentityKey>().unwrap(), coded);

        let anchored = IdentityKey::anchored("queue", &Position::new(120.5, -40.0));
        assert_eq!(anchored.to_string(), "queue|@120.5,-40");
        assert_eq!(anchored.to_string().parse::<IdentityKey>().unwrap(), anchored);
    }

    #[test]
    fn codes_starting_with_at_are_not_anchors() {
        let scoped = IdentityKey::coded("vm", "@corp/vm");
        assert_eq!(scoped.to_string(), "vm|@@corp/vm");
        let parsed: IdentityKey = scoped.to_string().parse().unwrap();
        assert_eq!(parsed, scoped);
        assert!(parsed.anchor.is_none());

        let bare = IdentityKey::coded("vm", "@");
        assert_eq!(bare.to_string().parse::<IdentityKey>().unwrap(), bare);
        let json = serde_json::to_string(&scoped).unwrap();
        assert_eq!(serde_json::from_str::<IdentityKey>(&json).unwrap(), scoped);
    }

    #[test]
    fn code_comparison_ignores_case_and_padding() {
        assert_eq!(
            IdentityKey::coded("vm", " Compute/VM "),
            IdentityKey::coded("vm", "compute/vm")
        );
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!("no-separator".parse::<IdentityKey>().is_err());
        assert!("|code".parse::<IdentityKey>().is_err());
        assert!("vm|@1".parse::<IdentityKey>().is_err());
    }
}
