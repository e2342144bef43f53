use regex::Regex;
use std::sync::OnceLock;

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static separator pattern"))
}

/// Structural canonical form of a free-text label: lower-cased, every run of
/// non-alphanumeric characters collapsed into one hyphen, no leading or
/// trailing hyphen. Applying it twice changes nothing.
pub fn canonical_label(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    separator_pattern()
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators_and_case() {
        assert_eq!(canonical_label("  Azure App_Service (Web) "), "azure-app-service-web");
        assert_eq!(canonical_label("Key--Vault"), "key-vault");
        assert_eq!(canonical_label("---"), "");
    }

    #[test]
    fn is_idempotent() {
        for raw in ["Storage Account", "cosmos_db", "Ünïcode Lábel/v2", "", "a--b__c"] {
            let once = canonical_label(raw);
            assert_eq!(canonical_label(&once), once);
        }
    }
}
