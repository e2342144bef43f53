/// Module key of a provider type code: trimmed, lower-cased, path separators
/// replaced by hyphens. Structural only; no lookup tables.
pub fn module_key_for(provider_type_code: &str) -> String {
    provider_type_code
        .trim()
        .to_lowercase()
        .replace(['/', '\\'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_separators() {
        assert_eq!(
            module_key_for("Microsoft.Web/sites"),
            "microsoft.web-sites"
        );
        assert_eq!(module_key_for(" AWS\\Lambda/Function "), "aws-lambda-function");
    }

    #[test]
    fn same_code_same_key() {
        assert_eq!(module_key_for("A/B"), module_key_for("a/b"));
    }
}
