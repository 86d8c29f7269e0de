//! Autonomous-system number extraction

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches an `AS<digits>` token anywhere in a label, case-insensitively
static AS_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)AS(\d+)").expect("Invalid AS token regex"));

/// Pull the bare number out of an `AS<digits>` label
pub fn asn_from_label(label: &str) -> Option<String> {
    AS_TOKEN_REGEX
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolve the ASN from a textual label and a separate numeric field
///
/// An `AS<digits>` token in `label` wins; otherwise `numeric` is accepted if
/// it is made of digits only; otherwise the result is empty.
pub fn extract_asn_number(label: &str, numeric: &str) -> String {
    if let Some(num) = asn_from_label(label) {
        return num;
    }
    let numeric = numeric.trim();
    if !numeric.is_empty() && numeric.chars().all(|c| c.is_ascii_digit()) {
        return numeric.to_string();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_with_as_token() {
        assert_eq!(extract_asn_number("AS12345 SomeOrg", ""), "12345");
    }

    #[test]
    fn test_lowercase_token() {
        assert_eq!(extract_asn_number("as64512 private", ""), "64512");
    }

    #[test]
    fn test_label_wins_over_numeric() {
        assert_eq!(extract_asn_number("AS100 Org", "200"), "100");
    }

    #[test]
    fn test_purely_numeric_field() {
        assert_eq!(extract_asn_number("", "6789"), "6789");
        assert_eq!(extract_asn_number("6789", "6789"), "6789");
    }

    #[test]
    fn test_no_number() {
        assert_eq!(extract_asn_number("SomeOrgNoNumber", ""), "");
        assert_eq!(extract_asn_number("SomeOrgNoNumber", "SomeOrgNoNumber"), "");
        assert_eq!(extract_asn_number("", "12a"), "");
    }
}
