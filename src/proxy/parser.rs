//! Parser for the comma-delimited proxy data file

use crate::proxy::models::{ProxyRecord, MISSING_FIELD};

/// Parser for `address,port,country,provider` lines
pub struct ProxyListParser;

fn field_or_dash(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        MISSING_FIELD.to_string()
    } else {
        value.to_string()
    }
}

impl ProxyListParser {
    /// Parse a single data line
    ///
    /// Everything after the third comma belongs to the provider, so
    /// `1.2.3.4,8080,US,Some, Provider` keeps `Some, Provider` intact.
    /// Blank lines yield `None`.
    pub fn parse_line(line: &str) -> Option<ProxyRecord> {
        if line.trim().is_empty() {
            return None;
        }

        let mut parts = line.splitn(4, ',');
        let address = parts.next().unwrap_or("");
        let port = parts.next().unwrap_or("");
        let country = parts.next().unwrap_or("");
        let provider = parts.next().unwrap_or("");

        Some(ProxyRecord {
            address: field_or_dash(address),
            port: field_or_dash(port),
            country: field_or_dash(country),
            provider: field_or_dash(provider),
        })
    }

    /// Parse the whole file body, one record per non-blank line
    pub fn parse_string(content: &str) -> Vec<ProxyRecord> {
        content.lines().filter_map(Self::parse_line).collect()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_with_comma() {
        let record = ProxyListParser::parse_line("1.2.3.4,8080,US,Some, Provider").unwrap();
        assert_eq!(record.address, "1.2.3.4");
        assert_eq!(record.port, "8080");
        assert_eq!(record.country, "US");
        assert_eq!(record.provider, "Some, Provider");
    }

    #[test]
    fn test_parse_trims_fields() {
        let record = ProxyListParser::parse_line(" 1.2.3.4 , 3128 ,DE,  Hetzner Online GmbH ").unwrap();
        assert_eq!(record.address, "1.2.3.4");
        assert_eq!(record.port, "3128");
        assert_eq!(record.provider, "Hetzner Online GmbH");
    }

    #[test]
    fn test_parse_missing_fields_become_dash() {
        let record = ProxyListParser::parse_line("5.6.7.8,80").unwrap();
        assert_eq!(record.country, MISSING_FIELD);
        assert_eq!(record.provider, MISSING_FIELD);

        let record = ProxyListParser::parse_line(",, ,").unwrap();
        assert_eq!(record, ProxyRecord::new("-", "-", "-", "-"));
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(ProxyListParser::parse_line("").is_none());
        assert!(ProxyListParser::parse_line("   ").is_none());
    }

    #[test]
    fn test_parse_string() {
        let content = "1.1.1.1,80,US,A\r\n\n2.2.2.2,8080,DE,B, C\n  \n3.3.3.3,3128,US,D\n";
        let records = ProxyListParser::parse_string(content);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].provider, "A");
        assert_eq!(records[1].provider, "B, C");
        assert_eq!(records[2].address, "3.3.3.3");
    }
}
