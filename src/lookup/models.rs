//! Lookup data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown for any missing optional field
pub const NOT_AVAILABLE: &str = "N/A";

/// Geolocation and routing facts for a single address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AddressInfo {
    pub address: String,
    /// Autonomous-system label as reported, e.g. "AS13335 Cloudflare, Inc."
    pub asn_text: String,
    /// Bare autonomous-system number, e.g. "13335"
    pub asn_number: Option<String>,
    pub org: String,
    pub isp: String,
    pub country: String,
    pub city: String,
    /// Latitude/longitude pair
    pub coordinates: Option<(f64, f64)>,
    pub timezone: String,
}

fn or_na(value: &str) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

impl AddressInfo {
    /// The ASN as it should be shown: the label, else `AS<number>`, else N/A
    pub fn asn_display(&self) -> String {
        if !self.asn_text.is_empty() {
            return self.asn_text.clone();
        }
        match &self.asn_number {
            Some(num) => format!("AS{}", num),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn coordinates_display(&self) -> String {
        match self.coordinates {
            Some((lat, lon)) => format!("{}, {}", lat, lon),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    /// Cells for a result table row, in column order
    pub fn row_cells(&self) -> [String; 8] {
        [
            self.address.clone(),
            self.asn_display(),
            or_na(&self.org),
            or_na(&self.isp),
            or_na(&self.country),
            or_na(&self.city),
            self.coordinates_display(),
            or_na(&self.timezone),
        ]
    }

    /// Labelled fields for the detail panel
    pub fn detail_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("IP address", self.address.clone()),
            ("ASN", self.asn_display()),
            ("Organization", or_na(&self.org)),
            ("ISP", or_na(&self.isp)),
            ("Country", or_na(&self.country)),
            ("City", or_na(&self.city)),
            ("Coordinates", self.coordinates_display()),
            ("Timezone", or_na(&self.timezone)),
        ]
    }
}

/// Column headers matching [`AddressInfo::row_cells`]
pub const RESULT_COLUMNS: [&str; 8] = [
    "IP",
    "ASN",
    "Organization",
    "ISP",
    "Country",
    "City",
    "Coordinates",
    "Timezone",
];

/// Outcome of one address in a lookup batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LookupRow {
    Success(AddressInfo),
    Failure { address: String, reason: String },
}

impl LookupRow {
    pub fn address(&self) -> &str {
        match self {
            LookupRow::Success(info) => &info.address,
            LookupRow::Failure { address, .. } => address,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LookupRow::Success(_))
    }

    pub fn info(&self) -> Option<&AddressInfo> {
        match self {
            LookupRow::Success(info) => Some(info),
            LookupRow::Failure { .. } => None,
        }
    }
}

impl fmt::Display for LookupRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupRow::Success(info) => write!(f, "{}", info.row_cells().join(" | ")),
            LookupRow::Failure { address, reason } => {
                write!(f, "{} | lookup failed ({})", address, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AddressInfo {
        AddressInfo {
            address: "1.1.1.1".to_string(),
            asn_text: "AS13335 Cloudflare, Inc.".to_string(),
            asn_number: Some("13335".to_string()),
            org: "APNIC and Cloudflare DNS Resolver project".to_string(),
            isp: "Cloudflare, Inc.".to_string(),
            country: "Australia".to_string(),
            city: "Sydney".to_string(),
            coordinates: Some((-33.8688, 151.2093)),
            timezone: "Australia/Sydney".to_string(),
        }
    }

    #[test]
    fn test_asn_display_prefers_text() {
        assert_eq!(sample().asn_display(), "AS13335 Cloudflare, Inc.");
    }

    #[test]
    fn test_asn_display_falls_back_to_number() {
        let info = AddressInfo {
            asn_text: String::new(),
            ..sample()
        };
        assert_eq!(info.asn_display(), "AS13335");

        let bare = AddressInfo {
            address: "10.0.0.1".to_string(),
            ..Default::default()
        };
        assert_eq!(bare.asn_display(), NOT_AVAILABLE);
    }

    #[test]
    fn test_detail_fields_use_placeholder() {
        let info = AddressInfo {
            address: "10.0.0.1".to_string(),
            ..Default::default()
        };
        let fields = info.detail_fields();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], ("IP address", "10.0.0.1".to_string()));
        assert!(fields[1..].iter().all(|(_, v)| v == NOT_AVAILABLE));
    }

    #[test]
    fn test_row_cells() {
        let cells = sample().row_cells();
        assert_eq!(cells.len(), RESULT_COLUMNS.len());
        assert_eq!(cells[6], "-33.8688, 151.2093");
    }

    #[test]
    fn test_lookup_row_accessors() {
        let ok = LookupRow::Success(sample());
        assert!(ok.is_success());
        assert_eq!(ok.address(), "1.1.1.1");
        assert!(ok.info().is_some());

        let failed = LookupRow::Failure {
            address: "bogus".to_string(),
            reason: "HTTP status: 500".to_string(),
        };
        assert!(!failed.is_success());
        assert_eq!(failed.address(), "bogus");
        assert!(failed.to_string().contains("lookup failed"));
    }
}
