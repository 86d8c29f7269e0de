//! Proxy list data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for a field missing from a data line
pub const MISSING_FIELD: &str = "-";

/// One line of the proxy data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub address: String,
    /// Kept as text: it is a filter key, never used for arithmetic
    pub port: String,
    /// Raw country code as found in the file
    pub country: String,
    /// Free text, may contain commas
    pub provider: String,
}

impl ProxyRecord {
    pub fn new(
        address: impl Into<String>,
        port: impl Into<String>,
        country: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            port: port.into(),
            country: country.into(),
            provider: provider.into(),
        }
    }

    /// `address,port,country,provider`, the same shape the file uses
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.address, self.port, self.country, self.provider
        )
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}
