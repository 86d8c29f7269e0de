//! IP Atlas - IP/ASN lookup and proxy-list viewer
//!
//! Two small utilities living in one crate:
//! - an address lookup tool backed by a geolocation API, with a historical
//!   announced-prefix query against the RIPEstat routing registry
//! - a proxy-list viewer that loads a delimited data file and renders it as a
//!   filterable, paginated table with timed refresh

pub mod error;
pub mod logger;
pub mod lookup;
pub mod proxy;
pub mod tui;

pub use error::{HistoryError, LoadError, LookupError, ValidationError};
pub use lookup::{AddressInfo, GeoClient, LookupOrchestrator, LookupRow, PrefixHistoryClient};
pub use proxy::{FilterSelection, ProxyLoader, ProxyRecord, ProxyView, ResourceLocation};

use std::time::Duration;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Default geolocation endpoint, the address is appended as a path segment
pub const DEFAULT_GEO_ENDPOINT: &str = "https://ipwhois.app/json";

/// Default RIPEstat announced-prefixes endpoint
pub const DEFAULT_PREFIX_ENDPOINT: &str = "https://stat.ripe.net/data/announced-prefixes/data.json";

/// Default timeout for outbound HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default user agent for outbound HTTP requests
const DEFAULT_USER_AGENT: &str = concat!("ip-atlas/", env!("CARGO_PKG_VERSION"));

/// Default auto-refresh period for the proxy viewer (10 minutes)
const DEFAULT_REFRESH_SECS: u64 = 600;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Geolocation API base URL
    pub geo_endpoint: String,
    /// Announced-prefix API URL
    pub prefix_endpoint: String,
    /// Timeout for each HTTP request
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Number of lookups allowed in flight at once
    pub concurrency: usize,
    /// Rows revealed per "load more" step
    pub page_size: usize,
    /// Auto-refresh period for the proxy viewer
    pub refresh_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geo_endpoint: DEFAULT_GEO_ENDPOINT.to_string(),
            prefix_endpoint: DEFAULT_PREFIX_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: lookup::DEFAULT_CONCURRENCY,
            page_size: proxy::DEFAULT_PAGE_SIZE,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_geo_endpoint(mut self, endpoint: String) -> Self {
        self.geo_endpoint = endpoint;
        self
    }

    pub fn with_prefix_endpoint(mut self, endpoint: String) -> Self {
        self.prefix_endpoint = endpoint;
        self
    }

    /// Concurrency is clamped to at least one in-flight lookup
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Page size is clamped to at least one row
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Build the shared HTTP client every component talks through
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}
