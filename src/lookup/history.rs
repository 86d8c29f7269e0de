//! Historical announced-prefix lookup against the RIPEstat API

use crate::error::HistoryError;
use crate::Config;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;

/// Prefixes displayed before the list is truncated
pub const MAX_DISPLAYED_PREFIXES: usize = 50;

/// A validated request for one ASN over one UTC day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixQuery {
    pub asn: String,
    pub date: NaiveDate,
}

impl PrefixQuery {
    /// Build a query, short-circuiting when either input is missing
    pub fn new(asn: Option<&str>, date: Option<NaiveDate>) -> Result<Self, HistoryError> {
        let asn = asn
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(HistoryError::MissingAsn)?;
        let date = date.ok_or(HistoryError::MissingDate)?;
        Ok(Self {
            asn: asn.to_string(),
            date,
        })
    }

    /// Same as [`PrefixQuery::new`] with a `YYYY-MM-DD` date string
    pub fn parse(asn: Option<&str>, date: &str) -> Result<Self, HistoryError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok();
        Self::new(asn, date)
    }

    pub fn resource(&self) -> String {
        format!("AS{}", self.asn)
    }

    pub fn start_time(&self) -> String {
        format!("{}T00:00:00", self.date.format("%Y-%m-%d"))
    }

    pub fn end_time(&self) -> String {
        format!("{}T23:59:59", self.date.format("%Y-%m-%d"))
    }
}

/// Today's date in UTC, the default for the date picker
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// De-duplicate prefixes, keeping the first occurrence of each
pub fn dedup_prefixes(prefixes: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    prefixes
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Unique prefixes announced during a query window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixSummary {
    pub query: PrefixQuery,
    pub prefixes: Vec<String>,
}

impl PrefixSummary {
    pub fn new(query: PrefixQuery, raw: Vec<String>) -> Self {
        Self {
            query,
            prefixes: dedup_prefixes(raw),
        }
    }

    pub fn total(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// The first [`MAX_DISPLAYED_PREFIXES`] prefixes
    pub fn sample(&self) -> &[String] {
        let end = self.prefixes.len().min(MAX_DISPLAYED_PREFIXES);
        &self.prefixes[..end]
    }

    pub fn is_truncated(&self) -> bool {
        self.prefixes.len() > MAX_DISPLAYED_PREFIXES
    }

    pub fn headline(&self) -> String {
        format!(
            "Date: {} (UTC), announced prefixes: {}",
            self.query.date.format("%Y-%m-%d"),
            self.total()
        )
    }

    /// Footer note, if any: "no data" or the truncation notice
    pub fn note(&self) -> Option<String> {
        if self.is_empty() {
            Some("No prefix announcements found for this date, or the ASN announced nothing.".to_string())
        } else if self.is_truncated() {
            Some(format!(
                "Showing the first {} of {} prefixes.",
                MAX_DISPLAYED_PREFIXES,
                self.total()
            ))
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PrefixEntry {
    Object { prefix: String },
    Bare(String),
    /// Anything else in the list is skipped rather than failing the whole response
    Other(serde_json::Value),
}

impl PrefixEntry {
    fn into_prefix(self) -> Option<String> {
        match self {
            PrefixEntry::Object { prefix } | PrefixEntry::Bare(prefix) => Some(prefix),
            PrefixEntry::Other(value) => {
                log::debug!("Skipping unrecognised prefix entry: {}", value);
                None
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PrefixData {
    #[serde(default)]
    prefixes: Option<Vec<PrefixEntry>>,
}

#[derive(Debug, Deserialize)]
struct PrefixResponse {
    #[serde(default)]
    data: Option<PrefixData>,
}

/// Extract the prefix list from a RIPEstat response body
pub fn parse_prefix_response(body: &str) -> Result<Vec<String>, HistoryError> {
    let response: PrefixResponse =
        serde_json::from_str(body).map_err(|e| HistoryError::Request(e.to_string()))?;
    Ok(response
        .data
        .unwrap_or_default()
        .prefixes
        .unwrap_or_default()
        .into_iter()
        .filter_map(PrefixEntry::into_prefix)
        .collect())
}

/// Anything that can list the prefixes announced for a query
pub trait PrefixSource: Send + Sync {
    fn announced_prefixes(
        &self,
        query: &PrefixQuery,
    ) -> impl Future<Output = Result<Vec<String>, HistoryError>> + Send;
}

/// HTTP client for the RIPEstat announced-prefixes endpoint
#[derive(Clone)]
pub struct PrefixHistoryClient {
    client: Client,
    endpoint: String,
}

impl PrefixHistoryClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Ok(Self::new(config.http_client()?, config.prefix_endpoint.clone()))
    }
}

impl PrefixSource for PrefixHistoryClient {
    async fn announced_prefixes(&self, query: &PrefixQuery) -> Result<Vec<String>, HistoryError> {
        log::debug!(
            "Querying prefixes for {} on {}",
            query.resource(),
            query.date
        );
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("resource", query.resource()),
                ("starttime", query.start_time()),
                ("endtime", query.end_time()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HistoryError::Request(format!(
                "RIPEstat request failed: HTTP {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        parse_prefix_response(&body)
    }
}

/// Run a query and fold the result into a summary
pub async fn fetch_summary<P: PrefixSource>(
    source: &P,
    query: PrefixQuery,
) -> Result<PrefixSummary, HistoryError> {
    let raw = source.announced_prefixes(&query).await?;
    Ok(PrefixSummary::new(query, raw))
}
