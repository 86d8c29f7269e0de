//! Geolocation API client

use crate::error::LookupError;
use crate::lookup::asn::extract_asn_number;
use crate::lookup::models::AddressInfo;
use crate::Config;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;

/// Anything that can resolve an address into [`AddressInfo`]
pub trait AddressSource: Send + Sync {
    fn lookup(&self, address: &str)
        -> impl Future<Output = Result<AddressInfo, LookupError>> + Send;
}

/// Raw geolocation payload
///
/// Every field is optional: provider versions disagree on names and types,
/// so numbers may arrive as strings and the other way around.
#[derive(Debug, Default, Deserialize)]
pub struct GeoResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub ip: Option<String>,
    #[serde(rename = "as")]
    pub as_label: Option<String>,
    pub asn: Option<Value>,
    pub org: Option<String>,
    pub isp: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    pub timezone: Option<Value>,
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("name"))
            .map(value_to_string)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl GeoResponse {
    /// Normalize the payload, falling back to the queried address
    pub fn into_info(self, queried: &str) -> Result<AddressInfo, LookupError> {
        if self.success == Some(false) {
            return Err(LookupError::Rejected(
                self.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let asn_field = self.asn.as_ref().map(value_to_string).unwrap_or_default();
        let asn_text = self
            .as_label
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| asn_field.clone());
        let number = extract_asn_number(self.as_label.as_deref().unwrap_or(""), &asn_field);

        let coordinates = match (
            self.latitude.as_ref().and_then(value_to_f64),
            self.longitude.as_ref().and_then(value_to_f64),
        ) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };

        Ok(AddressInfo {
            address: self
                .ip
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| queried.to_string()),
            asn_text,
            asn_number: (!number.is_empty()).then_some(number),
            org: self.org.unwrap_or_default(),
            isp: self.isp.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            coordinates,
            timezone: self.timezone.as_ref().map(value_to_string).unwrap_or_default(),
        })
    }
}

/// HTTP client for the geolocation-by-address API
#[derive(Clone)]
pub struct GeoClient {
    client: Client,
    endpoint: String,
}

impl GeoClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Ok(Self::new(config.http_client()?, config.geo_endpoint.clone()))
    }

    /// Request URL for an address; the address is percent-encoded as a path segment
    pub fn url_for(&self, address: &str) -> crate::Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("endpoint cannot be a base URL: {}", self.endpoint))?
            .pop_if_empty()
            .push(address);
        Ok(url)
    }
}

impl AddressSource for GeoClient {
    async fn lookup(&self, address: &str) -> Result<AddressInfo, LookupError> {
        let url = self
            .url_for(address)
            .map_err(|e| LookupError::Malformed(e.to_string()))?;
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }
        let body: GeoResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;
        body.into_info(address)
    }
}
