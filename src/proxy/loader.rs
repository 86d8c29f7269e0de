//! Loading the proxy data file and the country name map
//!
//! Both resources can live on a web server or on disk. Remote fetches
//! bypass every cache layer so each reload reflects the latest content.

use crate::error::LoadError;
use crate::proxy::models::ProxyRecord;
use crate::proxy::parser::ProxyListParser;
use crate::Config;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;

/// Location of a text resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    Url(String),
    File(PathBuf),
}

impl ResourceLocation {
    /// Anything starting with `http://` or `https://` is a URL, the rest a path
    pub fn parse(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ResourceLocation::Url(s.to_string())
        } else {
            ResourceLocation::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLocation::Url(url) => write!(f, "{}", url),
            ResourceLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Anything that can produce the current proxy record list
pub trait RecordSource: Send + Sync {
    fn load_records(&self) -> impl Future<Output = Result<Vec<ProxyRecord>, LoadError>> + Send;
}

/// Fetches text resources from disk or over HTTP
#[derive(Clone)]
pub struct ProxyLoader {
    client: Client,
    source: ResourceLocation,
}

impl ProxyLoader {
    pub fn new(client: Client, source: ResourceLocation) -> Self {
        Self { client, source }
    }

    pub fn from_config(config: &Config, source: ResourceLocation) -> crate::Result<Self> {
        Ok(Self::new(config.http_client()?, source))
    }

    pub fn source(&self) -> &ResourceLocation {
        &self.source
    }

    /// Read a resource as text, bypassing caches for URLs
    pub async fn fetch_text(client: &Client, location: &ResourceLocation) -> Result<String, LoadError> {
        match location {
            ResourceLocation::File(path) => Ok(tokio::fs::read_to_string(path).await?),
            ResourceLocation::Url(url) => {
                let response = fresh_request(client, url).send().await?;
                check_status(response.status())?;
                Ok(response.text().await?)
            }
        }
    }

    /// Load the country code to display name map
    ///
    /// A failure is logged and yields an empty map; names then fall back
    /// to the raw codes.
    pub async fn load_country_names(&self, location: &ResourceLocation) -> CountryNames {
        let result = async {
            let text = Self::fetch_text(&self.client, location).await?;
            let map: HashMap<String, String> = serde_json::from_str(&text)?;
            Ok::<_, LoadError>(map)
        }
        .await;

        match result {
            Ok(map) => {
                log::info!("Loaded {} country names from {}", map.len(), location);
                CountryNames::new(map)
            }
            Err(e) => {
                log::error!("Failed to load country names from {}: {}", location, e);
                CountryNames::default()
            }
        }
    }
}

impl RecordSource for ProxyLoader {
    async fn load_records(&self) -> Result<Vec<ProxyRecord>, LoadError> {
        let text = Self::fetch_text(&self.client, &self.source).await?;
        let records = ProxyListParser::parse_string(&text);
        log::info!("Loaded {} records from {}", records.len(), self.source);
        Ok(records)
    }
}

/// GET with a timestamp query parameter and no-cache headers
fn fresh_request(client: &Client, url: &str) -> RequestBuilder {
    let stamp = chrono::Utc::now().timestamp_millis().to_string();
    client
        .get(url)
        .query(&[("_", stamp)])
        .header(CACHE_CONTROL, "no-cache, no-store")
        .header(PRAGMA, "no-cache")
}

fn check_status(status: StatusCode) -> Result<(), LoadError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(LoadError::Status(status))
    }
}

/// Country code to human-readable name lookup
#[derive(Debug, Clone, Default)]
pub struct CountryNames {
    names: HashMap<String, String>,
}

impl CountryNames {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Display name for a code, falling back to the code itself
    pub fn display<'a>(&'a self, code: &'a str) -> &'a str {
        self.names.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "ip-atlas-{}-{}",
            std::process::id(),
            name
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    /// Answer one HTTP request with `status` and `body`; yields the raw request head
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/alive.txt", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&head).to_lowercase()
        });
        (url, handle)
    }

    fn direct_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn test_fresh_request_bypasses_caches() {
        let request = fresh_request(&Client::new(), "https://example.com/alive.txt")
            .build()
            .unwrap();

        let stamp = request
            .url()
            .query_pairs()
            .find(|(k, _)| k == "_")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert!(stamp.parse::<i64>().unwrap() > 0);
        assert_eq!(request.headers()[CACHE_CONTROL], "no-cache, no-store");
        assert_eq!(request.headers()[PRAGMA], "no-cache");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(LoadError::Status(StatusCode::NOT_FOUND))
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(LoadError::Status(StatusCode::BAD_GATEWAY))
        ));
    }

    #[tokio::test]
    async fn test_load_records_over_http() {
        let (url, server) = serve_once("200 OK", "1.2.3.4,8080,US,Provider\n").await;
        let loader = ProxyLoader::new(direct_client(), ResourceLocation::Url(url));
        let records = loader.load_records().await.unwrap();
        let head = server.await.unwrap();

        assert_eq!(records.len(), 1);
        assert!(head.starts_with("get /alive.txt?_="));
        assert!(head.contains("cache-control: no-cache, no-store"));
        assert!(head.contains("pragma: no-cache"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let (url, server) = serve_once("404 Not Found", "gone").await;
        let loader = ProxyLoader::new(direct_client(), ResourceLocation::Url(url));
        let result = loader.load_records().await;
        server.await.unwrap();

        assert!(matches!(result, Err(LoadError::Status(StatusCode::NOT_FOUND))));
    }

    #[test]
    fn test_resource_location_parse() {
        assert_eq!(
            ResourceLocation::parse("https://example.com/alive.txt"),
            ResourceLocation::Url("https://example.com/alive.txt".to_string())
        );
        assert_eq!(
            ResourceLocation::parse("./alive.txt"),
            ResourceLocation::File(PathBuf::from("./alive.txt"))
        );
    }

    #[test]
    fn test_country_names_fallback() {
        let mut map = HashMap::new();
        map.insert("US".to_string(), "United States".to_string());
        let names = CountryNames::new(map);
        assert_eq!(names.display("US"), "United States");
        assert_eq!(names.display("ZZ"), "ZZ");
    }

    #[tokio::test]
    async fn test_load_records_from_file() {
        let path = temp_file("alive.txt", "1.2.3.4,8080,US,Some, Provider\n5.6.7.8,80,DE,X\n");
        let loader = ProxyLoader::new(Client::new(), ResourceLocation::File(path.clone()));
        let records = loader.load_records().await.unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].provider, "Some, Provider");
    }

    #[tokio::test]
    async fn test_load_records_missing_file() {
        let loader = ProxyLoader::new(
            Client::new(),
            ResourceLocation::File(PathBuf::from("/definitely/not/here/alive.txt")),
        );
        assert!(matches!(loader.load_records().await, Err(LoadError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_country_names() {
        let path = temp_file("countries.json", r#"{"US": "United States", "DE": "Germany"}"#);
        let loader = ProxyLoader::new(Client::new(), ResourceLocation::File(PathBuf::from("unused")));
        let names = loader
            .load_country_names(&ResourceLocation::File(path.clone()))
            .await;
        std::fs::remove_file(path).ok();

        assert_eq!(names.len(), 2);
        assert_eq!(names.display("DE"), "Germany");
    }

    #[tokio::test]
    async fn test_bad_country_names_yield_empty_map() {
        let path = temp_file("bad-countries.json", "not json");
        let loader = ProxyLoader::new(Client::new(), ResourceLocation::File(PathBuf::from("unused")));
        let names = loader
            .load_country_names(&ResourceLocation::File(path.clone()))
            .await;
        std::fs::remove_file(path).ok();

        assert!(names.is_empty());
        assert_eq!(names.display("US"), "US");
    }
}
