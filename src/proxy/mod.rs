//! Proxy module for loading and browsing proxy lists
//!
//! This module provides functionality for:
//! - Parsing the `address,port,country,provider` data file
//! - Loading it from disk or over HTTP with caches bypassed
//! - Filtering by country and port with incremental pagination
//! - Timed refresh guarded against stale responses

pub mod loader;
pub mod models;
pub mod parser;
pub mod refresh;
pub mod view;

pub use loader::{CountryNames, ProxyLoader, RecordSource, ResourceLocation};
pub use models::{ProxyRecord, MISSING_FIELD};
pub use parser::ProxyListParser;
pub use refresh::{AutoRefresh, Generation};
pub use view::{FilterOptions, FilterSelection, ProxyView, DEFAULT_PAGE_SIZE};
