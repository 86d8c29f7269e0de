//! Lookup module for address geolocation and ASN history
//!
//! This module provides functionality for:
//! - Resolving addresses through a geolocation API in validated batches
//! - Extracting autonomous-system numbers from provider labels
//! - Listing the prefixes an ASN announced on a given UTC day

pub mod asn;
pub mod client;
pub mod history;
pub mod models;
pub mod orchestrator;
pub mod registry;

pub use asn::extract_asn_number;
pub use client::{AddressSource, GeoClient};
pub use history::{PrefixHistoryClient, PrefixQuery, PrefixSource, PrefixSummary};
pub use models::{AddressInfo, LookupRow, NOT_AVAILABLE};
pub use orchestrator::{parse_address_list, LookupOrchestrator, DEFAULT_CONCURRENCY, MAX_BATCH};
pub use registry::RowRegistry;
