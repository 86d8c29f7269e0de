//! Filtered, paginated view over the loaded proxy records

use crate::proxy::models::ProxyRecord;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Rows revealed per "load more" step
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Active filter values; `None` means "all"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub country: Option<String>,
    pub port: Option<String>,
}

impl FilterSelection {
    pub fn new(country: Option<String>, port: Option<String>) -> Self {
        Self { country, port }
    }

    pub fn matches(&self, record: &ProxyRecord) -> bool {
        let by_country = self.country.as_ref().map_or(true, |c| &record.country == c);
        let by_port = self.port.as_ref().map_or(true, |p| &record.port == p);
        by_country && by_port
    }
}

/// Distinct filter values present in the base sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Country codes, sorted lexicographically
    pub countries: Vec<String>,
    /// Ports, sorted numerically when every port is an integer
    pub ports: Vec<String>,
}

/// Numeric order when both sides are integers, lexicographic otherwise
fn compare_ports(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        _ => a.cmp(b),
    }
}

impl FilterOptions {
    pub fn from_records(records: &[ProxyRecord]) -> Self {
        let countries: Vec<String> = records
            .iter()
            .map(|r| r.country.clone())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut ports: Vec<String> = records
            .iter()
            .map(|r| r.port.clone())
            .filter(|p| !p.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ports.iter().all(|p| p.parse::<u64>().is_ok()) {
            ports.sort_by(|a, b| compare_ports(a, b));
        }

        Self { countries, ports }
    }

    /// Keep selected values that still exist, reset the rest to "all"
    pub fn retain_valid(&self, selection: &FilterSelection) -> FilterSelection {
        FilterSelection {
            country: selection
                .country
                .clone()
                .filter(|c| self.countries.contains(c)),
            port: selection.port.clone().filter(|p| self.ports.contains(p)),
        }
    }
}

/// Base records plus the filtered and revealed views derived from them
#[derive(Debug, Clone)]
pub struct ProxyView {
    base: Vec<ProxyRecord>,
    /// Indices into `base`, in base order
    filtered: Vec<usize>,
    shown: usize,
    page_size: usize,
    selection: FilterSelection,
    options: FilterOptions,
}

impl Default for ProxyView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ProxyView {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            base: Vec::new(),
            filtered: Vec::new(),
            shown: page_size,
            page_size,
            selection: FilterSelection::default(),
            options: FilterOptions::default(),
        }
    }

    /// Swap in a freshly loaded base sequence
    ///
    /// Options are re-derived, previous selections survive only if their
    /// values still exist, and pagination restarts from the first page.
    pub fn replace_records(&mut self, records: Vec<ProxyRecord>) {
        self.replace_records_with(records, self.selection.clone());
    }

    /// Swap in a new base sequence and re-apply `selection` against it
    pub fn replace_records_with(&mut self, records: Vec<ProxyRecord>, selection: FilterSelection) {
        self.base = records;
        self.options = FilterOptions::from_records(&self.base);
        let selection = self.options.retain_valid(&selection);
        self.apply_filter(selection);
    }

    /// Filter the base sequence and reset the pagination cursor
    pub fn apply_filter(&mut self, selection: FilterSelection) {
        self.filtered = self
            .base
            .iter()
            .enumerate()
            .filter(|(_, r)| selection.matches(r))
            .map(|(i, _)| i)
            .collect();
        self.selection = selection;
        self.shown = self.page_size;
    }

    /// Reveal the next page; returns how many rows became visible
    pub fn load_more(&mut self) -> usize {
        let before = self.shown_count();
        if self.has_more() {
            self.shown += self.page_size;
        }
        self.shown_count() - before
    }

    pub fn shown_count(&self) -> usize {
        self.shown.min(self.filtered.len())
    }

    /// Whether the "load more" control should be visible
    pub fn has_more(&self) -> bool {
        self.shown_count() < self.filtered.len()
    }

    /// Records currently revealed, in base order
    pub fn visible(&self) -> impl Iterator<Item = &ProxyRecord> + '_ {
        self.filtered[..self.shown_count()]
            .iter()
            .map(move |&i| &self.base[i])
    }

    /// Every record passing the filter, revealed or not
    pub fn filtered(&self) -> impl Iterator<Item = &ProxyRecord> + '_ {
        self.filtered.iter().map(move |&i| &self.base[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn base(&self) -> &[ProxyRecord] {
        &self.base
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Filtered addresses, one per line; `None` when there is nothing to copy
    pub fn addresses_text(&self) -> Option<String> {
        if self.filtered.is_empty() {
            return None;
        }
        Some(
            self.filtered()
                .map(|r| r.address.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Filtered records as CSV lines; `None` when there is nothing to copy
    pub fn csv_text(&self) -> Option<String> {
        if self.filtered.is_empty() {
            return None;
        }
        Some(
            self.filtered()
                .map(ProxyRecord::to_csv_line)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Cycle through `None` then each option in order, wrapping back to `None`
pub fn cycle_option(current: Option<&str>, options: &[String], forward: bool) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let pos = current.and_then(|c| options.iter().position(|o| o == c));
    let next = match (pos, forward) {
        (None, true) => Some(0),
        (None, false) => Some(options.len() - 1),
        (Some(i), true) if i + 1 < options.len() => Some(i + 1),
        (Some(_), true) => None,
        (Some(0), false) => None,
        (Some(i), false) => Some(i - 1),
    };
    next.map(|i| options[i].clone())
}
