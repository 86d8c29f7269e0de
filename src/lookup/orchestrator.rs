//! Lookup batch orchestration

use crate::error::ValidationError;
use crate::lookup::client::AddressSource;
use crate::lookup::models::LookupRow;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Largest batch accepted in one run
pub const MAX_BATCH: usize = 50;

/// Default number of lookups in flight; one means strictly sequential
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Split pasted text into addresses, one per line, blanks dropped
pub fn parse_address_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Check batch preconditions without touching the network
pub fn validate_batch(addresses: &[String]) -> Result<(), ValidationError> {
    if addresses.is_empty() {
        return Err(ValidationError::Empty);
    }
    if addresses.len() > MAX_BATCH {
        return Err(ValidationError::TooMany {
            count: addresses.len(),
            max: MAX_BATCH,
        });
    }
    Ok(())
}

/// Marks the trigger busy for the lifetime of a batch
///
/// Dropping the guard clears the flag, so every exit path (including a
/// cancelled future) re-enables the trigger exactly once.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    /// Claim the flag; `None` if a batch already holds it
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs lookup batches against an [`AddressSource`]
pub struct LookupOrchestrator<S> {
    source: Arc<S>,
    concurrency: usize,
    busy: Arc<AtomicBool>,
}

impl<S> Clone for LookupOrchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            concurrency: self.concurrency,
            busy: Arc::clone(&self.busy),
        }
    }
}

impl<S: AddressSource> LookupOrchestrator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            concurrency: DEFAULT_CONCURRENCY,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Whether a batch is currently running
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Shared busy flag, for UIs that render the trigger state
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.busy)
    }

    /// Validate a batch and claim the busy flag for it
    ///
    /// Callers that hand the batch to a background task take the guard
    /// here, synchronously, so a second trigger is refused before the
    /// task gets scheduled.
    pub fn begin(&self, addresses: &[String]) -> Result<BusyGuard, ValidationError> {
        validate_batch(addresses)?;
        BusyGuard::acquire(&self.busy).ok_or(ValidationError::Busy)
    }

    /// Look up every address, handing each row to `on_row` in input order
    ///
    /// Fails only on batch preconditions; per-address failures become
    /// [`LookupRow::Failure`] rows and the batch carries on.
    pub async fn run_with<F>(&self, addresses: &[String], on_row: F) -> Result<usize, ValidationError>
    where
        F: FnMut(usize, LookupRow),
    {
        let guard = self.begin(addresses)?;
        Ok(self.run_guarded(guard, addresses, on_row).await)
    }

    /// Run a batch already claimed with [`LookupOrchestrator::begin`]
    ///
    /// The flag is released when the guard drops at the end of the batch.
    pub async fn run_guarded<F>(&self, _guard: BusyGuard, addresses: &[String], mut on_row: F) -> usize
    where
        F: FnMut(usize, LookupRow),
    {
        log::info!(
            "Looking up {} addresses ({} in flight)",
            addresses.len(),
            self.concurrency
        );

        // `buffered` yields in submission order, so rows stay aligned with input
        let mut rows = stream::iter(addresses.iter().cloned())
            .map(|address| {
                let source = Arc::clone(&self.source);
                async move {
                    match source.lookup(&address).await {
                        Ok(info) => LookupRow::Success(info),
                        Err(e) => {
                            log::warn!("Lookup for {} failed: {}", address, e);
                            LookupRow::Failure {
                                address,
                                reason: e.to_string(),
                            }
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .enumerate();

        let mut count = 0;
        while let Some((index, row)) = rows.next().await {
            on_row(index, row);
            count += 1;
        }
        count
    }

    /// Look up every address and collect the rows
    pub async fn run(&self, addresses: &[String]) -> Result<Vec<LookupRow>, ValidationError> {
        let mut rows = Vec::with_capacity(addresses.len());
        self.run_with(addresses, |_, row| rows.push(row)).await?;
        Ok(rows)
    }
}
