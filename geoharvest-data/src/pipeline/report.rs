//! Per-item reports and the run summary.

use geoharvest_core::{FeatureCollection, FetchError, NormalizationError};
use serde::Serialize;
use thiserror::Error;

/// Lifecycle of one queued query.
///
/// `Pending -> Fetching -> {Fetched -> Normalizing -> Normalized} | Failed`.
/// `Normalized` and `Failed` are terminal. Items skipped by cancellation stay
/// `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Queued, not yet started.
    Pending,
    /// Request in flight.
    Fetching,
    /// Raw response received.
    Fetched,
    /// Raw response being mapped to features.
    Normalizing,
    /// Finished with usable output.
    Normalized,
    /// Finished without usable output.
    Failed,
}

impl ItemState {
    /// Whether the item has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Normalized | Self::Failed)
    }
}

/// Why an item ended in [`ItemState::Failed`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemFailure {
    /// The source client could not complete the fetch.
    #[error(transparent)]
    Fetch(FetchError),
    /// The geocoder found nothing for the address.
    #[error("no match found")]
    NoMatch,
    /// Every record in the response was rejected.
    #[error(transparent)]
    Unusable(NormalizationError),
}

/// Outcome of one queued query.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    /// Position in the input list.
    pub index: usize,
    /// Human-readable query label.
    pub label: String,
    /// Final state.
    pub state: ItemState,
    /// Features contributed before spatial filtering.
    pub features: usize,
    /// Records dropped during normalization.
    pub skipped_records: usize,
    /// Failure reason when `state` is [`ItemState::Failed`].
    pub failure: Option<ItemFailure>,
}

impl ItemReport {
    pub(super) fn pending(index: usize, label: String) -> Self {
        Self {
            index,
            label,
            state: ItemState::Pending,
            features: 0,
            skipped_records: 0,
            failure: None,
        }
    }
}

/// A failed item as listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Query label.
    pub item: String,
    /// Failure description.
    pub reason: String,
}

/// Aggregate counts for one run.
///
/// `succeeded + failed == attempted` and
/// `attempted + not_attempted` equals the number of queries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    /// Items whose fetch was started.
    pub attempted: usize,
    /// Items that ended [`ItemState::Normalized`].
    pub succeeded: usize,
    /// Items that ended [`ItemState::Failed`].
    pub failed: usize,
    /// Items skipped because the run was cancelled.
    pub not_attempted: usize,
    /// Records dropped during normalization, across all items.
    pub skipped_records: usize,
    /// Features removed by the bounding-box filter.
    pub filtered_out: usize,
    /// Features in the final collection.
    pub emitted: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
    /// Reason for each failed item, in input order.
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    pub(super) fn from_items(items: &[ItemReport]) -> Self {
        let mut summary = Self::default();
        for item in items {
            summary.skipped_records += item.skipped_records;
            match item.state {
                ItemState::Normalized => {
                    summary.attempted += 1;
                    summary.succeeded += 1;
                }
                ItemState::Failed => {
                    summary.attempted += 1;
                    summary.failed += 1;
                    summary.failures.push(FailureRecord {
                        item: item.label.clone(),
                        reason: item
                            .failure
                            .as_ref()
                            .map_or_else(|| "unknown failure".to_owned(), ToString::to_string),
                    });
                }
                _ => summary.not_attempted += 1,
            }
        }
        summary
    }
}

/// Terminal state of a run: the features plus what happened to each item.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Features in fetch/normalize order, already filtered when a box was set.
    pub features: FeatureCollection,
    /// Aggregate counts.
    pub summary: RunSummary,
    /// One report per input query, in input order.
    pub items: Vec<ItemReport>,
}
