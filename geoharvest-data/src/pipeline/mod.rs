//! Pipeline orchestrator: fetch, normalize, filter.
//!
//! A [`Pipeline`] drives one [`SourceClient`] over a list of queries strictly
//! in sequence. Rate-limited clients get a [`RateLimiter`] slot ahead of
//! every call after the first. A failed item is recorded and the run moves
//! on; only configuration problems detected before the first fetch abort a
//! run. The optional bounding box is applied once, after all items finish.
//!
//! Cancellation is cooperative: the shared flag is checked at each `Pending`
//! boundary, so an in-flight request always completes.

mod report;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use geoharvest_core::{
    AddressQuery, BoundingBox, ConfigurationError, FeatureCollection, SourceClient, SourceKind,
    SourceQuery,
};
use log::{debug, info, warn};

use crate::normalize::normalize;
use crate::rate_limit::{Clock, DEFAULT_MIN_INTERVAL, RateLimiter, SystemClock};

pub use report::{FailureRecord, ItemFailure, ItemReport, ItemState, RunOutcome, RunSummary};

/// Run-level settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Spacing between calls to rate-limited sources.
    pub min_interval: Duration,
    /// Keep only features inside this box, when set.
    pub bbox: Option<BoundingBox>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            bbox: None,
        }
    }
}

impl PipelineConfig {
    /// Set the minimum interval between rate-limited calls.
    #[must_use]
    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Set or clear the bounding-box filter.
    #[must_use]
    pub const fn with_bbox(mut self, bbox: Option<BoundingBox>) -> Self {
        self.bbox = bbox;
        self
    }
}

/// Sequential fetch/normalize/filter driver.
///
/// # Examples
/// ```
/// use geoharvest_core::SourceQuery;
/// use geoharvest_data::pipeline::{Pipeline, PipelineConfig};
/// use geoharvest_data::sources::{MarkerFeedClient, MarkerFeedConfig};
/// use geoharvest_data::test_support::StubTransport;
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = StubTransport::new();
/// transport.push_json(&json!({"stations": {"1": {
///     "StationId": 1, "Lat": 54.7, "Lon": 25.3, "Status": 1,
///     "status_name": "Available", "status_timestamp": null
/// }}}));
/// let client = MarkerFeedClient::new(&transport, MarkerFeedConfig::default())?;
///
/// let outcome = Pipeline::new(PipelineConfig::default()).run_single(&client, SourceQuery::Feed)?;
/// assert_eq!(outcome.summary.succeeded, 1);
/// assert_eq!(outcome.features.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline<C = SystemClock> {
    config: PipelineConfig,
    clock: C,
    cancel: Option<Arc<AtomicBool>>,
}

impl Pipeline {
    /// Pipeline on the system clock.
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Pipeline<C> {
    /// Pipeline on an explicit clock.
    #[must_use]
    pub const fn with_clock(config: PipelineConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            cancel: None,
        }
    }

    /// Stop at the next `Pending` boundary once `flag` is set.
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Geocode `addresses` in order, one request per address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyQueryList`] for an empty list and
    /// [`ConfigurationError::EmptyAddress`] for a blank entry, before any
    /// request is made.
    pub fn geocode_addresses<S, A>(
        &self,
        client: &S,
        addresses: &[A],
    ) -> Result<RunOutcome, ConfigurationError>
    where
        S: SourceClient + ?Sized,
        A: AsRef<str>,
    {
        let queries = addresses
            .iter()
            .enumerate()
            .map(|(index, address)| {
                AddressQuery::new(address.as_ref())
                    .map(SourceQuery::from)
                    .map_err(|_| ConfigurationError::EmptyAddress { index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.run(client, queries)
    }

    /// Run a single query, e.g. a feed download or one layer query.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::QueryMismatch`] when the query does not
    /// belong to `client`'s source.
    pub fn run_single<S>(
        &self,
        client: &S,
        query: SourceQuery,
    ) -> Result<RunOutcome, ConfigurationError>
    where
        S: SourceClient + ?Sized,
    {
        self.run(client, vec![query])
    }

    /// Fetch and normalize every query in order, then apply the filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyQueryList`] when `queries` is empty
    /// and [`ConfigurationError::QueryMismatch`] when any query belongs to a
    /// different source than `client`. Per-item failures are reported in the
    /// outcome instead.
    pub fn run<S>(
        &self,
        client: &S,
        queries: Vec<SourceQuery>,
    ) -> Result<RunOutcome, ConfigurationError>
    where
        S: SourceClient + ?Sized,
    {
        let kind = client.kind();
        validate_queries(kind, &queries)?;
        info!("starting {kind} run with {} queries", queries.len());

        let mut limiter = client
            .rate_limited()
            .then(|| RateLimiter::with_clock(self.config.min_interval, &self.clock));
        let mut features = FeatureCollection::new();
        let mut items: Vec<ItemReport> = queries
            .iter()
            .enumerate()
            .map(|(index, query)| ItemReport::pending(index, query.label()))
            .collect();
        let mut cancelled = false;

        for (query, item) in queries.iter().zip(items.iter_mut()) {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }
            self.process(client, limiter.as_mut(), query, item, &mut features);
        }

        let filtered_out = match &self.config.bbox {
            Some(bbox) => {
                let removed = features.retain_within(bbox);
                debug!("bounding box {bbox} removed {removed} features");
                removed
            }
            None => 0,
        };

        let mut summary = RunSummary::from_items(&items);
        summary.cancelled = cancelled;
        summary.filtered_out = filtered_out;
        summary.emitted = features.len();
        if cancelled {
            warn!(
                "run cancelled with {} queries not attempted",
                summary.not_attempted
            );
        }
        info!(
            "{kind} run finished: {} attempted, {} succeeded, {} failed, {} features emitted",
            summary.attempted, summary.succeeded, summary.failed, summary.emitted
        );
        Ok(RunOutcome {
            features,
            summary,
            items,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn process<S, L>(
        &self,
        client: &S,
        limiter: Option<&mut RateLimiter<L>>,
        query: &SourceQuery,
        item: &mut ItemReport,
        features: &mut FeatureCollection,
    ) where
        S: SourceClient + ?Sized,
        L: Clock,
    {
        transition(item, ItemState::Fetching);
        if let Some(limiter) = limiter {
            limiter.await_slot();
        }
        let raw = match client.fetch(query) {
            Ok(raw) => raw,
            Err(error) => {
                fail(item, ItemFailure::Fetch(error));
                return;
            }
        };
        transition(item, ItemState::Fetched);

        transition(item, ItemState::Normalizing);
        let normalized = normalize(query, &raw);
        item.skipped_records = normalized.rejected.len();
        for rejected in &normalized.rejected {
            warn!("{}: skipping record: {rejected}", item.label);
        }
        if normalized.is_unusable() {
            if let Some(first) = normalized.rejected.into_iter().next() {
                fail(item, ItemFailure::Unusable(first));
            }
            return;
        }
        if normalized.features.is_empty() && query.kind() == SourceKind::Geocoder {
            fail(item, ItemFailure::NoMatch);
            return;
        }
        item.features = normalized.features.len();
        features.extend(normalized.features);
        transition(item, ItemState::Normalized);
    }
}

fn validate_queries(kind: SourceKind, queries: &[SourceQuery]) -> Result<(), ConfigurationError> {
    if queries.is_empty() {
        return Err(ConfigurationError::EmptyQueryList);
    }
    match queries.iter().find(|query| query.kind() != kind) {
        Some(query) => Err(ConfigurationError::QueryMismatch {
            expected: kind,
            found: query.kind(),
        }),
        None => Ok(()),
    }
}

fn transition(item: &mut ItemReport, next: ItemState) {
    debug!("{}: {:?} -> {next:?}", item.label, item.state);
    item.state = next;
}

fn fail(item: &mut ItemReport, failure: ItemFailure) {
    warn!("{}: failed: {failure}", item.label);
    transition(item, ItemState::Failed);
    item.failure = Some(failure);
}
