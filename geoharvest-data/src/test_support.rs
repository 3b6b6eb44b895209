//! Network-free test doubles.
//!
//! [`StubTransport`] replays scripted responses and records every request,
//! [`StubSourceClient`] replays scripted fetch results for pipeline tests,
//! and [`ManualClock`] lets rate-limiter pacing be checked without sleeping.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use geoharvest_core::{FetchError, FetchResult, RawResponse, SourceClient, SourceKind, SourceQuery};
use serde_json::Value;

use crate::rate_limit::Clock;
use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// Scripted [`Transport`].
///
/// Responses are returned in the order they were pushed. Once the script is
/// exhausted every request fails with [`TransportError::Network`].
///
/// # Example
///
/// ```
/// use geoharvest_data::test_support::StubTransport;
/// use geoharvest_data::transport::{Transport, TransportRequest};
///
/// let transport = StubTransport::new();
/// transport.push_response(200, "[]");
///
/// let response = transport
///     .request(&TransportRequest::get("https://example.org/search").with_param("q", "Ozo g. 25"))
///     .expect("scripted response");
/// assert_eq!(response.body, b"[]");
/// assert_eq!(transport.requests()[0].param("q"), Some("Ozo g. 25"));
/// ```
#[derive(Debug, Default)]
pub struct StubTransport {
    responses: RefCell<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: RefCell<Vec<TransportRequest>>,
}

impl StubTransport {
    /// An empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with `status` and raw `body`.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.responses
            .borrow_mut()
            .push_back(Ok(TransportResponse::new(status, body)));
    }

    /// Queue a 200 response whose body is `value` encoded as JSON.
    pub fn push_json(&self, value: &Value) {
        self.push_response(200, value.to_string());
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Network {
                    url: request.full_url(),
                    message: "no scripted response".to_owned(),
                })
            })
    }
}

/// Scripted [`SourceClient`].
///
/// # Example
///
/// ```
/// use geoharvest_core::{SourceClient, SourceKind, SourceQuery};
/// use geoharvest_data::test_support::StubSourceClient;
/// use serde_json::json;
///
/// let client = StubSourceClient::new(SourceKind::MarkerFeed);
/// client.push_ok(json!({"stations": {}}));
///
/// assert!(client.fetch(&SourceQuery::Feed).is_ok());
/// assert!(client.fetch(&SourceQuery::Feed).is_err());
/// ```
#[derive(Debug)]
pub struct StubSourceClient {
    kind: SourceKind,
    rate_limited: bool,
    results: RefCell<VecDeque<FetchResult>>,
    queries: RefCell<Vec<SourceQuery>>,
    cancel_after: Option<(usize, Arc<AtomicBool>)>,
}

impl StubSourceClient {
    /// Client for `kind`, not rate limited, with an empty script.
    #[must_use]
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            rate_limited: false,
            results: RefCell::new(VecDeque::new()),
            queries: RefCell::new(Vec::new()),
            cancel_after: None,
        }
    }

    /// Report the client as rate limited or not.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limited: bool) -> Self {
        self.rate_limited = rate_limited;
        self
    }

    /// Set `flag` once `calls` fetches have completed.
    #[must_use]
    pub fn with_cancel_after(mut self, calls: usize, flag: Arc<AtomicBool>) -> Self {
        self.cancel_after = Some((calls, flag));
        self
    }

    /// Queue a successful fetch.
    pub fn push_ok(&self, raw: RawResponse) {
        self.results.borrow_mut().push_back(Ok(raw));
    }

    /// Queue a failed fetch.
    pub fn push_err(&self, error: FetchError) {
        self.results.borrow_mut().push_back(Err(error));
    }

    /// Queries received so far, oldest first.
    #[must_use]
    pub fn queries(&self) -> Vec<SourceQuery> {
        self.queries.borrow().clone()
    }
}

impl SourceClient for StubSourceClient {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn rate_limited(&self) -> bool {
        self.rate_limited
    }

    fn fetch(&self, query: &SourceQuery) -> FetchResult {
        self.queries.borrow_mut().push(query.clone());
        if let Some((calls, flag)) = &self.cancel_after
            && self.queries.borrow().len() >= *calls
        {
            flag.store(true, Ordering::SeqCst);
        }
        self.results.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(FetchError::Transport {
                url: "stub://source".to_owned(),
                message: "no scripted result".to_owned(),
            })
        })
    }
}

/// Deterministic [`Clock`] whose `sleep` advances time instantly.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
    sleeps: RefCell<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Clock starting at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Every sleep requested so far.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    /// Total time spent sleeping.
    #[must_use]
    pub fn slept(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}
