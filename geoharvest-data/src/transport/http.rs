//! `reqwest`-backed [`Transport`].
//!
//! The [`Transport`] trait is synchronous so the pipeline can stay a plain
//! sequential loop. [`HttpTransport`] bridges to the async client by
//! blocking on a Tokio runtime it owns.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderName, HeaderValue};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::{ClientBuildError, Transport, TransportError, TransportRequest, TransportResponse};

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "geoharvest/0.1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Connect and overall request timeout.
    pub timeout: Duration,
    /// User agent used when a request does not set its own.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpTransportConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Blocking HTTP transport.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the transport drives requests on its own
/// `current_thread` runtime. Inside a multi-threaded runtime it borrows that
/// runtime's handle through [`tokio::task::block_in_place`]. Inside a
/// `current_thread` runtime it falls back to its own runtime, which may
/// deadlock if the caller's runtime drives IO this request depends on.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a transport with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    async fn send_async(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let url = request.full_url();
        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .query(request.query());
        for (name, value) in request.headers() {
            let header = HeaderName::try_from(name.as_str())
                .map_err(|err| network_error(&url, &err))?;
            let header_value =
                HeaderValue::try_from(value.as_str()).map_err(|err| network_error(&url, &err))?;
            builder = builder.header(header, header_value);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        log::debug!("{} {url} -> {status} ({} bytes)", request.method(), body.len());
        Ok(TransportResponse::new(status, body.to_vec()))
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        network_error(url, error)
    }
}

fn network_error(url: &str, error: &dyn std::fmt::Display) -> TransportError {
    TransportError::Network {
        url: url.to_owned(),
        message: error.to_string(),
    }
}

impl Transport for HttpTransport {
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let future = self.send_async(request);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}
