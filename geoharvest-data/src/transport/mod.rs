//! Transport collaborator used by the source clients.
//!
//! A [`Transport`] performs one request and returns the status and body
//! bytes. It does not interpret status codes: turning a non-2xx status or an
//! undecodable body into a [`geoharvest_core::FetchError`] is the source
//! client's job. Connection failures and timeouts are reported as
//! [`TransportError`].
//!
//! [`HttpTransport`] is the production implementation backed by `reqwest`.
//! Tests substitute [`crate::test_support::StubTransport`].

mod error;
mod http;
mod request;

pub use error::{ClientBuildError, TransportError};
pub use http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpTransport, HttpTransportConfig};
pub use request::{TransportRequest, TransportResponse};

/// Perform a single request/response round trip.
///
/// Implementations never retry.
pub trait Transport {
    /// Send `request` and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response was received.
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).request(request)
    }
}
