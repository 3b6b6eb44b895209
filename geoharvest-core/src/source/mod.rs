//! Fetch raw records from a remote source.
//!
//! The [`SourceClient`] trait abstracts one remote source. Callers hand it a
//! [`SourceQuery`](crate::SourceQuery) and receive the decoded response body
//! or a [`FetchError`] describing why the round trip failed. Failures are
//! ordinary return values: clients never panic and never retry.

mod client;
mod error;

pub use client::{FetchResult, RawResponse, SourceClient};
pub use error::FetchError;
