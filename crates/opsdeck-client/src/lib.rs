//! # opsdeck-client - Backend Access
//!
//! Executes operator requests against the remote-operations backend.
//!
//! Depends on [`opsdeck_core`] for request/result types and error handling.
//!
//! ## Public API
//!
//! - [`OperationClient`] - Validates a request, issues one call, classifies
//!   the outcome, and parses the typed result
//! - [`Transport`] - One HTTP exchange; the seam tests replace
//! - [`HttpTransport`] - `reqwest` implementation of [`Transport`]
//! - [`route()`] - Endpoint table per operation kind

pub mod client;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod transport;

pub use client::{route, Method, OperationClient, Route, HEALTH_PATH};
pub use transport::{HttpTransport, LocalTransport, RawResponse, Transport};
