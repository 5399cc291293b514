//! Meeting-platform API plumbing
//!
//! This module provides:
//! - The narrow transport boundary over the HTTP stack
//! - A request executor with retry, backoff and per-instance statistics
//! - The typed error taxonomy surfaced to callers

mod error;
mod executor;
mod stats;
mod transport;

pub use error::ApiError;
pub use executor::{ApiResponse, Credential, RequestExecutor, RetryPolicy};
pub use stats::{RequestStats, RequestStatsReport};
pub use transport::{
    Method, MockTransport, Transport, TransportError, TransportRequest, TransportResponse,
    UreqTransport,
};
