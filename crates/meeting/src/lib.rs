//! Meeting crate - client library for a remote meeting platform
//!
//! This crate keeps a local view of remote meeting-platform entities
//! (meetings, users, rooms, recordings, webhook events) up to date:
//! - Request executor with retry, backoff and per-instance statistics
//! - Narrow transport boundary (HTTP-stack agnostic, mockable)
//! - Domain clients exposing one pull contract per entity domain
//! - Sync engine with an explicit run state machine (pause/resume/cancel),
//!   progress reporting and error aggregation across partial failures
//! - Pure statistics calculators for rates and ETA estimates
//!
//! Persistence of synchronized entities, auth-protocol mechanics and UI
//! are deliberately out of scope; they live with the callers.

pub mod api;
pub mod config;
pub mod domains;
pub mod sync;

pub use api::{
    ApiError, ApiResponse, Credential, Method, MockTransport, RequestExecutor, RequestStats,
    RequestStatsReport, RetryPolicy, Transport, TransportError, TransportRequest,
    TransportResponse, UreqTransport,
};
pub use config::PlatformCredentials;
pub use domains::{DomainClient, RestDomainClient, SyncDomain};
pub use sync::{
    // Engine and run lifecycle
    ItemError, RunOutcome, SyncEngine, SyncError, SyncRun, SyncStatus, SyncStatusReport,
    // Configuration
    MIN_SYNC_INTERVAL_SECS, SyncConfiguration,
    // Statistics (cumulative counters and pure calculators)
    SyncStatistics, SyncStatisticsReport, average_duration_secs, estimate_remaining_secs,
    success_rate,
};
