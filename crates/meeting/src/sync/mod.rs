//! Sync engine for keeping the local view of the platform current
//!
//! This module provides:
//! - The run state machine (idle/syncing/paused/terminal states)
//! - The sync engine that drives domain pulls with pause/resume/cancel
//! - Sync configuration with atomic patch validation
//! - Cumulative statistics and the derived-rate calculators

mod config;
mod engine;
mod run;
mod stats;

pub use config::{MIN_SYNC_INTERVAL_SECS, SyncConfiguration};
pub use engine::{ItemError, RunOutcome, SyncEngine};
pub use run::{SyncRun, SyncStatus, SyncStatusReport};
pub use stats::{
    SyncStatistics, SyncStatisticsReport, average_duration_secs, estimate_remaining_secs,
    success_rate,
};

use thiserror::Error;

use crate::domains::SyncDomain;

/// Failure of a sync-engine operation, tagged with the operation that
/// failed so callers can report it without guessing.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("{operation} is illegal from state {from:?}")]
    IllegalTransition {
        operation: &'static str,
        from: SyncStatus,
    },
    #[error("configure_sync rejected: {0}")]
    Config(String),
    #[error("{task} sync failed: {message}")]
    TaskFailed { task: SyncDomain, message: String },
}

impl SyncError {
    /// The public operation this failure belongs to
    pub fn operation(&self) -> &'static str {
        match self {
            SyncError::IllegalTransition { operation, .. } => operation,
            SyncError::Config(_) => "configure_sync",
            SyncError::TaskFailed { .. } => "sync",
        }
    }
}
