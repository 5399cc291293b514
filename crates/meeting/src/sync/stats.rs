//! Cumulative sync statistics and derived-rate calculators
//!
//! The calculators are pure functions so they can be tested without an
//! engine or a clock.

use serde::Serialize;

/// Counters accumulated across runs; monotonically non-decreasing except
/// `last_sync_duration_secs`, which is overwritten each run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncStatistics {
    pub total_syncs: u64,
    pub successful_syncs: u64,
    pub failed_syncs: u64,
    pub items_synced: u64,
    pub errors_encountered: u64,
    pub last_sync_duration_secs: f64,
}

impl SyncStatistics {
    /// Record a run that reached a completed state. A run is successful
    /// only when it accumulated no errors.
    pub fn record_completed(&mut self, items: u64, errors: u64, duration_secs: f64) {
        self.total_syncs += 1;
        if errors == 0 {
            self.successful_syncs += 1;
        }
        self.items_synced += items;
        self.errors_encountered += errors;
        self.last_sync_duration_secs = duration_secs;
    }

    /// Record a run that transitioned to Failed
    pub fn record_failed(&mut self) {
        self.total_syncs += 1;
        self.failed_syncs += 1;
    }

    pub fn report(&self) -> SyncStatisticsReport {
        SyncStatisticsReport {
            total_syncs: self.total_syncs,
            successful_syncs: self.successful_syncs,
            failed_syncs: self.failed_syncs,
            items_synced: self.items_synced,
            errors_encountered: self.errors_encountered,
            last_sync_duration_secs: self.last_sync_duration_secs,
            success_rate: success_rate(self.successful_syncs, self.total_syncs),
            average_duration_secs: average_duration_secs(
                self.last_sync_duration_secs,
                self.successful_syncs,
            ),
        }
    }
}

/// Plain snapshot for callers/UI
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatisticsReport {
    pub total_syncs: u64,
    pub successful_syncs: u64,
    pub failed_syncs: u64,
    pub items_synced: u64,
    pub errors_encountered: u64,
    pub last_sync_duration_secs: f64,
    pub success_rate: f64,
    pub average_duration_secs: f64,
}

/// Successful runs as a percentage of all runs; 0 when nothing has run
pub fn success_rate(successful: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    successful as f64 / total as f64 * 100.0
}

/// Last run duration spread over successful runs; 0 when none succeeded
pub fn average_duration_secs(last_duration_secs: f64, successful: u64) -> f64 {
    if successful == 0 {
        return 0.0;
    }
    last_duration_secs / successful as f64
}

/// Estimated seconds remaining given `progress` percent after
/// `elapsed_secs` of work. 0 when progress or the observed rate is 0.
pub fn estimate_remaining_secs(progress: u8, elapsed_secs: f64) -> f64 {
    if progress == 0 || elapsed_secs <= 0.0 {
        return 0.0;
    }
    let rate = f64::from(progress) / elapsed_secs;
    if rate == 0.0 {
        return 0.0;
    }
    (100.0 - f64::from(progress)) / rate
}
