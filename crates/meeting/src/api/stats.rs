//! Request-level statistics
//!
//! Counters owned by exactly one request executor. The invariant
//! `successful + failed <= total` holds at all times; a request in flight
//! has not yet been routed to either bucket.

use serde::Serialize;

/// Running counters for one executor instance
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RequestStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub retries: u64,
    /// Cumulative wall-clock time spent in transport calls
    pub total_response_time_ms: f64,
}

impl RequestStats {
    pub fn record_success(&mut self, elapsed_ms: f64) {
        self.total_requests += 1;
        self.successful_requests += 1;
        self.total_response_time_ms += elapsed_ms;
    }

    pub fn record_failure(&mut self, elapsed_ms: f64) {
        self.total_requests += 1;
        self.failed_requests += 1;
        self.total_response_time_ms += elapsed_ms;
    }

    pub fn record_retry(&mut self) {
        self.retries += 1;
    }

    /// Successful requests as a percentage of all requests; 0 when none yet
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }

    /// Mean transport time per request in milliseconds; 0 when none yet
    pub fn average_response_time_ms(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.total_response_time_ms / self.total_requests as f64
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) -> RequestStatsReport {
        RequestStatsReport {
            total_requests: self.total_requests,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            retries: self.retries,
            success_rate: self.success_rate(),
            average_response_time_ms: self.average_response_time_ms(),
        }
    }
}

/// Plain snapshot for callers/UI
#[derive(Debug, Clone, Serialize)]
pub struct RequestStatsReport {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub retries: u64,
    pub success_rate: f64,
    pub average_response_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_stay_consistent() {
        let mut stats = RequestStats::default();
        stats.record_success(12.0);
        stats.record_failure(30.0);
        stats.record_success(8.0);

        assert_eq!(stats.total_requests, 3);
        assert_eq!(
            stats.successful_requests + stats.failed_requests,
            stats.total_requests
        );
        assert_eq!(stats.total_response_time_ms, 50.0);
    }

    #[test]
    fn test_rates_with_no_requests() {
        let stats = RequestStats::default();
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.average_response_time_ms(), 0.0);
    }

    #[test]
    fn test_success_rate() {
        let mut stats = RequestStats::default();
        stats.record_success(1.0);
        stats.record_success(1.0);
        stats.record_failure(1.0);
        stats.record_success(1.0);
        assert_eq!(stats.success_rate(), 75.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut stats = RequestStats::default();
        stats.record_success(5.0);
        stats.record_retry();

        stats.reset();
        let once = stats.clone();
        stats.reset();

        assert_eq!(stats, once);
        assert_eq!(stats, RequestStats::default());
    }
}
