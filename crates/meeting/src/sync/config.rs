//! Sync configuration with atomic patch validation
//!
//! A patch is validated as a whole against a candidate copy; an invalid
//! patch never partially applies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domains::SyncDomain;

use super::SyncError;

/// Floor for the auto-sync interval
pub const MIN_SYNC_INTERVAL_SECS: u64 = 60;

/// Live configuration of a sync engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfiguration {
    pub auto_sync: bool,
    pub sync_interval_secs: u64,
    /// Entity domains a full sync pulls; webhook events are always pulled
    pub sync_types: Vec<SyncDomain>,
    pub batch_size: usize,
    pub retry_attempts: u32,
    pub timeout_secs: u64,
    pub parallel_sync: bool,
}

impl Default for SyncConfiguration {
    fn default() -> Self {
        Self {
            auto_sync: false,
            sync_interval_secs: 300,
            sync_types: SyncDomain::CONFIGURABLE.to_vec(),
            batch_size: 100,
            retry_attempts: 3,
            timeout_secs: 30,
            parallel_sync: false,
        }
    }
}

impl SyncConfiguration {
    /// Validate `patch` against this configuration and return the merged
    /// result. `self` is untouched; later keys override earlier values.
    pub fn merged(&self, patch: &Map<String, Value>) -> Result<SyncConfiguration, SyncError> {
        let mut next = self.clone();
        for (key, value) in patch {
            match key.as_str() {
                "auto_sync" => next.auto_sync = expect_bool(key, value)?,
                "sync_interval_secs" => {
                    let interval = expect_u64(key, value)?;
                    if interval < MIN_SYNC_INTERVAL_SECS {
                        return Err(SyncError::Config(format!(
                            "sync_interval_secs must be at least {MIN_SYNC_INTERVAL_SECS}, got {interval}"
                        )));
                    }
                    next.sync_interval_secs = interval;
                }
                "sync_types" => next.sync_types = expect_sync_types(value)?,
                "batch_size" => next.batch_size = expect_u64(key, value)? as usize,
                "retry_attempts" => next.retry_attempts = expect_u64(key, value)? as u32,
                "timeout_secs" => next.timeout_secs = expect_u64(key, value)?,
                "parallel_sync" => next.parallel_sync = expect_bool(key, value)?,
                other => {
                    return Err(SyncError::Config(format!("unknown key: {other}")));
                }
            }
        }
        Ok(next)
    }

    /// Tasks a full sync runs, in the fixed domain order. Webhook events are
    /// not a configurable entity domain and are always included.
    pub fn selected_tasks(&self) -> Vec<SyncDomain> {
        SyncDomain::ALL
            .into_iter()
            .filter(|d| *d == SyncDomain::WebhookEvents || self.sync_types.contains(d))
            .collect()
    }
}

fn expect_bool(key: &str, value: &Value) -> Result<bool, SyncError> {
    value
        .as_bool()
        .ok_or_else(|| SyncError::Config(format!("{key} must be a boolean")))
}

fn expect_u64(key: &str, value: &Value) -> Result<u64, SyncError> {
    value
        .as_u64()
        .ok_or_else(|| SyncError::Config(format!("{key} must be a non-negative integer")))
}

fn expect_sync_types(value: &Value) -> Result<Vec<SyncDomain>, SyncError> {
    let entries = value
        .as_array()
        .ok_or_else(|| SyncError::Config("sync_types must be an array".to_string()))?;
    let mut types = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry
            .as_str()
            .ok_or_else(|| SyncError::Config("sync_types entries must be strings".to_string()))?;
        let domain = SyncDomain::parse(name)
            .filter(|d| SyncDomain::CONFIGURABLE.contains(d))
            .ok_or_else(|| SyncError::Config(format!("unknown sync type: {name}")))?;
        if !types.contains(&domain) {
            types.push(domain);
        }
    }
    Ok(types)
}
