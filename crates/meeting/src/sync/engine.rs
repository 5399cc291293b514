//! Sync engine: drives domain pulls through the run state machine
//!
//! A run executes synchronously on the calling thread. `pause`, `resume`
//! and `cancel` may be called from other threads: the cancelled flag is
//! checked before each task, and a paused run blocks on a condvar at the
//! task boundary until it is resumed or cancelled.
//!
//! A single bad record never aborts its batch; per-item failures are
//! collected into the run's error list. An error escaping a whole task
//! transitions the run to Failed.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Utc};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::ApiError;
use crate::domains::{DomainClient, SyncDomain};

use super::SyncError;
use super::config::SyncConfiguration;
use super::run::{SyncRun, SyncStatus, SyncStatusReport};
use super::stats::{SyncStatistics, SyncStatisticsReport};

/// One per-item failure recorded during a pull
#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub domain: SyncDomain,
    pub record_id: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "{} record {}: {}", self.domain, id, self.message),
            None => write!(f, "{} record: {}", self.domain, self.message),
        }
    }
}

/// Aggregated outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: SyncStatus,
    pub items_synced: u64,
    pub errors: Vec<ItemError>,
    pub duration_secs: f64,
}

/// Owns the single run, the live configuration and the cumulative
/// statistics. Exactly one run is active at a time; starting while not
/// startable fails fast instead of queueing.
pub struct SyncEngine {
    clients: Vec<Arc<dyn DomainClient>>,
    run: Mutex<SyncRun>,
    wake: Condvar,
    config: Mutex<SyncConfiguration>,
    stats: Mutex<SyncStatistics>,
}

impl SyncEngine {
    pub fn new(clients: Vec<Arc<dyn DomainClient>>) -> Self {
        Self::with_configuration(clients, SyncConfiguration::default())
    }

    pub fn with_configuration(
        clients: Vec<Arc<dyn DomainClient>>,
        config: SyncConfiguration,
    ) -> Self {
        Self {
            clients,
            run: Mutex::new(SyncRun::default()),
            wake: Condvar::new(),
            config: Mutex::new(config),
            stats: Mutex::new(SyncStatistics::default()),
        }
    }

    fn run_guard(&self) -> MutexGuard<'_, SyncRun> {
        self.run.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn config_guard(&self) -> MutexGuard<'_, SyncConfiguration> {
        self.config.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stats_guard(&self) -> MutexGuard<'_, SyncStatistics> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Control surface ===

    pub fn can_start(&self) -> bool {
        self.run_guard().can_start()
    }

    pub fn pause(&self) -> Result<(), SyncError> {
        self.run_guard().pause()?;
        info!("sync paused");
        Ok(())
    }

    pub fn resume(&self) -> Result<(), SyncError> {
        self.run_guard().resume()?;
        self.wake.notify_all();
        info!("sync resumed");
        Ok(())
    }

    pub fn cancel(&self) -> Result<(), SyncError> {
        self.run_guard().cancel()?;
        self.wake.notify_all();
        info!("sync cancelled");
        Ok(())
    }

    /// Return a terminal run (including Cancelled) to Idle. Cumulative
    /// statistics are left intact.
    pub fn reset(&self) -> Result<(), SyncError> {
        self.run_guard().reset()
    }

    // === Reporting ===

    pub fn status(&self) -> SyncStatusReport {
        self.run_guard().snapshot()
    }

    pub fn progress(&self) -> u8 {
        self.run_guard().progress
    }

    pub fn statistics(&self) -> SyncStatisticsReport {
        self.stats_guard().report()
    }

    pub fn configuration(&self) -> SyncConfiguration {
        self.config_guard().clone()
    }

    // === Configuration ===

    /// Validate and merge a configuration patch. An invalid patch leaves
    /// the live configuration completely unchanged.
    pub fn configure(&self, patch: &Map<String, Value>) -> Result<(), SyncError> {
        let (auto_sync, interval) = {
            let mut config = self.config_guard();
            let next = config.merged(patch)?;
            *config = next;
            (config.auto_sync, config.sync_interval_secs)
        };
        if auto_sync {
            self.run_guard().next_sync_at =
                Some(Utc::now() + ChronoDuration::seconds(interval as i64));
        }
        info!("sync configuration updated ({} keys)", patch.len());
        Ok(())
    }

    // === Runs ===

    /// Run every selected domain pull in the fixed order
    pub fn sync_all(&self) -> Result<RunOutcome, SyncError> {
        let tasks = self.config_guard().selected_tasks();
        self.run_tasks(None, &tasks)
    }

    /// Run one domain pull through the same envelope
    pub fn sync_domain(&self, domain: SyncDomain) -> Result<RunOutcome, SyncError> {
        self.run_tasks(Some(domain), &[domain])
    }

    fn client_for(&self, domain: SyncDomain) -> Option<Arc<dyn DomainClient>> {
        self.clients.iter().find(|c| c.domain() == domain).cloned()
    }

    fn run_tasks(
        &self,
        label: Option<SyncDomain>,
        tasks: &[SyncDomain],
    ) -> Result<RunOutcome, SyncError> {
        self.run_guard().start(label)?;
        let started = Instant::now();
        info!("sync run started ({} tasks)", tasks.len());

        let parallel = self.config_guard().parallel_sync;
        let mut prefetched: HashMap<SyncDomain, Result<Vec<Value>, ApiError>> =
            if parallel && tasks.len() > 1 {
                let selected: Vec<Arc<dyn DomainClient>> = tasks
                    .iter()
                    .filter_map(|domain| self.client_for(*domain))
                    .collect();
                selected
                    .par_iter()
                    .map(|client| (client.domain(), client.list_records()))
                    .collect()
            } else {
                HashMap::new()
            };

        let mut items_total: u64 = 0;
        let mut errors: Vec<ItemError> = Vec::new();

        for &domain in tasks {
            if !self.wait_if_paused() {
                info!("sync run cancelled before {domain}");
                break;
            }
            let Some(client) = self.client_for(domain) else {
                warn!("no client registered for {domain}, skipping");
                continue;
            };
            {
                let mut run = self.run_guard();
                run.current_task = Some(domain);
                run.progress = 0;
            }

            let listed = match prefetched.remove(&domain) {
                Some(result) => result,
                None => client.list_records(),
            };
            let records = match listed {
                Ok(records) => records,
                Err(err) => {
                    let message = err.to_string();
                    error!("{domain} sync failed: {message}");
                    // The run may already be Cancelled if another thread
                    // cancelled while the pull was in flight
                    if self.run_guard().fail().is_ok() {
                        self.stats_guard().record_failed();
                    }
                    return Err(SyncError::TaskFailed {
                        task: domain,
                        message,
                    });
                }
            };

            let (count, mut task_errors) = self.process_records(domain, &records);
            info!("{domain}: {count} items, {} errors", task_errors.len());
            items_total += count;
            errors.append(&mut task_errors);
        }

        let duration_secs = started.elapsed().as_secs_f64();
        let (auto_sync, interval) = {
            let config = self.config_guard();
            (config.auto_sync, config.sync_interval_secs)
        };

        // Finalize under one guard so a pause or cancel landing after the
        // final task is still honored, and completion cannot race them
        let status = {
            let mut run = self.run_guard();
            while run.paused && !run.cancelled {
                run = self.wake.wait(run).unwrap_or_else(|e| e.into_inner());
            }
            if run.cancelled {
                info!("sync run cancelled after {items_total} items in {duration_secs:.1}s");
                return Ok(RunOutcome {
                    status: SyncStatus::Cancelled,
                    items_synced: items_total,
                    errors,
                    duration_secs,
                });
            }
            run.complete(!errors.is_empty())?;
            if auto_sync {
                run.next_sync_at = Some(Utc::now() + ChronoDuration::seconds(interval as i64));
            }
            run.status
        };
        self.stats_guard()
            .record_completed(items_total, errors.len() as u64, duration_secs);
        info!(
            "sync run {}: {items_total} items, {} errors in {duration_secs:.1}s",
            status.as_str(),
            errors.len()
        );

        Ok(RunOutcome {
            status,
            items_synced: items_total,
            errors,
            duration_secs,
        })
    }

    /// Block while the run is paused. Returns false if it was cancelled.
    fn wait_if_paused(&self) -> bool {
        let mut run = self.run_guard();
        while run.paused && !run.cancelled {
            run = self.wake.wait(run).unwrap_or_else(|e| e.into_inner());
        }
        !run.cancelled
    }

    /// Process one batch of records, recomputing progress after each item.
    fn process_records(&self, domain: SyncDomain, records: &[Value]) -> (u64, Vec<ItemError>) {
        let total = records.len().max(1);
        let mut count: u64 = 0;
        let mut errors = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match process_record(domain, record) {
                Ok(items) => count += items,
                Err(item_error) => {
                    warn!("{item_error}");
                    errors.push(item_error);
                }
            }
            let progress = ((index + 1) * 100 / total) as u8;
            self.run_guard().progress = progress;
        }

        (count, errors)
    }
}

/// Process one remote record: read its id and honor the optional
/// `items`/`errors` summary fields the platform may attach.
fn process_record(domain: SyncDomain, record: &Value) -> Result<u64, ItemError> {
    let map = record.as_object().ok_or_else(|| ItemError {
        domain,
        record_id: None,
        message: "record is not an object".to_string(),
    })?;

    let record_id = match map.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(ItemError {
                domain,
                record_id: None,
                message: "record has no id".to_string(),
            });
        }
    };

    if let Some(Value::Array(reported)) = map.get("errors") {
        if !reported.is_empty() {
            let message = reported
                .iter()
                .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ItemError {
                domain,
                record_id: Some(record_id),
                message,
            });
        }
    }

    let items = map.get("items").and_then(Value::as_u64).unwrap_or(1);
    debug!("{domain} record {record_id} processed ({items} items)");
    Ok(items)
}
