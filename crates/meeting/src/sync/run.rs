//! Sync run state machine
//!
//! One [`SyncRun`] exists per engine. It is created `Idle`, reset to
//! defaults on each start, and never destroyed. Illegal transitions return
//! a typed error and leave the state untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domains::SyncDomain;

use super::SyncError;

/// Lifecycle states of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Paused,
    Completed,
    CompletedWithErrors,
    Failed,
    Cancelled,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Paused => "paused",
            SyncStatus::Completed => "completed",
            SyncStatus::CompletedWithErrors => "completed_with_errors",
            SyncStatus::Failed => "failed",
            SyncStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncStatus::Completed
                | SyncStatus::CompletedWithErrors
                | SyncStatus::Failed
                | SyncStatus::Cancelled
        )
    }
}

/// The single in-memory run owned by a sync engine
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRun {
    pub status: SyncStatus,
    /// 0..=100, recomputed after each processed item
    pub progress: u8,
    pub current_task: Option<SyncDomain>,
    pub paused: bool,
    pub cancelled: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub next_sync_at: Option<DateTime<Utc>>,
}

impl Default for SyncRun {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            progress: 0,
            current_task: None,
            paused: false,
            cancelled: false,
            last_sync_at: None,
            next_sync_at: None,
        }
    }
}

impl SyncRun {
    /// A new run may start from Idle or any completed/failed terminal state.
    /// Cancelled and Paused are not startable; see [`SyncRun::reset`].
    pub fn can_start(&self) -> bool {
        matches!(
            self.status,
            SyncStatus::Idle
                | SyncStatus::Completed
                | SyncStatus::CompletedWithErrors
                | SyncStatus::Failed
        )
    }

    pub fn start(&mut self, task: Option<SyncDomain>) -> Result<(), SyncError> {
        if !self.can_start() {
            return Err(SyncError::IllegalTransition {
                operation: "start_sync",
                from: self.status,
            });
        }
        self.status = SyncStatus::Syncing;
        self.progress = 0;
        self.current_task = task;
        self.paused = false;
        self.cancelled = false;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SyncError> {
        if self.status != SyncStatus::Syncing {
            return Err(SyncError::IllegalTransition {
                operation: "pause_sync",
                from: self.status,
            });
        }
        self.status = SyncStatus::Paused;
        self.paused = true;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SyncError> {
        if self.status != SyncStatus::Paused {
            return Err(SyncError::IllegalTransition {
                operation: "resume_sync",
                from: self.status,
            });
        }
        self.status = SyncStatus::Syncing;
        self.paused = false;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), SyncError> {
        if !matches!(self.status, SyncStatus::Syncing | SyncStatus::Paused) {
            return Err(SyncError::IllegalTransition {
                operation: "cancel_sync",
                from: self.status,
            });
        }
        self.status = SyncStatus::Cancelled;
        self.cancelled = true;
        self.paused = false;
        Ok(())
    }

    pub fn complete(&mut self, had_errors: bool) -> Result<(), SyncError> {
        if self.status != SyncStatus::Syncing {
            return Err(SyncError::IllegalTransition {
                operation: "complete_sync",
                from: self.status,
            });
        }
        self.status = if had_errors {
            SyncStatus::CompletedWithErrors
        } else {
            SyncStatus::Completed
        };
        self.progress = 100;
        self.current_task = None;
        self.last_sync_at = Some(Utc::now());
        Ok(())
    }

    /// An error escaped a whole task. Legal from Paused too: another thread
    /// may pause while the failing pull is still in flight.
    pub fn fail(&mut self) -> Result<(), SyncError> {
        if !matches!(self.status, SyncStatus::Syncing | SyncStatus::Paused) {
            return Err(SyncError::IllegalTransition {
                operation: "fail_sync",
                from: self.status,
            });
        }
        self.status = SyncStatus::Failed;
        self.paused = false;
        Ok(())
    }

    /// Return a terminal run (including Cancelled) to Idle, preserving the
    /// sync timestamps.
    pub fn reset(&mut self) -> Result<(), SyncError> {
        if !self.status.is_terminal() {
            return Err(SyncError::IllegalTransition {
                operation: "reset_sync",
                from: self.status,
            });
        }
        *self = SyncRun {
            last_sync_at: self.last_sync_at,
            next_sync_at: self.next_sync_at,
            ..SyncRun::default()
        };
        Ok(())
    }

    pub fn snapshot(&self) -> SyncStatusReport {
        SyncStatusReport {
            status: self.status,
            progress: self.progress,
            current_task: self.current_task,
            paused: self.paused,
            cancelled: self.cancelled,
            last_sync_at: self.last_sync_at,
            next_sync_at: self.next_sync_at,
        }
    }
}

/// Plain snapshot of the run for callers/UI
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatusReport {
    pub status: SyncStatus,
    pub progress: u8,
    pub current_task: Option<SyncDomain>,
    pub paused: bool,
    pub cancelled: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub next_sync_at: Option<DateTime<Utc>>,
}
