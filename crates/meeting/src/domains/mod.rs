//! Domain clients for the meeting platform
//!
//! Every remote entity domain exposes the same narrow contract to the sync
//! engine: list the remote records for one pull. Records are opaque JSON;
//! the engine only reads an `id` and the optional `items`/`errors` summary
//! fields.

mod rest;

pub use rest::RestDomainClient;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiError;

/// Entity domains the platform exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDomain {
    Users,
    Rooms,
    Meetings,
    Recordings,
    WebhookEvents,
}

impl SyncDomain {
    /// Fixed order a full sync walks the domains in
    pub const ALL: [SyncDomain; 5] = [
        SyncDomain::Users,
        SyncDomain::Rooms,
        SyncDomain::Meetings,
        SyncDomain::Recordings,
        SyncDomain::WebhookEvents,
    ];

    /// Domains a caller may select via `sync_types`
    pub const CONFIGURABLE: [SyncDomain; 4] = [
        SyncDomain::Users,
        SyncDomain::Rooms,
        SyncDomain::Meetings,
        SyncDomain::Recordings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDomain::Users => "users",
            SyncDomain::Rooms => "rooms",
            SyncDomain::Meetings => "meetings",
            SyncDomain::Recordings => "recordings",
            SyncDomain::WebhookEvents => "webhook_events",
        }
    }

    pub fn parse(value: &str) -> Option<SyncDomain> {
        SyncDomain::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

impl fmt::Display for SyncDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability contract between the sync engine and one domain
pub trait DomainClient: Send + Sync {
    fn domain(&self) -> SyncDomain;

    /// List the remote records for one sync pull
    fn list_records(&self) -> Result<Vec<Value>, ApiError>;
}
