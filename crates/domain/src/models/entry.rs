//! Entry log domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded admission through a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub entry_time: DateTime<Utc>,
    pub gate_name: String,
    pub scanned_by: Uuid,
    pub scanned_offline: bool,
    /// Set when the entry reached the server; absent only for legacy rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for the atomic `unused -> used` transition and its entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub gate_name: String,
    pub scanned_by: Uuid,
    pub scanned_offline: bool,
    pub synced_at: Option<DateTime<Utc>>,
    pub device_info: Option<String>,
}

/// Check-in counters for an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStats {
    pub event_id: Uuid,
    pub total_tickets: i64,
    pub checked_in: i64,
    pub online_entries: i64,
    pub offline_entries: i64,
}
