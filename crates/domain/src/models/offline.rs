//! Offline scan batch models.
//!
//! A gate device that loses connectivity keeps scanning into a local buffer
//! and later submits the whole buffer for reconciliation. The report groups
//! each submitted record into `synced`, `duplicates` or `failed` with a reason
//! the device can act on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Upper bound on records accepted in a single sync request.
pub const MAX_OFFLINE_BATCH_SIZE: usize = 500;

/// A scan captured while the device was offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OfflineScanRecord {
    #[validate(custom(function = "shared::validation::validate_ticket_identifier"))]
    #[validate(length(max = 2048, message = "Ticket identifier too long"))]
    pub ticket_identifier: String,

    #[validate(custom(function = "shared::validation::validate_gate_name"))]
    pub gate_name: String,

    /// Device clock time of the scan.
    pub scanned_at: DateTime<Utc>,

    #[validate(custom(function = "shared::validation::validate_device_info"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
}

/// One element of a submitted batch.
///
/// A record whose shape or timestamp cannot be decoded is kept as raw JSON so
/// it can be reported as failed without rejecting the rest of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedScan {
    Parsed(OfflineScanRecord),
    Malformed(serde_json::Value),
}

impl SubmittedScan {
    pub fn record(&self) -> Option<&OfflineScanRecord> {
        match self {
            SubmittedScan::Parsed(record) => Some(record),
            SubmittedScan::Malformed(_) => None,
        }
    }

    /// The identifier the device sent, if any could be read.
    pub fn ticket_identifier(&self) -> &str {
        match self {
            SubmittedScan::Parsed(record) => &record.ticket_identifier,
            SubmittedScan::Malformed(raw) => raw
                .get("ticketIdentifier")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default(),
        }
    }
}

impl From<OfflineScanRecord> for SubmittedScan {
    fn from(record: OfflineScanRecord) -> Self {
        SubmittedScan::Parsed(record)
    }
}

/// Request body for `POST /api/v1/scans/offline-sync`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSyncRequest {
    #[validate(length(min = 1, max = 500, message = "Batch must contain 1-500 scans"))]
    pub offline_scans: Vec<SubmittedScan>,
}

/// Which list of the report an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCategory {
    Synced,
    Duplicate,
    Failed,
}

impl SyncCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncCategory::Synced => "synced",
            SyncCategory::Duplicate => "duplicate",
            SyncCategory::Failed => "failed",
        }
    }
}

/// Per-item reconciliation reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncReason {
    #[serde(rename = "synced")]
    Synced,
    /// The same ticket and scan time were reconciled before.
    #[serde(rename = "already synced")]
    AlreadySynced,
    /// Another admission is authoritative for the ticket.
    #[serde(rename = "already used at different time/location")]
    AlreadyUsedElsewhere,
    #[serde(rename = "ticket not found")]
    TicketNotFound,
    #[serde(rename = "sync error")]
    SyncError,
    #[serde(rename = "invalid record")]
    InvalidRecord,
}

impl SyncReason {
    pub fn category(&self) -> SyncCategory {
        match self {
            SyncReason::Synced => SyncCategory::Synced,
            SyncReason::AlreadySynced | SyncReason::AlreadyUsedElsewhere => {
                SyncCategory::Duplicate
            }
            SyncReason::TicketNotFound | SyncReason::SyncError | SyncReason::InvalidRecord => {
                SyncCategory::Failed
            }
        }
    }
}

impl std::fmt::Display for SyncReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncReason::Synced => write!(f, "synced"),
            SyncReason::AlreadySynced => write!(f, "already synced"),
            SyncReason::AlreadyUsedElsewhere => {
                write!(f, "already used at different time/location")
            }
            SyncReason::TicketNotFound => write!(f, "ticket not found"),
            SyncReason::SyncError => write!(f, "sync error"),
            SyncReason::InvalidRecord => write!(f, "invalid record"),
        }
    }
}

/// One reconciled record, echoed back with the identifier the device sent.
///
/// `scanned_at` is null only for records whose timestamp could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileItem {
    pub ticket_identifier: String,
    pub scanned_at: Option<DateTime<Utc>>,
    pub reason: SyncReason,
}

/// Grouped result of a reconciliation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub synced: Vec<ReconcileItem>,
    pub duplicates: Vec<ReconcileItem>,
    pub failed: Vec<ReconcileItem>,
}

impl ReconcileReport {
    /// Files an item under the list matching its reason.
    pub fn record(&mut self, item: ReconcileItem) {
        match item.reason.category() {
            SyncCategory::Synced => self.synced.push(item),
            SyncCategory::Duplicate => self.duplicates.push(item),
            SyncCategory::Failed => self.failed.push(item),
        }
    }

    pub fn len(&self) -> usize {
        self.synced.len() + self.duplicates.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items the device may drop from its buffer.
    pub fn resolved(&self) -> impl Iterator<Item = &ReconcileItem> {
        self.synced.iter().chain(self.duplicates.iter())
    }
}
