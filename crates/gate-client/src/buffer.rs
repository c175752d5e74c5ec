//! Client-local queue of scans captured while offline.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use domain::models::{
    OfflineScanRecord, OfflineSyncRequest, QrPayload, ReconcileReport, SubmittedScan,
    MAX_OFFLINE_BATCH_SIZE,
};
use serde::{Deserialize, Serialize};

/// Result of queueing a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    /// The same ticket is already waiting to sync; nothing was added.
    AlreadyQueued,
}

/// Pending offline scans, oldest first.
///
/// At most one record is kept per ticket, so a holder re-presenting a code
/// while the device is offline does not produce a second admission claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineBuffer {
    scans: Vec<OfflineScanRecord>,
}

/// Identity used for local duplicate suppression. Structured and bare forms
/// of the same code collapse to one key.
fn ticket_key(identifier: &str) -> String {
    match QrPayload::parse(identifier) {
        Some(payload) => payload.scan_id().to_string(),
        None => identifier.trim().to_string(),
    }
}

impl OfflineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn scans(&self) -> &[OfflineScanRecord] {
        &self.scans
    }

    pub fn contains(&self, identifier: &str) -> bool {
        let key = ticket_key(identifier);
        self.scans
            .iter()
            .any(|scan| ticket_key(&scan.ticket_identifier) == key)
    }

    pub fn enqueue(
        &mut self,
        identifier: &str,
        gate_name: &str,
        scanned_at: DateTime<Utc>,
        device_info: Option<String>,
    ) -> Enqueued {
        if self.contains(identifier) {
            return Enqueued::AlreadyQueued;
        }
        self.scans.push(OfflineScanRecord {
            ticket_identifier: identifier.to_string(),
            gate_name: gate_name.to_string(),
            scanned_at,
            device_info,
        });
        Enqueued::Queued
    }

    /// The oldest pending scans as one sync request, or `None` when empty.
    pub fn to_request(&self) -> Option<OfflineSyncRequest> {
        if self.scans.is_empty() {
            return None;
        }
        Some(OfflineSyncRequest {
            offline_scans: self
                .scans
                .iter()
                .take(MAX_OFFLINE_BATCH_SIZE)
                .cloned()
                .map(SubmittedScan::from)
                .collect(),
        })
    }

    /// Drops every scan the report lists as synced or duplicate. Failed scans
    /// stay queued. Returns how many were removed.
    pub fn acknowledge(&mut self, report: &ReconcileReport) -> usize {
        let resolved: HashSet<(&str, DateTime<Utc>)> = report
            .resolved()
            .filter_map(|item| Some((item.ticket_identifier.as_str(), item.scanned_at?)))
            .collect();

        let before = self.scans.len();
        self.scans.retain(|scan| {
            !resolved.contains(&(scan.ticket_identifier.as_str(), scan.scanned_at))
        });
        before - self.scans.len()
    }
}
