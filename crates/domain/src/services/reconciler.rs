//! Offline batch reconciliation.
//!
//! Replays scans a gate device captured without connectivity. Each record is
//! resolved on its own; a failure never aborts the batch. Records are applied
//! in ascending scan time so the earliest admission in a batch wins, and the
//! same conditional write as the online path guards against concurrent
//! admissions. A replayed record is recognised by its exact ticket and scan
//! time, so submitting the same buffer twice changes nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use super::clock::{to_storage_precision, Clock};
use super::store::{EntryLog, StoreError, TicketStore};
use crate::models::{
    Admission, OfflineScanRecord, QrPayload, ReconcileItem, ReconcileReport, StaffIdentity,
    SubmittedScan, SyncReason,
};

/// Reconciles offline scan batches against the ticket store.
pub struct OfflineReconciler {
    tickets: Arc<dyn TicketStore>,
    entries: Arc<dyn EntryLog>,
    clock: Arc<dyn Clock>,
}

impl OfflineReconciler {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        entries: Arc<dyn EntryLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            entries,
            clock,
        }
    }

    /// Resolves every record submitted by `scanner` and reports each one.
    #[instrument(skip_all, fields(staff_id = %scanner.id, batch_size = records.len()))]
    pub async fn reconcile(
        &self,
        records: &[OfflineScanRecord],
        scanner: &StaffIdentity,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        self.reconcile_into(&mut report, records.iter().collect(), scanner)
            .await;
        log_report(&report);
        report
    }

    /// Like [`reconcile`](Self::reconcile) for a batch as it arrived on the
    /// wire. Undecodable records are reported as `invalid record`.
    #[instrument(skip_all, fields(staff_id = %scanner.id, batch_size = submitted.len()))]
    pub async fn reconcile_submitted(
        &self,
        submitted: &[SubmittedScan],
        scanner: &StaffIdentity,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut records = Vec::with_capacity(submitted.len());
        for scan in submitted {
            match scan {
                SubmittedScan::Parsed(record) => records.push(record),
                SubmittedScan::Malformed(_) => {
                    debug!(
                        ticket_identifier = %scan.ticket_identifier(),
                        "Rejecting undecodable offline record"
                    );
                    report.record(ReconcileItem {
                        ticket_identifier: scan.ticket_identifier().to_string(),
                        scanned_at: None,
                        reason: SyncReason::InvalidRecord,
                    });
                }
            }
        }

        self.reconcile_into(&mut report, records, scanner).await;
        log_report(&report);
        report
    }

    async fn reconcile_into(
        &self,
        report: &mut ReconcileReport,
        mut ordered: Vec<&OfflineScanRecord>,
        scanner: &StaffIdentity,
    ) {
        ordered.sort_by_key(|record| record.scanned_at);

        for record in ordered {
            let reason = self.reconcile_record(record, scanner).await;
            report.record(ReconcileItem {
                ticket_identifier: record.ticket_identifier.clone(),
                scanned_at: Some(record.scanned_at),
                reason,
            });
        }
    }

    async fn reconcile_record(
        &self,
        record: &OfflineScanRecord,
        scanner: &StaffIdentity,
    ) -> SyncReason {
        if let Err(e) = record.validate() {
            debug!(error = %e, "Rejecting malformed offline record");
            return SyncReason::InvalidRecord;
        }
        let Some(payload) = QrPayload::parse(&record.ticket_identifier) else {
            return SyncReason::InvalidRecord;
        };
        let qr_id = payload.scan_id();

        let now = to_storage_precision(self.clock.now());
        let scanned_at = to_storage_precision(record.scanned_at);
        if scanned_at > now {
            warn!(
                qr_id = %qr_id,
                scanned_at = %scanned_at,
                server_time = %now,
                "Offline scan time is ahead of server clock"
            );
        }

        match self.apply(qr_id, scanned_at, now, record, scanner).await {
            Ok(reason) => {
                debug!(qr_id = %qr_id, gate = %record.gate_name, reason = %reason, "Offline record resolved");
                reason
            }
            Err(e) => {
                error!(qr_id = %qr_id, error = %e, "Failed to reconcile offline record");
                SyncReason::SyncError
            }
        }
    }

    async fn apply(
        &self,
        qr_id: &str,
        scanned_at: DateTime<Utc>,
        now: DateTime<Utc>,
        record: &OfflineScanRecord,
        scanner: &StaffIdentity,
    ) -> Result<SyncReason, StoreError> {
        let Some(details) = self.tickets.find_by_qr_id(qr_id).await? else {
            return Ok(SyncReason::TicketNotFound);
        };
        if !details.ticket.is_paid() {
            return Ok(SyncReason::TicketNotFound);
        }

        if self
            .entries
            .find_at(details.ticket.id, scanned_at)
            .await?
            .is_some()
        {
            return Ok(SyncReason::AlreadySynced);
        }

        if details.ticket.is_used() {
            // No undo-and-replace, even when this record predates the
            // recorded admission.
            if details.ticket.scanned_at.is_some_and(|t| scanned_at < t) {
                info!(
                    qr_id = %qr_id,
                    scanned_at = %scanned_at,
                    "Offline record predates the recorded admission"
                );
            }
            return Ok(SyncReason::AlreadyUsedElsewhere);
        }

        let admission = Admission {
            ticket_id: details.ticket.id,
            user_id: details.ticket.user_id,
            event_id: details.ticket.event_id,
            scanned_at,
            gate_name: record.gate_name.trim().to_string(),
            scanned_by: scanner.id,
            scanned_offline: true,
            synced_at: Some(now),
            device_info: record.device_info.clone(),
        };

        match self.tickets.admit(&admission).await? {
            Some(_) => Ok(SyncReason::Synced),
            None => Ok(SyncReason::AlreadyUsedElsewhere),
        }
    }
}

fn log_report(report: &ReconcileReport) {
    info!(
        synced = report.synced.len(),
        duplicates = report.duplicates.len(),
        failed = report.failed.len(),
        "Offline batch reconciled"
    );
}
