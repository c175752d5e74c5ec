//! Online scan coordination.
//!
//! Decides whether a presented QR code admits its holder. The only write is
//! [`TicketStore::admit`], a conditional `unused -> used` transition. Any
//! number of coordinators may run against the same store; for one ticket,
//! exactly one call can succeed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use super::clock::{to_storage_precision, Clock};
use super::expiry::is_within_window;
use super::store::{EntryLog, StoreError, TicketStore};
use crate::models::{
    Admission, Admitted, PriorAdmission, QrPayload, RepeatedScan, ScanOutcome, ScanRequest,
    StaffIdentity, Ticket,
};

/// Default same-gate re-read suppression window.
pub const DEFAULT_DUPLICATE_WINDOW_SECS: i64 = 60;

/// Errors that prevent a scan from reaching a domain outcome.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coordinates single real-time scans.
pub struct ScanCoordinator {
    tickets: Arc<dyn TicketStore>,
    entries: Arc<dyn EntryLog>,
    clock: Arc<dyn Clock>,
    duplicate_window: Duration,
}

impl ScanCoordinator {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        entries: Arc<dyn EntryLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            entries,
            clock,
            duplicate_window: Duration::seconds(DEFAULT_DUPLICATE_WINDOW_SECS),
        }
    }

    pub fn with_duplicate_window(mut self, window: Duration) -> Self {
        self.duplicate_window = window;
        self
    }

    pub fn duplicate_window(&self) -> Duration {
        self.duplicate_window
    }

    /// Handles one scan by `scanner`.
    #[instrument(skip_all, fields(gate = %request.gate_name.trim(), staff_id = %scanner.id))]
    pub async fn scan(
        &self,
        request: &ScanRequest,
        scanner: &StaffIdentity,
    ) -> Result<ScanOutcome, CheckInError> {
        let gate_name = request.gate_name.trim();

        let Some(payload) = QrPayload::parse(&request.ticket_identifier) else {
            info!(outcome = "invalid", "QR payload carries no scan identifier");
            return Ok(ScanOutcome::Invalid);
        };
        let qr_id = payload.scan_id();

        let Some(details) = self.tickets.find_by_qr_id(qr_id).await? else {
            info!(qr_id = %qr_id, outcome = "invalid", "Unknown ticket");
            return Ok(ScanOutcome::Invalid);
        };
        if !details.ticket.is_paid() {
            info!(
                qr_id = %qr_id,
                payment_status = %details.ticket.payment_status,
                outcome = "invalid",
                "Ticket is not paid"
            );
            return Ok(ScanOutcome::Invalid);
        }

        // The window is checked at full clock precision; only stored times are
        // truncated.
        let clock_now = self.clock.now();
        let now = to_storage_precision(clock_now);

        if details.ticket.is_used() {
            return self.reject_used(&details.ticket, gate_name, now).await;
        }

        if !is_within_window(&details.event.window, clock_now) {
            info!(qr_id = %qr_id, outcome = "expired", "Scan outside event validity window");
            return Ok(ScanOutcome::Expired);
        }

        let admission = Admission {
            ticket_id: details.ticket.id,
            user_id: details.ticket.user_id,
            event_id: details.ticket.event_id,
            scanned_at: now,
            gate_name: gate_name.to_string(),
            scanned_by: scanner.id,
            scanned_offline: request.scanned_offline,
            synced_at: Some(now),
            device_info: request.device_info.clone(),
        };

        match self.tickets.admit(&admission).await? {
            Some(entry) => {
                info!(qr_id = %qr_id, outcome = "success", "Ticket admitted");
                Ok(ScanOutcome::Success(Admitted {
                    ticket_id: details.ticket.id,
                    qr_id: details.ticket.qr_id,
                    user_name: details.holder.name,
                    user_email: details.holder.email,
                    event_name: details.event.name,
                    gate_name: entry.gate_name,
                    scanned_at: entry.entry_time,
                }))
            }
            None => {
                // Lost the conditional write; report the winner.
                let winner = self
                    .tickets
                    .find_by_qr_id(qr_id)
                    .await?
                    .ok_or_else(|| {
                        StoreError::MalformedRow(format!("ticket {qr_id} vanished during admission"))
                    })?;
                self.reject_used(&winner.ticket, gate_name, now).await
            }
        }
    }

    async fn reject_used(
        &self,
        ticket: &Ticket,
        gate_name: &str,
        now: DateTime<Utc>,
    ) -> Result<ScanOutcome, CheckInError> {
        if let Some(entry) = self.entries.latest_at_gate(ticket.id, gate_name).await? {
            if now - entry.entry_time <= self.duplicate_window {
                info!(
                    qr_id = %ticket.qr_id,
                    outcome = "duplicate-scan",
                    original_scan_time = %entry.entry_time,
                    "Repeated scan at the same gate"
                );
                return Ok(ScanOutcome::DuplicateScan(RepeatedScan {
                    original_scan_time: entry.entry_time,
                    gate_name: entry.gate_name,
                }));
            }
        }

        let (Some(original_scan_time), Some(original_gate)) =
            (ticket.scanned_at, ticket.scanned_gate.clone())
        else {
            return Err(StoreError::MalformedRow(format!(
                "used ticket {} has no scan time or gate",
                ticket.id
            ))
            .into());
        };

        info!(
            qr_id = %ticket.qr_id,
            outcome = "already-used",
            original_gate = %original_gate,
            original_scan_time = %original_scan_time,
            "Ticket already used"
        );
        Ok(ScanOutcome::AlreadyUsed(PriorAdmission {
            original_scan_time,
            original_gate,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entry, PaymentStatus, ScanStatus, TicketDetails, ValidityWindow};
    use crate::services::clock::ManualClock;
    use crate::services::fixtures::{at, staff, ticket_details};
    use crate::services::memory_store::InMemoryCheckInStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Harness {
        store: Arc<InMemoryCheckInStore>,
        clock: Arc<ManualClock>,
        coordinator: Arc<ScanCoordinator>,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryCheckInStore::new());
        let clock = Arc::new(ManualClock::new(at(10, 0, 0)));
        let coordinator = Arc::new(ScanCoordinator::new(
            store.clone(),
            store.clone(),
            clock.clone(),
        ));
        Harness {
            store,
            clock,
            coordinator,
        }
    }

    fn request(identifier: &str, gate: &str) -> ScanRequest {
        ScanRequest {
            ticket_identifier: identifier.to_string(),
            gate_name: gate.to_string(),
            scanned_offline: false,
            device_info: None,
        }
    }

    #[tokio::test]
    async fn test_first_scan_admits() {
        let h = harness();
        let details = ticket_details("T1", ValidityWindow::unbounded());
        h.store.insert(details.clone());

        let outcome = h
            .coordinator
            .scan(&request(r#"{"qrId":"T1"}"#, "Gate A"), &staff())
            .await
            .unwrap();

        match outcome {
            ScanOutcome::Success(admitted) => {
                assert_eq!(admitted.ticket_id, details.ticket.id);
                assert_eq!(admitted.user_email, details.holder.email);
                assert_eq!(admitted.event_name, details.event.name);
                assert_eq!(admitted.gate_name, "Gate A");
                assert_eq!(admitted.scanned_at, at(10, 0, 0));
            }
            other => panic!("expected success, got {:?}", other),
        }

        let entries = h.store.entries();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].scanned_offline);
        assert_eq!(entries[0].synced_at, Some(at(10, 0, 0)));
        assert_eq!(h.store.ticket("T1").unwrap().scan_status, ScanStatus::Used);
    }

    #[tokio::test]
    async fn test_gate_scenario_duplicate_then_already_used() {
        let h = harness();
        h.store
            .insert(ticket_details("T", ValidityWindow::unbounded()));
        let scanner = staff();

        let outcome = h.coordinator.scan(&request("T", "Gate A"), &scanner).await.unwrap();
        assert!(outcome.is_success());

        h.clock.set(at(10, 0, 30));
        let outcome = h.coordinator.scan(&request("T", "Gate A"), &scanner).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::DuplicateScan(RepeatedScan {
                original_scan_time: at(10, 0, 0),
                gate_name: "Gate A".to_string(),
            })
        );

        h.clock.set(at(10, 5, 0));
        let outcome = h.coordinator.scan(&request("T", "Gate B"), &scanner).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::AlreadyUsed(PriorAdmission {
                original_scan_time: at(10, 0, 0),
                original_gate: "Gate A".to_string(),
            })
        );
        assert_eq!(h.store.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_window_edges() {
        let h = harness();
        h.store
            .insert(ticket_details("T", ValidityWindow::unbounded()));
        let scanner = staff();
        h.coordinator.scan(&request("T", "Gate A"), &scanner).await.unwrap();

        h.clock.set(at(10, 1, 0));
        let outcome = h.coordinator.scan(&request("T", "Gate A"), &scanner).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::DuplicateScan(_)));

        h.clock.set(at(10, 1, 1));
        let outcome = h.coordinator.scan(&request("T", "Gate A"), &scanner).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::AlreadyUsed(_)));

        h.clock.set(at(10, 0, 10));
        let outcome = h.coordinator.scan(&request("T", "Gate B"), &scanner).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::AlreadyUsed(_)));
    }

    #[tokio::test]
    async fn test_gate_name_is_trimmed() {
        let h = harness();
        h.store
            .insert(ticket_details("T", ValidityWindow::unbounded()));
        let scanner = staff();
        h.coordinator.scan(&request("T", "  Gate A "), &scanner).await.unwrap();

        h.clock.set(at(10, 0, 5));
        let outcome = h.coordinator.scan(&request("T", "Gate A"), &scanner).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::DuplicateScan(_)));
    }

    #[tokio::test]
    async fn test_expiry_boundaries() {
        let h = harness();
        let window = ValidityWindow::new(Some(at(9, 0, 0)), Some(at(18, 0, 0))).unwrap();
        h.store.insert(ticket_details("EARLY", window));
        h.store.insert(ticket_details("START", window));
        h.store.insert(ticket_details("END", window));
        h.store.insert(ticket_details("LATE", window));
        let scanner = staff();

        h.clock.set(at(8, 59, 59));
        let outcome = h.coordinator.scan(&request("EARLY", "Gate A"), &scanner).await.unwrap();
        assert_eq!(outcome, ScanOutcome::Expired);

        h.clock.set(at(9, 0, 0));
        let outcome = h.coordinator.scan(&request("START", "Gate A"), &scanner).await.unwrap();
        assert!(outcome.is_success());

        h.clock.set(at(18, 0, 0));
        let outcome = h.coordinator.scan(&request("END", "Gate A"), &scanner).await.unwrap();
        assert!(outcome.is_success());

        h.clock.set(at(18, 0, 1));
        let outcome = h.coordinator.scan(&request("LATE", "Gate A"), &scanner).await.unwrap();
        assert_eq!(outcome, ScanOutcome::Expired);

        assert_eq!(h.store.ticket("EARLY").unwrap().scan_status, ScanStatus::Unused);
        assert_eq!(h.store.ticket("LATE").unwrap().scan_status, ScanStatus::Unused);
        assert_eq!(h.store.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_sub_microsecond_past_end_is_expired() {
        let h = harness();
        let window = ValidityWindow::new(Some(at(9, 0, 0)), Some(at(18, 0, 0))).unwrap();
        h.store.insert(ticket_details("LATE", window));

        h.clock.set(at(18, 0, 0) + Duration::nanoseconds(1));
        let outcome = h
            .coordinator
            .scan(&request("LATE", "Gate A"), &staff())
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Expired);
        assert_eq!(h.store.ticket("LATE").unwrap().scan_status, ScanStatus::Unused);
        assert!(h.store.entries().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_payloads_and_tickets() {
        let h = harness();
        let mut unpaid = ticket_details("UNPAID", ValidityWindow::unbounded());
        unpaid.ticket.payment_status = PaymentStatus::Pending;
        h.store.insert(unpaid);
        let scanner = staff();

        for identifier in ["MISSING", "{not json", r#"{"name":"x"}"#, "UNPAID"] {
            let outcome = h
                .coordinator
                .scan(&request(identifier, "Gate A"), &scanner)
                .await
                .unwrap();
            assert_eq!(outcome, ScanOutcome::Invalid, "identifier {identifier}");
        }
        assert!(h.store.entries().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let h = harness();
        h.store
            .insert(ticket_details("T", ValidityWindow::unbounded()));
        h.store.fail_ticket("T");

        let result = h.coordinator.scan(&request("T", "Gate A"), &staff()).await;
        assert!(matches!(result, Err(CheckInError::Store(StoreError::Database(_)))));
    }

    #[tokio::test]
    async fn test_offline_flag_and_device_info_recorded() {
        let h = harness();
        h.store
            .insert(ticket_details("T", ValidityWindow::unbounded()));
        let mut req = request("T", "Gate A");
        req.scanned_offline = true;
        req.device_info = Some("handheld-3".to_string());

        h.coordinator.scan(&req, &staff()).await.unwrap();
        let entry = &h.store.entries()[0];
        assert!(entry.scanned_offline);
        assert_eq!(entry.device_info.as_deref(), Some("handheld-3"));
    }

    /// Serves a stale unused snapshot on the first lookup, as a reader that
    /// raced a concurrent admission would see.
    struct StaleFirstRead {
        inner: Arc<InMemoryCheckInStore>,
        snapshot: TicketDetails,
        served: AtomicBool,
    }

    #[async_trait::async_trait]
    impl TicketStore for StaleFirstRead {
        async fn find_by_qr_id(&self, qr_id: &str) -> Result<Option<TicketDetails>, StoreError> {
            if !self.served.swap(true, Ordering::SeqCst) {
                return Ok(Some(self.snapshot.clone()));
            }
            self.inner.find_by_qr_id(qr_id).await
        }

        async fn admit(&self, admission: &Admission) -> Result<Option<Entry>, StoreError> {
            self.inner.admit(admission).await
        }

        async fn reset(&self, qr_id: &str) -> Result<Option<Ticket>, StoreError> {
            self.inner.reset(qr_id).await
        }
    }

    #[tokio::test]
    async fn test_race_loser_reports_winner() {
        let store = Arc::new(InMemoryCheckInStore::new());
        let details = ticket_details("T", ValidityWindow::unbounded());
        store.insert(details.clone());

        let clock = Arc::new(ManualClock::new(at(10, 0, 0)));
        let winner = ScanCoordinator::new(store.clone(), store.clone(), clock.clone());
        winner.scan(&request("T", "Gate A"), &staff()).await.unwrap();

        clock.set(at(10, 0, 1));
        let stale = Arc::new(StaleFirstRead {
            inner: store.clone(),
            snapshot: details,
            served: AtomicBool::new(false),
        });
        let loser = ScanCoordinator::new(stale, store.clone(), clock);
        let outcome = loser.scan(&request("T", "Gate B"), &staff()).await.unwrap();

        assert_eq!(
            outcome,
            ScanOutcome::AlreadyUsed(PriorAdmission {
                original_scan_time: at(10, 0, 0),
                original_gate: "Gate A".to_string(),
            })
        );
        assert_eq!(store.entries().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_scans_admit_exactly_once() {
        let h = harness();
        h.store
            .insert(ticket_details("T", ValidityWindow::unbounded()));

        let mut handles = Vec::new();
        for i in 0..32 {
            let coordinator = h.coordinator.clone();
            let gate = if i % 2 == 0 { "Gate A" } else { "Gate B" };
            let req = request("T", gate);
            handles.push(tokio::spawn(async move {
                coordinator.scan(&req, &staff()).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                ScanOutcome::Success(_) => successes += 1,
                ScanOutcome::AlreadyUsed(_) | ScanOutcome::DuplicateScan(_) => {}
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(h.store.entries().len(), 1);
    }
}
