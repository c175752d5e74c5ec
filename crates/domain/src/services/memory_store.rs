//! In-memory ticket store and entry log.
//!
//! One mutex guards tickets and entries together, so the conditional
//! `unused -> used` write and the entry append are a single step, the same
//! guarantee the PostgreSQL transaction gives.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::store::{EntryLog, StoreError, TicketStore};
use crate::models::{
    Admission, CheckInStats, Entry, EventSummary, ScanStatus, Ticket, TicketDetails, TicketHolder,
};

#[derive(Debug, Default)]
struct Inner {
    tickets: HashMap<String, Ticket>,
    events: HashMap<Uuid, EventSummary>,
    holders: HashMap<Uuid, TicketHolder>,
    entries: Vec<Entry>,
    failing: HashSet<String>,
}

impl Inner {
    fn check_available(&self, qr_id: &str) -> Result<(), StoreError> {
        if self.failing.contains(qr_id) {
            return Err(StoreError::Database(format!(
                "simulated failure for ticket {qr_id}"
            )));
        }
        Ok(())
    }

    fn qr_id_of(&self, ticket_id: Uuid) -> Option<&str> {
        self.tickets
            .values()
            .find(|t| t.id == ticket_id)
            .map(|t| t.qr_id.as_str())
    }

    fn check_ticket_available(&self, ticket_id: Uuid) -> Result<(), StoreError> {
        match self.qr_id_of(ticket_id) {
            Some(qr_id) => self.check_available(qr_id),
            None => Ok(()),
        }
    }
}

/// Ticket store and entry log held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCheckInStore {
    inner: Mutex<Inner>,
}

impl InMemoryCheckInStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds a ticket together with its event and holder.
    pub fn insert(&self, details: TicketDetails) {
        let mut inner = self.lock();
        inner.events.insert(details.event.id, details.event);
        inner.holders.insert(details.holder.id, details.holder);
        inner
            .tickets
            .insert(details.ticket.qr_id.clone(), details.ticket);
    }

    /// Current state of a ticket.
    pub fn ticket(&self, qr_id: &str) -> Option<Ticket> {
        self.lock().tickets.get(qr_id).cloned()
    }

    /// Every entry recorded, in insertion order.
    pub fn entries(&self) -> Vec<Entry> {
        self.lock().entries.clone()
    }

    /// Makes every operation touching this ticket fail with a database error.
    pub fn fail_ticket(&self, qr_id: &str) {
        self.lock().failing.insert(qr_id.to_string());
    }
}

#[async_trait::async_trait]
impl TicketStore for InMemoryCheckInStore {
    async fn find_by_qr_id(&self, qr_id: &str) -> Result<Option<TicketDetails>, StoreError> {
        let inner = self.lock();
        inner.check_available(qr_id)?;

        let Some(ticket) = inner.tickets.get(qr_id) else {
            return Ok(None);
        };
        let event = inner.events.get(&ticket.event_id).cloned().ok_or_else(|| {
            StoreError::MalformedRow(format!("ticket {} has no event", ticket.id))
        })?;
        let holder = inner.holders.get(&ticket.user_id).cloned().ok_or_else(|| {
            StoreError::MalformedRow(format!("ticket {} has no holder", ticket.id))
        })?;

        Ok(Some(TicketDetails {
            ticket: ticket.clone(),
            event,
            holder,
        }))
    }

    async fn admit(&self, admission: &Admission) -> Result<Option<Entry>, StoreError> {
        let mut guard = self.lock();
        guard.check_ticket_available(admission.ticket_id)?;
        let inner = &mut *guard;

        // Conditional update first, then the entry insert, in the same order
        // as the PostgreSQL transaction.
        let Some(ticket) = inner
            .tickets
            .values_mut()
            .find(|t| t.id == admission.ticket_id && t.scan_status == ScanStatus::Unused)
        else {
            return Ok(None);
        };

        if inner
            .entries
            .iter()
            .any(|e| e.ticket_id == admission.ticket_id && e.entry_time == admission.scanned_at)
        {
            return Err(StoreError::Database(
                "duplicate key value violates unique constraint \"idx_entries_ticket_time\""
                    .to_string(),
            ));
        }

        let now = Utc::now();
        ticket.scan_status = ScanStatus::Used;
        ticket.scanned_at = Some(admission.scanned_at);
        ticket.scanned_by = Some(admission.scanned_by);
        ticket.scanned_gate = Some(admission.gate_name.clone());
        ticket.updated_at = now;

        let entry = Entry {
            id: Uuid::new_v4(),
            ticket_id: admission.ticket_id,
            user_id: admission.user_id,
            event_id: admission.event_id,
            entry_time: admission.scanned_at,
            gate_name: admission.gate_name.clone(),
            scanned_by: admission.scanned_by,
            scanned_offline: admission.scanned_offline,
            synced_at: admission.synced_at,
            device_info: admission.device_info.clone(),
            created_at: now,
        };
        inner.entries.push(entry.clone());

        Ok(Some(entry))
    }

    async fn reset(&self, qr_id: &str) -> Result<Option<Ticket>, StoreError> {
        let mut inner = self.lock();
        inner.check_available(qr_id)?;

        let Some(ticket) = inner.tickets.get_mut(qr_id) else {
            return Ok(None);
        };
        ticket.scan_status = ScanStatus::Unused;
        ticket.scanned_at = None;
        ticket.scanned_by = None;
        ticket.scanned_gate = None;
        ticket.updated_at = Utc::now();
        let ticket = ticket.clone();

        inner.entries.retain(|e| e.ticket_id != ticket.id);
        Ok(Some(ticket))
    }
}

#[async_trait::async_trait]
impl EntryLog for InMemoryCheckInStore {
    async fn latest_at_gate(
        &self,
        ticket_id: Uuid,
        gate_name: &str,
    ) -> Result<Option<Entry>, StoreError> {
        let inner = self.lock();
        inner.check_ticket_available(ticket_id)?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.ticket_id == ticket_id && e.gate_name == gate_name)
            .max_by_key(|e| e.entry_time)
            .cloned())
    }

    async fn find_at(
        &self,
        ticket_id: Uuid,
        entry_time: DateTime<Utc>,
    ) -> Result<Option<Entry>, StoreError> {
        let inner = self.lock();
        inner.check_ticket_available(ticket_id)?;
        Ok(inner
            .entries
            .iter()
            .find(|e| e.ticket_id == ticket_id && e.entry_time == entry_time)
            .cloned())
    }

    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Entry>, StoreError> {
        let inner = self.lock();
        inner.check_ticket_available(ticket_id)?;
        let mut entries: Vec<Entry> = inner
            .entries
            .iter()
            .filter(|e| e.ticket_id == ticket_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
        Ok(entries)
    }

    async fn event_stats(&self, event_id: Uuid) -> Result<CheckInStats, StoreError> {
        let inner = self.lock();
        let tickets = inner.tickets.values().filter(|t| t.event_id == event_id);
        let (total_tickets, checked_in) = tickets.fold((0, 0), |(total, used), t| {
            (total + 1, used + i64::from(t.scan_status == ScanStatus::Used))
        });
        let (online_entries, offline_entries) = inner
            .entries
            .iter()
            .filter(|e| e.event_id == event_id)
            .fold((0, 0), |(online, offline), e| {
                if e.scanned_offline {
                    (online, offline + 1)
                } else {
                    (online + 1, offline)
                }
            });

        Ok(CheckInStats {
            event_id,
            total_tickets,
            checked_in,
            online_entries,
            offline_entries,
        })
    }
}
