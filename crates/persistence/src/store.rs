//! PostgreSQL implementations of the check-in storage traits.

use chrono::{DateTime, Utc};
use domain::models::{Admission, CheckInStats, Entry, Ticket, TicketDetails};
use domain::services::{EntryLog, StoreError, TicketStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repositories::{EntryRepository, TicketRepository};

fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::MalformedRow(e.to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}

/// Ticket store backed by the `tickets` table.
#[derive(Clone)]
pub struct PgTicketStore {
    tickets: TicketRepository,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tickets: TicketRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl TicketStore for PgTicketStore {
    async fn find_by_qr_id(&self, qr_id: &str) -> Result<Option<TicketDetails>, StoreError> {
        let details = self
            .tickets
            .find_details_by_qr_id(qr_id)
            .await
            .map_err(store_error)?;
        Ok(details.map(Into::into))
    }

    async fn admit(&self, admission: &Admission) -> Result<Option<Entry>, StoreError> {
        let entry = self.tickets.admit(admission).await.map_err(store_error)?;
        Ok(entry.map(Into::into))
    }

    async fn reset(&self, qr_id: &str) -> Result<Option<Ticket>, StoreError> {
        let ticket = self.tickets.reset(qr_id).await.map_err(store_error)?;
        Ok(ticket.map(Into::into))
    }
}

/// Entry log backed by the `entries` table.
#[derive(Clone)]
pub struct PgEntryLog {
    entries: EntryRepository,
}

impl PgEntryLog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            entries: EntryRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl EntryLog for PgEntryLog {
    async fn latest_at_gate(
        &self,
        ticket_id: Uuid,
        gate_name: &str,
    ) -> Result<Option<Entry>, StoreError> {
        let entry = self
            .entries
            .latest_at_gate(ticket_id, gate_name)
            .await
            .map_err(store_error)?;
        Ok(entry.map(Into::into))
    }

    async fn find_at(
        &self,
        ticket_id: Uuid,
        entry_time: DateTime<Utc>,
    ) -> Result<Option<Entry>, StoreError> {
        let entry = self
            .entries
            .find_at(ticket_id, entry_time)
            .await
            .map_err(store_error)?;
        Ok(entry.map(Into::into))
    }

    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Entry>, StoreError> {
        let entries = self
            .entries
            .list_for_ticket(ticket_id)
            .await
            .map_err(store_error)?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn event_stats(&self, event_id: Uuid) -> Result<CheckInStats, StoreError> {
        let stats = self
            .entries
            .event_stats(event_id)
            .await
            .map_err(store_error)?;
        Ok(stats.into_stats(event_id))
    }
}
