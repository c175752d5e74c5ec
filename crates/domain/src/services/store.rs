//! Storage seams for the check-in core.
//!
//! The persistence crate implements these traits on PostgreSQL. The
//! in-memory implementation in [`super::memory_store`] backs unit and API tests.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Admission, CheckInStats, Entry, Ticket, TicketDetails};

/// Infrastructure failure reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Malformed stored data: {0}")]
    MalformedRow(String),
}

/// Tickets keyed by scan identifier, with the conditional admission write.
#[async_trait::async_trait]
pub trait TicketStore: Send + Sync {
    /// Looks up a ticket with its event and holder.
    async fn find_by_qr_id(&self, qr_id: &str) -> Result<Option<TicketDetails>, StoreError>;

    /// Marks the ticket used and appends its entry, only if the ticket is
    /// still unused at the moment of the write. Both changes commit together.
    ///
    /// Returns `Ok(None)` when another admission already consumed the ticket.
    async fn admit(&self, admission: &Admission) -> Result<Option<Entry>, StoreError>;

    /// Returns a ticket to `unused` and deletes its entries.
    ///
    /// Returns `Ok(None)` if no ticket has this scan identifier.
    async fn reset(&self, qr_id: &str) -> Result<Option<Ticket>, StoreError>;
}

/// Append-only admission history.
#[async_trait::async_trait]
pub trait EntryLog: Send + Sync {
    /// Most recent entry for the ticket at the given gate.
    async fn latest_at_gate(
        &self,
        ticket_id: Uuid,
        gate_name: &str,
    ) -> Result<Option<Entry>, StoreError>;

    /// Entry recorded for the ticket at exactly this time, if any.
    async fn find_at(
        &self,
        ticket_id: Uuid,
        entry_time: DateTime<Utc>,
    ) -> Result<Option<Entry>, StoreError>;

    /// All entries for a ticket, newest first.
    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Entry>, StoreError>;

    async fn event_stats(&self, event_id: Uuid) -> Result<CheckInStats, StoreError>;
}
