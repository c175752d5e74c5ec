//! Entry repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{CheckInStatsEntity, EntryEntity};
use crate::metrics::QueryTimer;

/// Repository for entry log queries. Entries are written by
/// [`TicketRepository::admit`](super::TicketRepository::admit) only.
#[derive(Clone)]
pub struct EntryRepository {
    pool: PgPool,
}

impl EntryRepository {
    /// Creates a new EntryRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent entry for a ticket at a gate.
    pub async fn latest_at_gate(
        &self,
        ticket_id: Uuid,
        gate_name: &str,
    ) -> Result<Option<EntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_latest_entry_at_gate");
        let result = sqlx::query_as::<_, EntryEntity>(
            r#"
            SELECT id, ticket_id, user_id, event_id, entry_time, gate_name, scanned_by,
                   scanned_offline, synced_at, device_info, created_at
            FROM entries
            WHERE ticket_id = $1 AND gate_name = $2
            ORDER BY entry_time DESC
            LIMIT 1
            "#,
        )
        .bind(ticket_id)
        .bind(gate_name)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Entry for a ticket at exactly the given time.
    pub async fn find_at(
        &self,
        ticket_id: Uuid,
        entry_time: DateTime<Utc>,
    ) -> Result<Option<EntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_entry_at_time");
        let result = sqlx::query_as::<_, EntryEntity>(
            r#"
            SELECT id, ticket_id, user_id, event_id, entry_time, gate_name, scanned_by,
                   scanned_offline, synced_at, device_info, created_at
            FROM entries
            WHERE ticket_id = $1 AND entry_time = $2
            "#,
        )
        .bind(ticket_id)
        .bind(entry_time)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// All entries for a ticket, newest first.
    pub async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<EntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_entries_for_ticket");
        let result = sqlx::query_as::<_, EntryEntity>(
            r#"
            SELECT id, ticket_id, user_id, event_id, entry_time, gate_name, scanned_by,
                   scanned_offline, synced_at, device_info, created_at
            FROM entries
            WHERE ticket_id = $1
            ORDER BY entry_time DESC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Ticket and entry counters for an event.
    pub async fn event_stats(&self, event_id: Uuid) -> Result<CheckInStatsEntity, sqlx::Error> {
        let timer = QueryTimer::new("event_check_in_stats");
        let result = sqlx::query_as::<_, CheckInStatsEntity>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tickets WHERE event_id = $1) AS total_tickets,
                (SELECT COUNT(*) FROM tickets
                 WHERE event_id = $1 AND scan_status = 'used') AS checked_in,
                (SELECT COUNT(*) FROM entries
                 WHERE event_id = $1 AND NOT scanned_offline) AS online_entries,
                (SELECT COUNT(*) FROM entries
                 WHERE event_id = $1 AND scanned_offline) AS offline_entries
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }
}
