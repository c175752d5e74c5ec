//! Ticket repository for database operations.

use domain::models::Admission;
use shared::crypto::generate_scan_id;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EntryEntity, TicketDetailsEntity, TicketEntity};
use crate::metrics::QueryTimer;

/// Repository for ticket-related database operations.
#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    /// Creates a new TicketRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a ticket for a completed payment with a fresh scan identifier.
    pub async fn issue(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        amount_cents: i64,
    ) -> Result<TicketEntity, sqlx::Error> {
        let qr_id = generate_scan_id();
        let timer = QueryTimer::new("issue_ticket");
        let result = sqlx::query_as::<_, TicketEntity>(
            r#"
            INSERT INTO tickets (qr_id, user_id, event_id, payment_status, amount_cents)
            VALUES ($1, $2, $3, 'completed', $4)
            RETURNING id, qr_id, user_id, event_id, payment_status, amount_cents, scan_status,
                      scanned_at, scanned_by, scanned_gate, created_at, updated_at
            "#,
        )
        .bind(&qr_id)
        .bind(user_id)
        .bind(event_id)
        .bind(amount_cents)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find a ticket by scan identifier, joined with its event and holder.
    pub async fn find_details_by_qr_id(
        &self,
        qr_id: &str,
    ) -> Result<Option<TicketDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ticket_details_by_qr_id");
        let result = sqlx::query_as::<_, TicketDetailsEntity>(
            r#"
            SELECT t.id, t.qr_id, t.user_id, t.event_id, t.payment_status, t.amount_cents,
                   t.scan_status, t.scanned_at, t.scanned_by, t.scanned_gate,
                   t.created_at, t.updated_at,
                   e.name AS event_name, e.qr_validity_start, e.qr_validity_end,
                   u.name AS user_name, u.email AS user_email
            FROM tickets t
            JOIN events e ON e.id = t.event_id
            JOIN users u ON u.id = t.user_id
            WHERE t.qr_id = $1
            "#,
        )
        .bind(qr_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Mark a ticket used and insert its entry in one transaction.
    ///
    /// The update only matches while `scan_status = 'unused'`. Under READ
    /// COMMITTED a concurrent second update waits for the first to commit,
    /// re-evaluates the predicate and affects zero rows, in which case nothing
    /// is written and `None` is returned.
    pub async fn admit(&self, admission: &Admission) -> Result<Option<EntryEntity>, sqlx::Error> {
        let mut timer = QueryTimer::new("admit_ticket");
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE tickets
            SET scan_status = 'used', scanned_at = $2, scanned_by = $3, scanned_gate = $4,
                updated_at = NOW()
            WHERE id = $1 AND scan_status = 'unused'
            "#,
        )
        .bind(admission.ticket_id)
        .bind(admission.scanned_at)
        .bind(admission.scanned_by)
        .bind(&admission.gate_name)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tracing::debug!(ticket_id = %admission.ticket_id, "Conditional admission matched no rows");
            tx.rollback().await?;
            timer.succeed();
            return Ok(None);
        }

        let entry = sqlx::query_as::<_, EntryEntity>(
            r#"
            INSERT INTO entries (ticket_id, user_id, event_id, entry_time, gate_name,
                                 scanned_by, scanned_offline, synced_at, device_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, ticket_id, user_id, event_id, entry_time, gate_name, scanned_by,
                      scanned_offline, synced_at, device_info, created_at
            "#,
        )
        .bind(admission.ticket_id)
        .bind(admission.user_id)
        .bind(admission.event_id)
        .bind(admission.scanned_at)
        .bind(&admission.gate_name)
        .bind(admission.scanned_by)
        .bind(admission.scanned_offline)
        .bind(admission.synced_at)
        .bind(admission.device_info.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.succeed();
        Ok(Some(entry))
    }

    /// Return a ticket to unused and delete its entries.
    pub async fn reset(&self, qr_id: &str) -> Result<Option<TicketEntity>, sqlx::Error> {
        let mut timer = QueryTimer::new("reset_ticket");
        let mut tx = self.pool.begin().await?;

        let ticket = sqlx::query_as::<_, TicketEntity>(
            r#"
            UPDATE tickets
            SET scan_status = 'unused', scanned_at = NULL, scanned_by = NULL,
                scanned_gate = NULL, updated_at = NOW()
            WHERE qr_id = $1
            RETURNING id, qr_id, user_id, event_id, payment_status, amount_cents, scan_status,
                      scanned_at, scanned_by, scanned_gate, created_at, updated_at
            "#,
        )
        .bind(qr_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ticket) = ticket else {
            tx.rollback().await?;
            timer.succeed();
            return Ok(None);
        };

        sqlx::query("DELETE FROM entries WHERE ticket_id = $1")
            .bind(ticket.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.succeed();
        Ok(Some(ticket))
    }
}
