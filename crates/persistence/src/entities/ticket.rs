//! Ticket entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{
    EventSummary, PaymentStatus, ScanStatus, Ticket, TicketDetails, TicketHolder, ValidityWindow,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for ticket payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatusDb {
    Pending,
    Completed,
    Failed,
}

impl From<PaymentStatusDb> for PaymentStatus {
    fn from(status: PaymentStatusDb) -> Self {
        match status {
            PaymentStatusDb::Pending => PaymentStatus::Pending,
            PaymentStatusDb::Completed => PaymentStatus::Completed,
            PaymentStatusDb::Failed => PaymentStatus::Failed,
        }
    }
}

/// Database enum for ticket scan status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "scan_status", rename_all = "lowercase")]
pub enum ScanStatusDb {
    Unused,
    Used,
}

impl From<ScanStatusDb> for ScanStatus {
    fn from(status: ScanStatusDb) -> Self {
        match status {
            ScanStatusDb::Unused => ScanStatus::Unused,
            ScanStatusDb::Used => ScanStatus::Used,
        }
    }
}

/// Database row mapping for the tickets table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketEntity {
    pub id: Uuid,
    pub qr_id: String,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub payment_status: PaymentStatusDb,
    pub amount_cents: i64,
    pub scan_status: ScanStatusDb,
    pub scanned_at: Option<DateTime<Utc>>,
    pub scanned_by: Option<Uuid>,
    pub scanned_gate: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TicketEntity> for Ticket {
    fn from(entity: TicketEntity) -> Self {
        Self {
            id: entity.id,
            qr_id: entity.qr_id,
            user_id: entity.user_id,
            event_id: entity.event_id,
            payment_status: entity.payment_status.into(),
            amount_cents: entity.amount_cents,
            scan_status: entity.scan_status.into(),
            scanned_at: entity.scanned_at,
            scanned_by: entity.scanned_by,
            scanned_gate: entity.scanned_gate,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Ticket row joined with its event and holder.
#[derive(Debug, Clone, FromRow)]
pub struct TicketDetailsEntity {
    #[sqlx(flatten)]
    pub ticket: TicketEntity,
    pub event_name: String,
    pub qr_validity_start: Option<DateTime<Utc>>,
    pub qr_validity_end: Option<DateTime<Utc>>,
    pub user_name: String,
    pub user_email: String,
}

impl From<TicketDetailsEntity> for TicketDetails {
    fn from(entity: TicketDetailsEntity) -> Self {
        let event = EventSummary {
            id: entity.ticket.event_id,
            name: entity.event_name,
            window: ValidityWindow {
                start: entity.qr_validity_start,
                end: entity.qr_validity_end,
            },
        };
        let holder = TicketHolder {
            id: entity.ticket.user_id,
            name: entity.user_name,
            email: entity.user_email,
        };
        Self {
            ticket: entity.ticket.into(),
            event,
            holder,
        }
    }
}
