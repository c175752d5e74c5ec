//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{EventSummary, ValidityWindow};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub name: String,
    pub qr_validity_start: Option<DateTime<Utc>>,
    pub qr_validity_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for EventSummary {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            window: ValidityWindow {
                start: entity.qr_validity_start,
                end: entity.qr_validity_end,
            },
        }
    }
}
