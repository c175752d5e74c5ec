//! Entry entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{CheckInStats, Entry};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the entries table.
#[derive(Debug, Clone, FromRow)]
pub struct EntryEntity {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub entry_time: DateTime<Utc>,
    pub gate_name: String,
    pub scanned_by: Uuid,
    pub scanned_offline: bool,
    pub synced_at: Option<DateTime<Utc>>,
    pub device_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<EntryEntity> for Entry {
    fn from(entity: EntryEntity) -> Self {
        Self {
            id: entity.id,
            ticket_id: entity.ticket_id,
            user_id: entity.user_id,
            event_id: entity.event_id,
            entry_time: entity.entry_time,
            gate_name: entity.gate_name,
            scanned_by: entity.scanned_by,
            scanned_offline: entity.scanned_offline,
            synced_at: entity.synced_at,
            device_info: entity.device_info,
            created_at: entity.created_at,
        }
    }
}

/// Aggregated check-in counters for an event.
#[derive(Debug, Clone, FromRow)]
pub struct CheckInStatsEntity {
    pub total_tickets: i64,
    pub checked_in: i64,
    pub online_entries: i64,
    pub offline_entries: i64,
}

impl CheckInStatsEntity {
    pub fn into_stats(self, event_id: Uuid) -> CheckInStats {
        CheckInStats {
            event_id,
            total_tickets: self.total_tickets,
            checked_in: self.checked_in,
            online_entries: self.online_entries,
            offline_entries: self.offline_entries,
        }
    }
}
