//! Event repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::EventEntity;
use crate::metrics::QueryTimer;

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an event. The database rejects a window whose start is not
    /// before its end.
    pub async fn create(
        &self,
        name: &str,
        qr_validity_start: Option<DateTime<Utc>>,
        qr_validity_end: Option<DateTime<Utc>>,
    ) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            INSERT INTO events (name, qr_validity_start, qr_validity_end)
            VALUES ($1, $2, $3)
            RETURNING id, name, qr_validity_start, qr_validity_end, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(qr_validity_start)
        .bind(qr_validity_end)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }
}
