//! Event check-in statistics.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::CheckInStats;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::StaffAuth;

/// Check-in counters for an event. Unknown events report zeros.
///
/// GET /api/v1/events/:event_id/check-in-stats
pub async fn check_in_stats(
    State(state): State<AppState>,
    StaffAuth(_staff): StaffAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<CheckInStats>, ApiError> {
    let stats = state.entries.event_stats(event_id).await?;
    Ok(Json(stats))
}
