//! Ticket audit and admin handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{Entry, ScanStatus, Ticket};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, StaffAuth};

/// Entry history of one ticket.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEntriesResponse {
    pub ticket_id: Uuid,
    pub qr_id: String,
    pub scan_status: ScanStatus,
    /// Newest first.
    pub entries: Vec<Entry>,
}

/// List every recorded entry for a ticket.
///
/// GET /api/v1/tickets/:qr_id/entries
pub async fn list_entries(
    State(state): State<AppState>,
    StaffAuth(_staff): StaffAuth,
    Path(qr_id): Path<String>,
) -> Result<Json<TicketEntriesResponse>, ApiError> {
    let details = state
        .tickets
        .find_by_qr_id(&qr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    let entries = state.entries.list_for_ticket(details.ticket.id).await?;

    Ok(Json(TicketEntriesResponse {
        ticket_id: details.ticket.id,
        qr_id: details.ticket.qr_id,
        scan_status: details.ticket.scan_status,
        entries,
    }))
}

/// Return a ticket to `unused` and drop its entries.
///
/// POST /api/v1/admin/tickets/:qr_id/reset
pub async fn reset_ticket(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Path(qr_id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state
        .tickets
        .reset(&qr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    info!(admin_id = %admin.id, qr_id = %ticket.qr_id, "Ticket reset to unused");

    Ok(Json(ticket))
}
