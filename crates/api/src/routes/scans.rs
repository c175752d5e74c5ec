//! Scan endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{OfflineSyncRequest, ReconcileReport, ScanRequest, ScanResponse};
use tracing::error;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::StaffAuth;
use crate::middleware::metrics::{record_offline_sync_items, record_scan_outcome};

/// HTTP status for each wire status of a scan.
pub fn status_for(response: &ScanResponse) -> StatusCode {
    match response {
        ScanResponse::Success(_) => StatusCode::OK,
        ScanResponse::AlreadyUsed(_) | ScanResponse::DuplicateScan(_) => StatusCode::CONFLICT,
        ScanResponse::Expired => StatusCode::UNPROCESSABLE_ENTITY,
        ScanResponse::Invalid => StatusCode::NOT_FOUND,
        ScanResponse::Error { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Admit the holder of a scanned QR code.
///
/// POST /api/v1/scans
pub async fn scan_ticket(
    State(state): State<AppState>,
    StaffAuth(staff): StaffAuth,
    Json(request): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ScanResponse>), ApiError> {
    request.validate()?;

    let response = match state.coordinator.scan(&request, &staff).await {
        Ok(outcome) => ScanResponse::from(outcome),
        Err(e) => {
            error!(staff_id = %staff.id, error = %e, "Scan failed on store error");
            ScanResponse::error("Scan could not be completed, please retry")
        }
    };

    record_scan_outcome(response.label());
    Ok((status_for(&response), Json(response)))
}

/// Reconcile scans a gate device captured while offline.
///
/// POST /api/v1/scans/offline-sync
pub async fn sync_offline_scans(
    State(state): State<AppState>,
    StaffAuth(staff): StaffAuth,
    Json(request): Json<OfflineSyncRequest>,
) -> Result<Json<ReconcileReport>, ApiError> {
    request.validate()?;

    let max_batch = state.config.limits.max_offline_batch_size;
    if request.offline_scans.len() > max_batch {
        return Err(ApiError::Validation(format!(
            "Batch must contain at most {} scans",
            max_batch
        )));
    }

    let report = state
        .reconciler
        .reconcile_submitted(&request.offline_scans, &staff)
        .await;

    record_offline_sync_items("synced", report.synced.len());
    record_offline_sync_items("duplicate", report.duplicates.len());
    record_offline_sync_items("failed", report.failed.len());

    Ok(Json(report))
}
