//! Online scan request and outcome models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to admit the holder of a scanned QR code.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Raw QR payload as read by the scanner.
    #[validate(custom(function = "shared::validation::validate_ticket_identifier"))]
    #[validate(length(max = 2048, message = "Ticket identifier too long"))]
    pub ticket_identifier: String,

    #[validate(custom(function = "shared::validation::validate_gate_name"))]
    pub gate_name: String,

    #[serde(default)]
    pub scanned_offline: bool,

    #[validate(custom(function = "shared::validation::validate_device_info"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
}

/// Display details for a granted admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admitted {
    pub ticket_id: Uuid,
    pub qr_id: String,
    pub user_name: String,
    pub user_email: String,
    pub event_name: String,
    pub gate_name: String,
    pub scanned_at: DateTime<Utc>,
}

/// When and where a ticket was originally admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorAdmission {
    pub original_scan_time: DateTime<Utc>,
    pub original_gate: String,
}

/// A same-gate re-read inside the suppression window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedScan {
    pub original_scan_time: DateTime<Utc>,
    pub gate_name: String,
}

/// Domain result of a single scan. Every variant is a terminal answer for the
/// attempt; infrastructure failures are reported separately as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Success(Admitted),
    AlreadyUsed(PriorAdmission),
    DuplicateScan(RepeatedScan),
    Expired,
    Invalid,
}

impl ScanOutcome {
    /// Stable label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Success(_) => "success",
            ScanOutcome::AlreadyUsed(_) => "already-used",
            ScanOutcome::DuplicateScan(_) => "duplicate-scan",
            ScanOutcome::Expired => "expired",
            ScanOutcome::Invalid => "invalid",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Success(_))
    }
}

/// Wire representation of a scan result, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ScanResponse {
    Success(Admitted),
    AlreadyUsed(PriorAdmission),
    DuplicateScan(RepeatedScan),
    Expired,
    Invalid,
    Error { message: String },
}

impl ScanResponse {
    pub fn error(message: impl Into<String>) -> Self {
        ScanResponse::Error {
            message: message.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScanResponse::Success(_) => "success",
            ScanResponse::AlreadyUsed(_) => "already-used",
            ScanResponse::DuplicateScan(_) => "duplicate-scan",
            ScanResponse::Expired => "expired",
            ScanResponse::Invalid => "invalid",
            ScanResponse::Error { .. } => "error",
        }
    }
}

impl From<ScanOutcome> for ScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Success(admitted) => ScanResponse::Success(admitted),
            ScanOutcome::AlreadyUsed(prior) => ScanResponse::AlreadyUsed(prior),
            ScanOutcome::DuplicateScan(repeat) => ScanResponse::DuplicateScan(repeat),
            ScanOutcome::Expired => ScanResponse::Expired,
            ScanOutcome::Invalid => ScanResponse::Invalid,
        }
    }
}
