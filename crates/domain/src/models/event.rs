//! Event domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error constructing a validity window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("QR validity start must be before end")]
    StartNotBeforeEnd,
}

/// Period during which an event's tickets may be scanned.
///
/// Either bound may be absent, leaving that side unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityWindow {
    #[serde(rename = "qrValidityStart")]
    pub start: Option<DateTime<Utc>>,
    #[serde(rename = "qrValidityEnd")]
    pub end: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    /// Builds a window, rejecting `start >= end` when both bounds are set.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, WindowError> {
        let window = Self { start, end };
        if window.is_well_formed() {
            Ok(window)
        } else {
            Err(WindowError::StartNotBeforeEnd)
        }
    }

    /// A window with no bounds; every timestamp is accepted.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_well_formed(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        }
    }
}

/// Event attributes the check-in core reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub window: ValidityWindow,
}
