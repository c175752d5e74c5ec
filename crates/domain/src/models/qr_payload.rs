//! QR payload parsing.
//!
//! Tickets issued by the registration flow encode a JSON object carrying the
//! scan identifier. Older printouts encode only the bare identifier. Parsing
//! tries the structured form first and falls back to the bare form.

use serde::Deserialize;
use serde_json::Value;

use shared::validation::is_scan_id_syntax;

/// Structured QR payload. Only `qrId` is required; the rest is informational.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructuredPayload {
    #[serde(
        rename = "qrId",
        alias = "qr_id",
        alias = "ticketIdentifier",
        alias = "ticketId"
    )]
    pub qr_id: String,
    #[serde(default, rename = "eventId", alias = "event_id")]
    pub event_id: Option<String>,
}

/// A decoded QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayload {
    Structured(StructuredPayload),
    Bare(String),
}

impl QrPayload {
    /// Parses raw scanner output. Returns `None` if no scan identifier can be
    /// extracted.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => {
                let payload: StructuredPayload =
                    serde_json::from_value(Value::Object(map)).ok()?;
                let qr_id = payload.qr_id.trim();
                if !is_scan_id_syntax(qr_id) {
                    return None;
                }
                Some(QrPayload::Structured(StructuredPayload {
                    qr_id: qr_id.to_string(),
                    event_id: payload.event_id,
                }))
            }
            // A JSON string literal wrapping the identifier
            Ok(Value::String(s)) => Self::bare(s.trim()),
            Ok(Value::Number(_)) | Err(_) => Self::bare(raw),
            Ok(_) => None,
        }
    }

    fn bare(value: &str) -> Option<Self> {
        is_scan_id_syntax(value).then(|| QrPayload::Bare(value.to_string()))
    }

    /// The ticket scan identifier carried by the payload.
    pub fn scan_id(&self) -> &str {
        match self {
            QrPayload::Structured(payload) => &payload.qr_id,
            QrPayload::Bare(id) => id,
        }
    }
}
