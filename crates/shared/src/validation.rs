//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum length of a gate name.
pub const MAX_GATE_NAME_LENGTH: usize = 100;

/// Maximum length of a free-form device descriptor.
pub const MAX_DEVICE_INFO_LENGTH: usize = 500;

lazy_static! {
    /// Syntax accepted for a bare (non-JSON) scan identifier.
    static ref SCAN_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_\-:.]{1,128}$").unwrap();
}

/// Returns true if the value looks like a scan identifier.
///
/// Generated identifiers are URL-safe base64; older tickets may carry UUIDs or
/// other short tokens, so the accepted alphabet is slightly wider.
pub fn is_scan_id_syntax(value: &str) -> bool {
    SCAN_ID_REGEX.is_match(value)
}

/// Validates a gate name: non-blank after trimming and at most 100 characters.
pub fn validate_gate_name(gate_name: &str) -> Result<(), ValidationError> {
    if gate_name.trim().is_empty() {
        let mut err = ValidationError::new("gate_name_blank");
        err.message = Some("Gate name is required".into());
        return Err(err);
    }
    if gate_name.chars().count() > MAX_GATE_NAME_LENGTH {
        let mut err = ValidationError::new("gate_name_length");
        err.message = Some("Gate name must be at most 100 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a device descriptor length.
pub fn validate_device_info(device_info: &str) -> Result<(), ValidationError> {
    if device_info.chars().count() > MAX_DEVICE_INFO_LENGTH {
        let mut err = ValidationError::new("device_info_length");
        err.message = Some("Device info must be at most 500 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a scanned QR payload is not blank.
pub fn validate_ticket_identifier(identifier: &str) -> Result<(), ValidationError> {
    if identifier.trim().is_empty() {
        let mut err = ValidationError::new("ticket_identifier_blank");
        err.message = Some("Ticket identifier is required".into());
        return Err(err);
    }
    Ok(())
}
