//! Scan identifier generation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

/// Number of random bytes behind a scan identifier.
pub const SCAN_ID_BYTES: usize = 24;

/// Generates a new unguessable ticket scan identifier.
///
/// The identifier is 24 bytes from the OS-seeded thread RNG encoded as
/// URL-safe base64 without padding (32 characters), so it can be embedded in a
/// QR payload or a URL without escaping.
pub fn generate_scan_id() -> String {
    let mut bytes = [0u8; SCAN_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
