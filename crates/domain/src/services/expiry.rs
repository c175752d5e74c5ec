//! Event validity window check.

use chrono::{DateTime, Utc};

use crate::models::ValidityWindow;

/// Returns true if `at` falls inside `[start, end]`, both ends inclusive.
///
/// A missing bound leaves that side open. A window whose start is not before
/// its end accepts nothing.
pub fn is_within_window(window: &ValidityWindow, at: DateTime<Utc>) -> bool {
    if !window.is_well_formed() {
        return false;
    }
    let after_start = window.start.map_or(true, |start| at >= start);
    let before_end = window.end.map_or(true, |end| at <= end);
    after_start && before_end
}
