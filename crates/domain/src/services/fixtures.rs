//! Test data shared by the service tests.

use chrono::{DateTime, TimeZone, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;

use crate::models::{
    EventSummary, PaymentStatus, ScanStatus, StaffIdentity, StaffRole, Ticket, TicketDetails,
    TicketHolder, ValidityWindow,
};

pub fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, hour, minute, second).unwrap()
}

pub fn staff() -> StaffIdentity {
    StaffIdentity {
        id: Uuid::new_v4(),
        name: Some(Name().fake()),
        role: StaffRole::Staff,
    }
}

/// A paid, unused ticket with its own event and holder.
pub fn ticket_details(qr_id: &str, window: ValidityWindow) -> TicketDetails {
    let event_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let created = at(8, 0, 0);
    TicketDetails {
        ticket: Ticket {
            id: Uuid::new_v4(),
            qr_id: qr_id.to_string(),
            user_id,
            event_id,
            payment_status: PaymentStatus::Completed,
            amount_cents: 4500,
            scan_status: ScanStatus::Unused,
            scanned_at: None,
            scanned_by: None,
            scanned_gate: None,
            created_at: created,
            updated_at: created,
        },
        event: EventSummary {
            id: event_id,
            name: "Launch Night".to_string(),
            window,
        },
        holder: TicketHolder {
            id: user_id,
            name: Name().fake(),
            email: SafeEmail().fake(),
        },
    }
}
