//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod entry;
pub mod event;
pub mod ticket;

pub use entry::{CheckInStatsEntity, EntryEntity};
pub use event::EventEntity;
pub use ticket::{PaymentStatusDb, ScanStatusDb, TicketDetailsEntity, TicketEntity};
