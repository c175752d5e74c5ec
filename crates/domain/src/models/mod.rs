//! Domain models for Gatepass check-in.

pub mod entry;
pub mod event;
pub mod offline;
pub mod qr_payload;
pub mod scan;
pub mod staff;
pub mod ticket;

pub use entry::{Admission, CheckInStats, Entry};
pub use event::{EventSummary, ValidityWindow, WindowError};
pub use offline::{
    OfflineScanRecord, OfflineSyncRequest, ReconcileItem, ReconcileReport, SubmittedScan,
    SyncCategory, SyncReason, MAX_OFFLINE_BATCH_SIZE,
};
pub use qr_payload::{QrPayload, StructuredPayload};
pub use scan::{Admitted, PriorAdmission, RepeatedScan, ScanOutcome, ScanRequest, ScanResponse};
pub use staff::{StaffIdentity, StaffRole};
pub use ticket::{PaymentStatus, ScanStatus, Ticket, TicketDetails, TicketHolder};
