//! Device side of Gatepass check-in.
//!
//! A gate device presents each QR code to the check-in service. When the
//! service cannot be reached the scan is kept in an [`OfflineBuffer`] and
//! submitted for reconciliation once connectivity returns.

pub mod api;
pub mod buffer;
pub mod session;

pub use api::{CheckInApi, ClientConfig, ClientError, HttpCheckInApi};
pub use buffer::{Enqueued, OfflineBuffer};
pub use session::{GateSession, Presented};
