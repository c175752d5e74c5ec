//! Check-in services.
//!
//! Services contain the admission rules and operate on domain models through
//! the storage traits in [`store`].

pub mod clock;
pub mod expiry;
pub mod memory_store;
pub mod reconciler;
pub mod scan_coordinator;
pub mod store;

#[cfg(test)]
mod fixtures;

pub use clock::{to_storage_precision, Clock, ManualClock, SystemClock};
pub use expiry::is_within_window;
pub use memory_store::InMemoryCheckInStore;
pub use reconciler::OfflineReconciler;
pub use scan_coordinator::{CheckInError, ScanCoordinator, DEFAULT_DUPLICATE_WINDOW_SECS};
pub use store::{EntryLog, StoreError, TicketStore};
