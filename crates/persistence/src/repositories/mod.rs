//! Repository implementations for database operations.

pub mod entry;
pub mod event;
pub mod ticket;

pub use entry::EntryRepository;
pub use event::EventRepository;
pub use ticket::TicketRepository;
