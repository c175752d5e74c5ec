//! Domain layer for the Gatepass check-in service.
//!
//! This crate contains:
//! - Domain models (Ticket, Entry, Event window, scan and sync payloads)
//! - Check-in services (scan coordinator, offline reconciler, expiry check)
//! - Storage traits implemented by the persistence crate

pub mod models;
pub mod services;
