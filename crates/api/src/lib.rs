//! Gatepass HTTP API: real-time scans, offline reconciliation and the
//! check-in audit routes.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
