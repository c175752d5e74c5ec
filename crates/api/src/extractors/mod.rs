//! Custom Axum extractors.

pub mod staff_auth;

pub use staff_auth::{AdminAuth, StaffAuth};
