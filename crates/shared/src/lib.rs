//! Shared utilities and common types for the Gatepass backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Scan identifier generation
//! - Staff JWT validation
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod validation;
