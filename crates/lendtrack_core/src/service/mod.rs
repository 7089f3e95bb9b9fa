//! Core use-case services.
//!
//! # Responsibility
//! - Hold cross-registry policy (the lending guard).
//! - Expose the command handler the presentation layer calls.

pub mod lending_guard;
pub mod lending_service;
