//! Domain model for the lending tracker.
//!
//! # Responsibility
//! - Define contacts and lendable items as validated value types.
//! - Define the persisted record shapes both entities serialize through.
//!
//! # Invariants
//! - Contact identity is the normalized username, never the legacy `id`.
//! - An item's borrower is present exactly when it is `Borrowed`.

pub mod contact;
pub mod item;
