//! Core domain logic for the lending tracker.
//! This crate is the single source of truth for registry invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{default_log_level, ConfigError, LendingConfig};
pub use logging::{init_logging, init_logging_from_config, logging_status, LoggingError};
pub use model::contact::{
    normalize_username, validate_edited_email, Contact, ContactRecord, ContactValidationError,
};
pub use model::item::{Item, ItemId, ItemRecord, ItemStatus, ItemValidationError};
pub use repo::contact_repo::{ContactDirectory, ContactRegistry};
pub use repo::item_repo::{ItemRegistry, StatusChange};
pub use service::lending_guard::{can_remove_contact, check_remove_contact, RemovalBlocked};
pub use service::lending_service::{
    CommandOutcome, ItemRef, LendingCommand, LendingError, LendingResult, LendingService,
};
pub use storage::{
    FileBlobStore, MemoryBlobStore, SqliteBlobStore, StorageError, StoragePort, StorageResult,
    CONTACTS_BLOB_KEY, ITEMS_BLOB_KEY,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
