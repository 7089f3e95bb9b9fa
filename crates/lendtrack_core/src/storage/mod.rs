//! Storage port consumed by the registries, plus its adapters.
//!
//! # Responsibility
//! - Define the opaque `load`/`save` contract over one raw text blob.
//! - Provide in-memory, file and SQLite adapters.
//!
//! # Invariants
//! - `load` returns `None` when nothing was ever saved.
//! - `save` replaces the previous blob as a whole; a later `load` never
//!   observes a partial write.
//! - Adapters never inspect blob contents.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod file;
mod memory;
mod sqlite;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use sqlite::SqliteBlobStore;

/// Blob key for the contact registry.
pub const CONTACTS_BLOB_KEY: &str = "contacts_json";
/// Blob key for the item registry.
pub const ITEMS_BLOB_KEY: &str = "items_json";

pub type StorageResult<T> = Result<T, StorageError>;

/// Transport-level storage failure.
///
/// Malformed blob contents are not a storage error; registries handle those.
#[derive(Debug)]
pub enum StorageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Db(DbError),
    Encode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "storage I/O failed at `{}`: {source}", path.display())
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode registry records: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Load/save port for one entity type's persisted record sequence.
pub trait StoragePort {
    /// Returns the last saved blob, or `None` when nothing was saved yet.
    fn load(&self) -> StorageResult<Option<String>>;

    /// Replaces the stored blob.
    fn save(&self, raw: &str) -> StorageResult<()>;
}

impl<P: StoragePort + ?Sized> StoragePort for &P {
    fn load(&self) -> StorageResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, raw: &str) -> StorageResult<()> {
        (**self).save(raw)
    }
}

impl<P: StoragePort + ?Sized> StoragePort for Box<P> {
    fn load(&self) -> StorageResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, raw: &str) -> StorageResult<()> {
        (**self).save(raw)
    }
}
