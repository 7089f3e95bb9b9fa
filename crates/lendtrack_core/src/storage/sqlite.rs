//! SQLite key/blob store.
//!
//! # Invariants
//! - One row per blob key in `registry_blobs`.
//! - `save` is a single upsert statement.

use super::{StoragePort, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Blob stored under `key` in a migrated SQLite connection.
///
/// Use `db::open_db` / `db::open_db_in_memory` to obtain the connection.
pub struct SqliteBlobStore<'conn> {
    conn: &'conn Connection,
    key: String,
}

impl<'conn> SqliteBlobStore<'conn> {
    pub fn new(conn: &'conn Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl StoragePort for SqliteBlobStore<'_> {
    fn load(&self) -> StorageResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM registry_blobs WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn save(&self, raw: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO registry_blobs (key, payload) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.key.as_str(), raw],
        )?;
        Ok(())
    }
}
