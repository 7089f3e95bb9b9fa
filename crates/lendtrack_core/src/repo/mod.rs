//! In-memory registries persisted through a `StoragePort`.
//!
//! # Responsibility
//! - Own the contact and item collections and their per-collection rules.
//! - Convert between registry contents and the persisted record sequence.
//!
//! # Invariants
//! - A malformed record is skipped and logged; it never aborts a load.
//! - An unparseable blob loads as an empty collection.
//! - Read APIs hand out borrowed views; only `&mut self` methods mutate.

pub mod contact_repo;
pub mod item_repo;

use crate::storage::{StoragePort, StorageResult};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Loads and decodes one record sequence from `store`.
///
/// Only transport failures are returned as errors.
pub(crate) fn load_records<T, S>(store: &S, entity: &str) -> StorageResult<Vec<T>>
where
    T: DeserializeOwned,
    S: StoragePort,
{
    let raw = match store.load()? {
        Some(raw) => raw,
        None => return Ok(Vec::new()),
    };
    Ok(decode_records(&raw, entity))
}

/// Encodes `records` and replaces the blob in `store`.
pub(crate) fn save_records<T, S>(store: &S, records: &[T]) -> StorageResult<()>
where
    T: Serialize,
    S: StoragePort,
{
    let raw = serde_json::to_string(records)?;
    store.save(&raw)
}

fn decode_records<T: DeserializeOwned>(raw: &str, entity: &str) -> Vec<T> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(err) => {
            error!(
                "event=registry_load module=repo status=error entity={} error_code=blob_parse_failed error={}",
                entity, err
            );
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => records.push(record),
            Err(err) => warn!(
                "event=registry_load module=repo status=skipped entity={} index={} error={}",
                entity, index, err
            ),
        }
    }
    records
}
