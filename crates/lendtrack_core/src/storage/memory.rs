//! In-process blob store.

use super::{StoragePort, StorageResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Blob held in memory.
///
/// Clones share the same blob, which lets a test hand one handle to a
/// registry and inspect the persisted text through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blob: Rc<RefCell<Option<String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `raw`.
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            blob: Rc::new(RefCell::new(Some(raw.into()))),
        }
    }

    /// Returns a copy of the current blob.
    pub fn contents(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl StoragePort for MemoryBlobStore {
    fn load(&self) -> StorageResult<Option<String>> {
        Ok(self.blob.borrow().clone())
    }

    fn save(&self, raw: &str) -> StorageResult<()> {
        *self.blob.borrow_mut() = Some(raw.to_string());
        Ok(())
    }
}
