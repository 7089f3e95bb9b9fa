//! Item registry.
//!
//! # Responsibility
//! - Own the ordered item collection and its persistence round-trip.
//! - Drive item status transitions and borrower assignment.
//! - Answer "who currently borrows something" for the lending guard.
//!
//! # Invariants
//! - `status == Borrowed` if and only if the item has a borrower.
//! - A borrower is assigned only when it exists in the given directory at
//!   assignment time; the stored borrower is the directory's copy.
//! - Lending an already borrowed item overwrites the borrower with no
//!   release step for the previous one.

use crate::model::contact::Contact;
use crate::model::item::{normalize_title, Item, ItemId};
use crate::repo::contact_repo::ContactDirectory;
use crate::repo::{load_records, save_records};
use crate::storage::{StoragePort, StorageResult};
use log::{debug, warn};
use std::collections::HashSet;

const ENTITY: &str = "item";

/// Requested target state for `ItemRegistry::set_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// Return the item; always clears the borrower.
    Available,
    /// Lend the item to the contact with this username.
    Borrowed { borrower: String },
}

/// Owns all items for one storage port.
pub struct ItemRegistry<S: StoragePort> {
    store: S,
    items: Vec<Item>,
}

impl<S: StoragePort> ItemRegistry<S> {
    /// Creates an empty registry. Call `reload()` to read persisted items.
    pub fn new(store: S) -> Self {
        Self {
            store,
            items: Vec::new(),
        }
    }

    /// Reads persisted items without touching the registry.
    ///
    /// Records with a blank title or an inconsistent status/borrower pair are
    /// skipped. A record repeating an earlier record's handle keeps its data
    /// under a fresh handle.
    pub fn load_all(&self) -> StorageResult<Vec<Item>> {
        let loaded: Vec<Item> = load_records(&self.store, ENTITY)?;
        Ok(dedup_handles(loaded))
    }

    /// Replaces the persisted items with `items`.
    pub fn save_all(&self, items: &[Item]) -> StorageResult<()> {
        save_records(&self.store, items)?;
        debug!(
            "event=registry_save module=repo status=ok entity={} count={}",
            ENTITY,
            items.len()
        );
        Ok(())
    }

    /// Replaces in-memory items with the persisted ones.
    pub fn reload(&mut self) -> StorageResult<usize> {
        self.items = self.load_all()?;
        debug!(
            "event=registry_reload module=repo status=ok entity={} count={}",
            ENTITY,
            self.items.len()
        );
        Ok(self.items.len())
    }

    /// Persists the current collection.
    pub fn flush(&self) -> StorageResult<()> {
        self.save_all(&self.items)
    }

    /// Read-only view in iteration order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends `item`; rejects a second item with the same handle.
    pub fn add(&mut self, item: Item) -> bool {
        if self.position_of(item.id()).is_some() {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn get(&self, position: usize) -> Option<&Item> {
        self.items.get(position)
    }

    pub fn find(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Removes and returns the item at `position`.
    pub fn remove(&mut self, position: usize) -> Option<Item> {
        if position >= self.items.len() {
            return None;
        }
        Some(self.items.remove(position))
    }

    /// Replaces title and description of the item at `position`.
    ///
    /// Returns `false` when the position is out of range or the title is blank.
    pub fn update_details(&mut self, position: usize, title: &str, description: &str) -> bool {
        if normalize_title(title).is_err() {
            return false;
        }
        match self.items.get_mut(position) {
            Some(item) => item.set_details(title, description).is_ok(),
            None => false,
        }
    }

    /// Applies a status transition to the item at `position`.
    ///
    /// `Available` always succeeds for an existing item. `Borrowed` fails when
    /// the borrower is unknown to `directory`.
    pub fn set_status<D>(&mut self, position: usize, change: StatusChange, directory: &D) -> bool
    where
        D: ContactDirectory + ?Sized,
    {
        let Some(item) = self.items.get_mut(position) else {
            return false;
        };

        match change {
            StatusChange::Available => {
                item.mark_available();
                true
            }
            StatusChange::Borrowed { borrower } => match directory.find_contact(&borrower) {
                Some(contact) => {
                    item.mark_borrowed(contact.clone());
                    true
                }
                None => {
                    debug!(
                        "event=item_lend module=repo status=rejected reason=borrower_not_found"
                    );
                    false
                }
            },
        }
    }

    /// Distinct borrowers of currently borrowed items, in first-seen order.
    pub fn active_borrowers(&self) -> Vec<Contact> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter_map(Item::borrower)
            .filter(|borrower| seen.insert(borrower.key()))
            .cloned()
            .collect()
    }

    /// Items currently lent to `username`.
    pub fn items_borrowed_by(&self, username: &str) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| item.is_borrowed_by(username))
            .collect()
    }

    /// Rewrites the borrower copy on every item lent to `contact`.
    ///
    /// Returns the number of items touched.
    pub fn refresh_borrower(&mut self, contact: &Contact) -> usize {
        let mut touched = 0;
        for item in &mut self.items {
            if item.is_borrowed_by(contact.username()) {
                item.mark_borrowed(contact.clone());
                touched += 1;
            }
        }
        touched
    }

    /// Puts back a collection previously taken from `items()`.
    pub(crate) fn restore(&mut self, snapshot: Vec<Item>) {
        self.items = snapshot;
    }
}

fn dedup_handles(mut items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::with_capacity(items.len());
    for (index, item) in items.iter_mut().enumerate() {
        while !seen.insert(item.id()) {
            warn!(
                "event=registry_load module=repo status=reassigned entity={} index={} error_code=duplicate_handle",
                ENTITY, index
            );
            item.assign_fresh_id();
        }
    }
    items
}
