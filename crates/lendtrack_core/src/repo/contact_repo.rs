//! Contact registry.
//!
//! # Responsibility
//! - Own the ordered contact collection and its persistence round-trip.
//! - Enforce case-insensitive username uniqueness.
//!
//! # Invariants
//! - No two retained contacts share `normalize_username(username)`, including
//!   right after `reload()` and `replace_all()`.
//! - Failed operations leave the collection untouched.
//! - `remove` does not consult the lending guard; callers check it first.

use crate::model::contact::{normalize_username, validate_edited_email, Contact};
use crate::repo::{load_records, save_records};
use crate::storage::{StoragePort, StorageResult};
use log::{debug, warn};
use std::collections::HashSet;

const ENTITY: &str = "contact";

/// Read-only lookup of contacts by username.
///
/// The item registry resolves borrowers through this seam.
pub trait ContactDirectory {
    /// Case-insensitive lookup.
    fn find_contact(&self, username: &str) -> Option<&Contact>;
}

impl ContactDirectory for [Contact] {
    fn find_contact(&self, username: &str) -> Option<&Contact> {
        let key = normalize_username(username);
        self.iter().find(|contact| contact.key() == key)
    }
}

/// Owns all contacts for one storage port.
pub struct ContactRegistry<S: StoragePort> {
    store: S,
    contacts: Vec<Contact>,
}

impl<S: StoragePort> ContactRegistry<S> {
    /// Creates an empty registry. Call `reload()` to read persisted contacts.
    pub fn new(store: S) -> Self {
        Self {
            store,
            contacts: Vec::new(),
        }
    }

    /// Reads persisted contacts without touching the registry.
    ///
    /// Malformed records and later duplicates of an already-seen username are
    /// skipped. Returns an empty list when nothing was stored.
    pub fn load_all(&self) -> StorageResult<Vec<Contact>> {
        let loaded: Vec<Contact> = load_records(&self.store, ENTITY)?;
        Ok(dedup_by_username(loaded))
    }

    /// Replaces the persisted contacts with `contacts`.
    pub fn save_all(&self, contacts: &[Contact]) -> StorageResult<()> {
        save_records(&self.store, contacts)?;
        debug!(
            "event=registry_save module=repo status=ok entity={} count={}",
            ENTITY,
            contacts.len()
        );
        Ok(())
    }

    /// Replaces in-memory contacts with the persisted ones.
    ///
    /// Returns the number of contacts loaded. On error the registry is left
    /// unchanged.
    pub fn reload(&mut self) -> StorageResult<usize> {
        self.contacts = self.load_all()?;
        debug!(
            "event=registry_reload module=repo status=ok entity={} count={}",
            ENTITY,
            self.contacts.len()
        );
        Ok(self.contacts.len())
    }

    /// Persists the current collection.
    pub fn flush(&self) -> StorageResult<()> {
        self.save_all(&self.contacts)
    }

    /// Read-only view in iteration order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Returns `false` for blank usernames and for taken ones.
    pub fn is_username_available(&self, username: &str) -> bool {
        if username.trim().is_empty() {
            return false;
        }
        self.get(username).is_none()
    }

    /// Appends `contact` unless its username is already taken.
    pub fn add(&mut self, contact: Contact) -> bool {
        if !self.is_username_available(contact.username()) {
            debug!(
                "event=contact_add module=repo status=rejected reason=username_taken"
            );
            return false;
        }
        self.contacts.push(contact);
        true
    }

    /// Removes the contact named `username`, ignoring case.
    pub fn remove(&mut self, username: &str) -> bool {
        match self.position(username) {
            Some(index) => {
                self.contacts.remove(index);
                true
            }
            None => false,
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, username: &str) -> Option<&Contact> {
        self.contacts.find_contact(username)
    }

    pub fn has_contact(&self, contact: &Contact) -> bool {
        self.index_of(contact).is_some()
    }

    /// Position of `contact` by identity, for correlating with list rows.
    pub fn index_of(&self, contact: &Contact) -> Option<usize> {
        self.position(contact.username())
    }

    /// Replaces the email of `username` after edit-path validation.
    ///
    /// Returns `false` when the contact is absent or the email is invalid.
    pub fn update_email(&mut self, username: &str, new_email: &str) -> bool {
        let Ok(email) = validate_edited_email(new_email) else {
            return false;
        };
        let Some(index) = self.position(username) else {
            return false;
        };
        match self.contacts.get_mut(index) {
            Some(contact) => contact.set_email(email).is_ok(),
            None => false,
        }
    }

    /// Replaces the whole collection; later duplicates are dropped.
    ///
    /// Returns the number of dropped contacts.
    pub fn replace_all(&mut self, contacts: Vec<Contact>) -> usize {
        let incoming = contacts.len();
        self.contacts = dedup_by_username(contacts);
        incoming - self.contacts.len()
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    /// Puts back a collection previously taken from `contacts()`.
    pub(crate) fn restore(&mut self, snapshot: Vec<Contact>) {
        self.contacts = snapshot;
    }

    fn position(&self, username: &str) -> Option<usize> {
        let key = normalize_username(username);
        self.contacts
            .iter()
            .position(|contact| contact.key() == key)
    }
}

impl<S: StoragePort> ContactDirectory for ContactRegistry<S> {
    fn find_contact(&self, username: &str) -> Option<&Contact> {
        self.get(username)
    }
}

fn dedup_by_username(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut seen = HashSet::with_capacity(contacts.len());
    let mut kept = Vec::with_capacity(contacts.len());
    for (index, contact) in contacts.into_iter().enumerate() {
        if seen.insert(contact.key()) {
            kept.push(contact);
        } else {
            warn!(
                "event=registry_load module=repo status=skipped entity={} index={} error_code=duplicate_username",
                ENTITY, index
            );
        }
    }
    kept
}
