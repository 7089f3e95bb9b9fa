//! Cross-registry removal policy for contacts.
//!
//! # Invariants
//! - Pure queries: nothing here mutates either registry.
//! - A contact is blocked iff its normalized username is among the item
//!   registry's active borrowers.

use crate::model::contact::Contact;
use crate::repo::item_repo::ItemRegistry;
use crate::storage::StoragePort;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Removal refused because the contact still holds items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalBlocked {
    pub username: String,
    /// Titles of the items the contact currently borrows.
    pub item_titles: Vec<String>,
}

impl Display for RemovalBlocked {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot delete active borrower `{}` (still holds: {})",
            self.username,
            self.item_titles.join(", ")
        )
    }
}

impl Error for RemovalBlocked {}

/// Returns whether `contact` may be removed from the contact registry.
pub fn can_remove_contact<S: StoragePort>(contact: &Contact, items: &ItemRegistry<S>) -> bool {
    !items
        .active_borrowers()
        .iter()
        .any(|borrower| borrower.same_identity(contact))
}

/// Like [`can_remove_contact`], but explains a refusal.
pub fn check_remove_contact<S: StoragePort>(
    contact: &Contact,
    items: &ItemRegistry<S>,
) -> Result<(), RemovalBlocked> {
    if can_remove_contact(contact, items) {
        return Ok(());
    }
    Err(RemovalBlocked {
        username: contact.username().to_string(),
        item_titles: items
            .items_borrowed_by(contact.username())
            .into_iter()
            .map(|item| item.title().to_string())
            .collect(),
    })
}
