//! Lending use-case service.
//!
//! # Responsibility
//! - Own one long-lived contact registry and one item registry.
//! - Translate presentation commands into registry calls and typed results.
//! - Persist the touched registry after every successful mutation.
//!
//! # Invariants
//! - Contact removal always passes the lending guard first.
//! - Validation runs before any mutation; a rejected command changes nothing.
//! - A failed save rolls the touched registries back to their state before
//!   the command.
//! - Construction performs no I/O; `reload` / `open` read storage explicitly.

use crate::model::contact::{validate_edited_email, Contact, ContactValidationError};
use crate::model::item::{normalize_title, Item, ItemId, ItemValidationError};
use crate::repo::contact_repo::ContactRegistry;
use crate::repo::item_repo::{ItemRegistry, StatusChange};
use crate::service::lending_guard::{can_remove_contact, check_remove_contact, RemovalBlocked};
use crate::storage::{StorageError, StoragePort, StorageResult};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Addresses one item either by list position or by stable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    Position(usize),
    Id(ItemId),
}

impl Display for ItemRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position(position) => write!(f, "#{position}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Boundary operations offered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LendingCommand {
    ListContacts,
    AddContact { username: String, email: String },
    UpdateContactEmail { username: String, email: String },
    /// Removal eligibility query; never mutates.
    CanRemoveContact { username: String },
    RemoveContact { username: String },
    ListItems,
    AddItem { title: String, description: String },
    UpdateItem {
        item: ItemRef,
        title: String,
        description: String,
    },
    RemoveItem { item: ItemRef },
    LendItem { item: ItemRef, borrower: String },
    ReturnItem { item: ItemRef },
    /// Re-read both registries from storage.
    Reload,
}

impl LendingCommand {
    /// Stable name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListContacts => "list_contacts",
            Self::AddContact { .. } => "add_contact",
            Self::UpdateContactEmail { .. } => "update_contact_email",
            Self::CanRemoveContact { .. } => "can_remove_contact",
            Self::RemoveContact { .. } => "remove_contact",
            Self::ListItems => "list_items",
            Self::AddItem { .. } => "add_item",
            Self::UpdateItem { .. } => "update_item",
            Self::RemoveItem { .. } => "remove_item",
            Self::LendItem { .. } => "lend_item",
            Self::ReturnItem { .. } => "return_item",
            Self::Reload => "reload",
        }
    }
}

/// Successful command result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Contacts(Vec<Contact>),
    Contact(Contact),
    Items(Vec<Item>),
    Item(Item),
    /// Result of `CanRemoveContact`.
    RemovalAllowed(bool),
    ContactRemoved(Contact),
    ItemRemoved(Item),
    Reloaded { contacts: usize, items: usize },
}

/// Rejection reasons surfaced to the presentation layer.
#[derive(Debug)]
pub enum LendingError {
    InvalidContact(ContactValidationError),
    InvalidItem(ItemValidationError),
    UsernameTaken(String),
    ContactNotFound(String),
    ItemNotFound(ItemRef),
    /// Another item already uses this handle.
    DuplicateItem(ItemId),
    /// Lend target is not a known contact.
    BorrowerNotFound(String),
    /// Contact still borrows items and may not be deleted.
    ActiveBorrower(RemovalBlocked),
    Storage(StorageError),
}

impl LendingError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidContact(_) | Self::InvalidItem(_) => "validation",
            Self::UsernameTaken(_) => "username_taken",
            Self::ContactNotFound(_) => "contact_not_found",
            Self::ItemNotFound(_) => "item_not_found",
            Self::DuplicateItem(_) => "duplicate_item",
            Self::BorrowerNotFound(_) => "borrower_not_found",
            Self::ActiveBorrower(_) => "active_borrower",
            Self::Storage(_) => "storage",
        }
    }
}

impl Display for LendingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidContact(err) => write!(f, "{err}"),
            Self::InvalidItem(err) => write!(f, "{err}"),
            Self::UsernameTaken(username) => write!(f, "username already taken: {username}"),
            Self::ContactNotFound(username) => write!(f, "contact not found: {username}"),
            Self::ItemNotFound(item) => write!(f, "item not found: {item}"),
            Self::DuplicateItem(id) => write!(f, "item handle already in use: {id}"),
            Self::BorrowerNotFound(username) => write!(f, "borrower not found: {username}"),
            Self::ActiveBorrower(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LendingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidContact(err) => Some(err),
            Self::InvalidItem(err) => Some(err),
            Self::ActiveBorrower(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContactValidationError> for LendingError {
    fn from(value: ContactValidationError) -> Self {
        Self::InvalidContact(value)
    }
}

impl From<ItemValidationError> for LendingError {
    fn from(value: ItemValidationError) -> Self {
        Self::InvalidItem(value)
    }
}

impl From<RemovalBlocked> for LendingError {
    fn from(value: RemovalBlocked) -> Self {
        Self::ActiveBorrower(value)
    }
}

impl From<StorageError> for LendingError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

pub type LendingResult<T> = Result<T, LendingError>;

/// Command handler over a contact and an item registry.
pub struct LendingService<CS: StoragePort, IS: StoragePort> {
    contacts: ContactRegistry<CS>,
    items: ItemRegistry<IS>,
}

impl<CS: StoragePort, IS: StoragePort> LendingService<CS, IS> {
    /// Creates a service with empty registries.
    pub fn new(contact_store: CS, item_store: IS) -> Self {
        Self {
            contacts: ContactRegistry::new(contact_store),
            items: ItemRegistry::new(item_store),
        }
    }

    /// Creates a service and loads both registries.
    pub fn open(contact_store: CS, item_store: IS) -> StorageResult<Self> {
        let mut service = Self::new(contact_store, item_store);
        service.reload()?;
        Ok(service)
    }

    pub fn contacts(&self) -> &ContactRegistry<CS> {
        &self.contacts
    }

    pub fn items(&self) -> &ItemRegistry<IS> {
        &self.items
    }

    /// Re-reads both registries. Returns `(contacts, items)` counts.
    pub fn reload(&mut self) -> StorageResult<(usize, usize)> {
        let contacts = self.contacts.reload()?;
        let items = self.items.reload()?;
        Ok((contacts, items))
    }

    /// Persists both registries.
    pub fn flush(&self) -> StorageResult<()> {
        self.contacts.flush()?;
        self.items.flush()
    }

    /// Executes one command.
    ///
    /// # Side effects
    /// - Successful mutations flush the touched registry.
    /// - Emits one `lending_command` log event per call.
    pub fn handle(&mut self, command: LendingCommand) -> LendingResult<CommandOutcome> {
        let name = command.name();
        let result = self.dispatch(command);
        match &result {
            Ok(_) => info!("event=lending_command module=service status=ok command={name}"),
            Err(err) => warn!(
                "event=lending_command module=service status=rejected command={name} error_code={}",
                err.code()
            ),
        }
        result
    }

    fn dispatch(&mut self, command: LendingCommand) -> LendingResult<CommandOutcome> {
        match command {
            LendingCommand::ListContacts => {
                Ok(CommandOutcome::Contacts(self.contacts.contacts().to_vec()))
            }
            LendingCommand::AddContact { username, email } => self.add_contact(username, email),
            LendingCommand::UpdateContactEmail { username, email } => {
                self.update_contact_email(&username, &email)
            }
            LendingCommand::CanRemoveContact { username } => {
                let contact = self.require_contact(&username)?;
                Ok(CommandOutcome::RemovalAllowed(can_remove_contact(
                    contact,
                    &self.items,
                )))
            }
            LendingCommand::RemoveContact { username } => self.remove_contact(&username),
            LendingCommand::ListItems => Ok(CommandOutcome::Items(self.items.items().to_vec())),
            LendingCommand::AddItem { title, description } => {
                let item = Item::new(title, description)?;
                let snapshot = self.items.items().to_vec();
                if !self.items.add(item.clone()) {
                    return Err(LendingError::DuplicateItem(item.id()));
                }
                self.commit_items(snapshot)?;
                Ok(CommandOutcome::Item(item))
            }
            LendingCommand::UpdateItem {
                item,
                title,
                description,
            } => {
                normalize_title(title.as_str())?;
                let position = self.resolve_item(item)?;
                let snapshot = self.items.items().to_vec();
                if !self.items.update_details(position, &title, &description) {
                    return Err(LendingError::ItemNotFound(item));
                }
                self.commit_items(snapshot)?;
                self.item_outcome(position, item)
            }
            LendingCommand::RemoveItem { item } => {
                let position = self.resolve_item(item)?;
                let snapshot = self.items.items().to_vec();
                let removed = self
                    .items
                    .remove(position)
                    .ok_or(LendingError::ItemNotFound(item))?;
                self.commit_items(snapshot)?;
                Ok(CommandOutcome::ItemRemoved(removed))
            }
            LendingCommand::LendItem { item, borrower } => self.lend_item(item, borrower),
            LendingCommand::ReturnItem { item } => {
                let position = self.resolve_item(item)?;
                let snapshot = self.items.items().to_vec();
                if !self
                    .items
                    .set_status(position, StatusChange::Available, &self.contacts)
                {
                    return Err(LendingError::ItemNotFound(item));
                }
                self.commit_items(snapshot)?;
                self.item_outcome(position, item)
            }
            LendingCommand::Reload => {
                let (contacts, items) = self.reload()?;
                Ok(CommandOutcome::Reloaded { contacts, items })
            }
        }
    }

    fn add_contact(&mut self, username: String, email: String) -> LendingResult<CommandOutcome> {
        let contact = Contact::new(username, email)?;
        let snapshot = self.contacts.contacts().to_vec();
        if !self.contacts.add(contact.clone()) {
            return Err(LendingError::UsernameTaken(contact.username().to_string()));
        }
        self.commit_contacts(snapshot)?;
        Ok(CommandOutcome::Contact(contact))
    }

    fn update_contact_email(&mut self, username: &str, email: &str) -> LendingResult<CommandOutcome> {
        let email = validate_edited_email(email)?;
        let mut updated = self.require_contact(username)?.clone();
        updated.set_email(email)?;

        let contacts_before = self.contacts.contacts().to_vec();
        let items_before = self.items.items().to_vec();
        if !self.contacts.update_email(username, updated.email()) {
            return Err(LendingError::ContactNotFound(username.trim().to_string()));
        }
        let touched = self.items.refresh_borrower(&updated);

        if let Err(err) = self.flush_email_edit(touched > 0) {
            self.contacts.restore(contacts_before);
            self.items.restore(items_before);
            // The contacts blob may already hold the new email.
            if let Err(resync) = self.contacts.flush() {
                error!(
                    "event=registry_resync module=service status=error entity=contact error={resync}"
                );
            }
            return Err(err.into());
        }
        Ok(CommandOutcome::Contact(updated))
    }

    fn flush_email_edit(&self, items_touched: bool) -> StorageResult<()> {
        self.contacts.flush()?;
        if items_touched {
            self.items.flush()?;
        }
        Ok(())
    }

    fn remove_contact(&mut self, username: &str) -> LendingResult<CommandOutcome> {
        let contact = self.require_contact(username)?.clone();
        check_remove_contact(&contact, &self.items)?;
        let snapshot = self.contacts.contacts().to_vec();
        if !self.contacts.remove(contact.username()) {
            return Err(LendingError::ContactNotFound(username.to_string()));
        }
        self.commit_contacts(snapshot)?;
        Ok(CommandOutcome::ContactRemoved(contact))
    }

    fn lend_item(&mut self, item: ItemRef, borrower: String) -> LendingResult<CommandOutcome> {
        if borrower.trim().is_empty() {
            return Err(ContactValidationError::EmptyUsername.into());
        }
        let position = self.resolve_item(item)?;
        let snapshot = self.items.items().to_vec();
        let change = StatusChange::Borrowed {
            borrower: borrower.clone(),
        };
        if !self.items.set_status(position, change, &self.contacts) {
            return Err(LendingError::BorrowerNotFound(borrower));
        }
        self.commit_items(snapshot)?;
        self.item_outcome(position, item)
    }

    /// Saves contacts, or restores `snapshot` when the save fails.
    fn commit_contacts(&mut self, snapshot: Vec<Contact>) -> LendingResult<()> {
        if let Err(err) = self.contacts.flush() {
            self.contacts.restore(snapshot);
            return Err(err.into());
        }
        Ok(())
    }

    /// Saves items, or restores `snapshot` when the save fails.
    fn commit_items(&mut self, snapshot: Vec<Item>) -> LendingResult<()> {
        if let Err(err) = self.items.flush() {
            self.items.restore(snapshot);
            return Err(err.into());
        }
        Ok(())
    }

    fn require_contact(&self, username: &str) -> LendingResult<&Contact> {
        self.contacts
            .get(username)
            .ok_or_else(|| LendingError::ContactNotFound(username.trim().to_string()))
    }

    fn resolve_item(&self, item: ItemRef) -> LendingResult<usize> {
        let position = match item {
            ItemRef::Position(position) => Some(position).filter(|p| *p < self.items.len()),
            ItemRef::Id(id) => self.items.position_of(id),
        };
        position.ok_or(LendingError::ItemNotFound(item))
    }

    fn item_outcome(&self, position: usize, item: ItemRef) -> LendingResult<CommandOutcome> {
        self.items
            .get(position)
            .cloned()
            .map(CommandOutcome::Item)
            .ok_or(LendingError::ItemNotFound(item))
    }
}
