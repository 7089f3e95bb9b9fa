//! Lendable item domain model.
//!
//! # Responsibility
//! - Define the lendable thing and its availability state.
//! - Keep status and borrower in one consistent pair.
//!
//! # Invariants
//! - `title` is trimmed and never empty.
//! - `status == Borrowed` if and only if `borrower` is set.
//! - Status changes happen only through `mark_available` / `mark_borrowed`;
//!   borrower existence is checked by the owning registry.

use crate::model::contact::{Contact, ContactRecord, ContactValidationError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable handle for one item.
///
/// Titles are not unique, so callers that need to address an item across
/// reorderings use this handle instead of its position.
pub type ItemId = Uuid;

/// Availability state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    Available,
    Borrowed,
}

impl ItemStatus {
    /// Stable wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Borrowed => "Borrowed",
        }
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for item construction and persisted item records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyTitle,
    /// Record says `Borrowed` but carries no borrower.
    MissingBorrower,
    /// Record says `Available` but still carries a borrower.
    UnexpectedBorrower,
    InvalidBorrower(ContactValidationError),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "item title must not be blank"),
            Self::MissingBorrower => write!(f, "borrowed item must have a borrower"),
            Self::UnexpectedBorrower => write!(f, "available item must not have a borrower"),
            Self::InvalidBorrower(err) => write!(f, "invalid borrower: {err}"),
        }
    }
}

impl Error for ItemValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBorrower(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContactValidationError> for ItemValidationError {
    fn from(value: ContactValidationError) -> Self {
        Self::InvalidBorrower(value)
    }
}

/// Lendable item with availability status and optional borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord", into = "ItemRecord")]
pub struct Item {
    id: ItemId,
    title: String,
    description: String,
    status: ItemStatus,
    borrower: Option<Contact>,
}

/// Persisted wire shape of an item.
///
/// `id` is optional so records written before item handles existed still
/// load; they receive a fresh handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ItemStatus,
    #[serde(default)]
    pub borrower: Option<ContactRecord>,
    #[serde(default)]
    pub id: Option<ItemId>,
}

impl Item {
    /// Creates an available item with a generated handle.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ItemValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            title: normalize_title(title.into())?,
            description: description.into().trim().to_string(),
            status: ItemStatus::Available,
            borrower: None,
        })
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn borrower(&self) -> Option<&Contact> {
        self.borrower.as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Available
    }

    /// Returns whether this item is currently lent to `username`.
    pub fn is_borrowed_by(&self, username: &str) -> bool {
        self.status == ItemStatus::Borrowed
            && self
                .borrower
                .as_ref()
                .is_some_and(|borrower| borrower.matches_username(username))
    }

    /// Replaces title and description; nothing changes when the title is blank.
    pub fn set_details(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), ItemValidationError> {
        let title = normalize_title(title.into())?;
        self.title = title;
        self.description = description.into().trim().to_string();
        Ok(())
    }

    /// Gives this item a newly generated handle.
    pub(crate) fn assign_fresh_id(&mut self) {
        self.id = Uuid::new_v4();
    }

    /// Sets `Available` and clears the borrower. Idempotent.
    pub(crate) fn mark_available(&mut self) {
        self.status = ItemStatus::Available;
        self.borrower = None;
    }

    /// Sets `Borrowed` with `borrower`, overwriting any previous borrower.
    pub(crate) fn mark_borrowed(&mut self, borrower: Contact) {
        self.status = ItemStatus::Borrowed;
        self.borrower = Some(borrower);
    }
}

impl TryFrom<ItemRecord> for Item {
    type Error = ItemValidationError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        let borrower = record.borrower.map(Contact::try_from).transpose()?;
        match (record.status, borrower.is_some()) {
            (ItemStatus::Borrowed, false) => return Err(ItemValidationError::MissingBorrower),
            (ItemStatus::Available, true) => return Err(ItemValidationError::UnexpectedBorrower),
            _ => {}
        }

        Ok(Self {
            id: record.id.unwrap_or_else(Uuid::new_v4),
            title: normalize_title(record.title)?,
            description: record.description.trim().to_string(),
            status: record.status,
            borrower,
        })
    }
}

impl From<Item> for ItemRecord {
    fn from(item: Item) -> Self {
        Self {
            title: item.title,
            description: item.description,
            status: item.status,
            borrower: item.borrower.map(ContactRecord::from),
            id: Some(item.id),
        }
    }
}

/// Trims an item title and rejects blank input.
pub fn normalize_title(value: impl Into<String>) -> Result<String, ItemValidationError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ItemValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}
