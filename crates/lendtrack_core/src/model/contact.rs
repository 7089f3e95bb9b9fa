//! Contact domain model.
//!
//! # Responsibility
//! - Define the person record that items can be lent to.
//! - Own username normalization used as the identity key everywhere.
//!
//! # Invariants
//! - `username` and `email` are trimmed and never empty.
//! - Identity is `normalize_username(username)`; `email` and `id` never
//!   participate in lookup.
//! - Deserialization runs the same validation as construction.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Returns the identity key for a username: trimmed and lowercased.
///
/// Every case-insensitive comparison in the registries goes through this
/// function instead of an overridden equality.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Validation errors for contact fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    EmptyUsername,
    EmptyEmail,
    /// Email supplied through an edit path lacks `@`.
    MalformedEmail(String),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be blank"),
            Self::EmptyEmail => write!(f, "email must not be blank"),
            Self::MalformedEmail(value) => {
                write!(f, "email must be an email address: `{value}`")
            }
        }
    }
}

impl Error for ContactValidationError {}

/// Person that items can be lent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContactRecord", into = "ContactRecord")]
pub struct Contact {
    username: String,
    email: String,
    id: Option<String>,
}

/// Persisted wire shape of a contact: `{username, email, id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl Contact {
    /// Creates a contact from raw user input.
    ///
    /// Both fields are trimmed; blank values are rejected. The email format is
    /// not checked here, see [`validate_edited_email`].
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ContactValidationError> {
        Self::with_id(username, email, None)
    }

    /// Creates a contact carrying a legacy opaque `id`.
    pub fn with_id(
        username: impl Into<String>,
        email: impl Into<String>,
        id: Option<String>,
    ) -> Result<Self, ContactValidationError> {
        Ok(Self {
            username: trimmed_username(username.into())?,
            email: trimmed_email(email.into())?,
            id,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Identity key of this contact.
    pub fn key(&self) -> String {
        normalize_username(&self.username)
    }

    /// Returns whether `username` names this contact, ignoring case and
    /// surrounding whitespace.
    pub fn matches_username(&self, username: &str) -> bool {
        self.key() == normalize_username(username)
    }

    /// Returns whether both contacts share the same identity key.
    pub fn same_identity(&self, other: &Contact) -> bool {
        self.key() == other.key()
    }

    /// Replaces the email after edit-path validation.
    pub fn set_email(&mut self, email: impl Into<String>) -> Result<(), ContactValidationError> {
        self.email = validate_edited_email(email.into())?;
        Ok(())
    }
}

impl Display for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

impl TryFrom<ContactRecord> for Contact {
    type Error = ContactValidationError;

    fn try_from(record: ContactRecord) -> Result<Self, Self::Error> {
        Self::with_id(record.username, record.email, record.id)
    }
}

impl From<Contact> for ContactRecord {
    fn from(contact: Contact) -> Self {
        Self {
            username: contact.username,
            email: contact.email,
            id: contact.id,
        }
    }
}

/// Validates an email supplied through an edit path.
///
/// Returns the trimmed value. Rejects blank input and input without `@`;
/// the format is otherwise unchecked.
pub fn validate_edited_email(email: impl Into<String>) -> Result<String, ContactValidationError> {
    let trimmed = trimmed_email(email.into())?;
    if !trimmed.contains('@') {
        return Err(ContactValidationError::MalformedEmail(trimmed));
    }
    Ok(trimmed)
}

fn trimmed_username(value: String) -> Result<String, ContactValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ContactValidationError::EmptyUsername);
    }
    Ok(trimmed.to_string())
}

fn trimmed_email(value: String) -> Result<String, ContactValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ContactValidationError::EmptyEmail);
    }
    Ok(trimmed.to_string())
}
