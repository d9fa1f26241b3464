//! Contact directory
//!
//! The read-only set of conversation partners. Contacts keep their insertion
//! order, which is also the display order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stable contact identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub u64);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ContactId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A potential conversation partner
///
/// Serialized field names follow the contact feed format (`name`, `text`,
/// `time`, `avatar`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Last-known snippet, informational only
    #[serde(rename = "text", default)]
    pub preview_text: String,
    /// Display-formatted last activity ("Now", "4:45pm", "Yesterday")
    #[serde(rename = "time", default)]
    pub last_activity: String,
    /// Avatar image reference, resolved by the rendering layer
    #[serde(rename = "avatar", default)]
    pub avatar_ref: String,
}

impl Contact {
    pub fn new(id: impl Into<ContactId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            preview_text: String::new(),
            last_activity: String::new(),
            avatar_ref: String::new(),
        }
    }

    #[must_use]
    pub fn with_preview(mut self, text: impl Into<String>, last_activity: impl Into<String>) -> Self {
        self.preview_text = text.into();
        self.last_activity = last_activity.into();
        self
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar_ref: impl Into<String>) -> Self {
        self.avatar_ref = avatar_ref.into();
        self
    }
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to read contacts file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid contacts JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate contact id: {0}")]
    DuplicateId(ContactId),
    #[error("Contact {0} has an empty display name")]
    EmptyName(ContactId),
}

/// Ordered, read-only contact list with unique ids
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    contacts: Vec<Contact>,
}

impl ContactDirectory {
    /// Build a directory, rejecting duplicate ids and blank names
    pub fn new(contacts: Vec<Contact>) -> Result<Self, DirectoryError> {
        let mut seen = HashSet::with_capacity(contacts.len());
        for contact in &contacts {
            if contact.display_name.trim().is_empty() {
                return Err(DirectoryError::EmptyName(contact.id));
            }
            if !seen.insert(contact.id) {
                return Err(DirectoryError::DuplicateId(contact.id));
            }
        }
        Ok(Self { contacts })
    }

    /// Parse a JSON array of contacts
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let contacts: Vec<Contact> = serde_json::from_str(json)?;
        Self::new(contacts)
    }

    /// Load a JSON array of contacts from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The built-in demo directory
    pub fn sample() -> Self {
        let contacts = vec![
            Contact::new(1, "Arlene McCoy")
                .with_preview("It's really nice.", "Now")
                .with_avatar("https://tapback.co/api/avatar/arlene"),
            Contact::new(2, "Guy Hawkins")
                .with_preview("Are you there?", "4:45pm")
                .with_avatar("https://tapback.co/api/avatar/john"),
            Contact::new(3, "Courtney Henry")
                .with_preview("Hello?", "5:00pm")
                .with_avatar("https://tapback.co/api/avatar/joy"),
            Contact::new(4, "Jerome Bell")
                .with_preview("Hello?", "Yesterday")
                .with_avatar("https://tapback.co/api/avatar/henry"),
            Contact::new(5, "Jane Cooper")
                .with_preview("Okay...", "13 Mar")
                .with_avatar("https://tapback.co/api/avatar/cooper"),
            Contact::new(6, "Dianne Russell")
                .with_preview("Hello? intereste...", "2 Jan")
                .with_avatar("https://tapback.co/api/avatar/russell"),
        ];
        Self { contacts }
    }

    pub fn list(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn find_by_id(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ContactId) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
