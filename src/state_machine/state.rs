//! Session state types

use crate::config::ChatConfig;
use crate::directory::{ContactDirectory, ContactId};
use serde::{Deserialize, Serialize};

/// Which conversation is open, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "contact_id", rename_all = "snake_case")]
pub enum Selection {
    /// No conversation open; sends are ignored
    #[default]
    None,
    /// Exactly one conversation open
    Active(ContactId),
}

impl Selection {
    pub fn contact_id(self) -> Option<ContactId> {
        match self {
            Selection::None => None,
            Selection::Active(id) => Some(id),
        }
    }
}

/// Mutable UI-facing state: the open conversation and the composer draft
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub selection: Selection,
    /// Uncommitted composer text
    pub draft: String,
}

impl SessionState {
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_draft(mut self, draft: impl Into<String>) -> Self {
        self.draft = draft.into();
        self
    }
}

/// Read-only inputs to a transition
#[derive(Debug, Clone, Copy)]
pub struct SessionContext<'a> {
    pub directory: &'a ContactDirectory,
    pub config: &'a ChatConfig,
}

impl<'a> SessionContext<'a> {
    pub fn new(directory: &'a ContactDirectory, config: &'a ChatConfig) -> Self {
        Self { directory, config }
    }
}
