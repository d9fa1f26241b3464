//! Conversation store
//!
//! Per-contact, append-only message timelines. `append` is the only mutation;
//! messages are never edited, removed, reordered or deduplicated.

use crate::clock::Clock;
use crate::directory::ContactId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Two-digit 12-hour time with lowercase meridiem, e.g. `08:20 pm`
pub const TIMESTAMP_FORMAT: &str = "%I:%M %P";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The local user
    Me,
    /// The contact on the other side of the conversation
    Counterpart,
}

/// A single timeline entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    /// Formatted creation time, stamped by the store
    pub timestamp: String,
}

impl Message {
    fn seed(text: &str, sender: Sender, timestamp: &str) -> Self {
        Self {
            text: text.to_string(),
            sender,
            timestamp: timestamp.to_string(),
        }
    }
}

pub struct ConversationStore {
    timelines: HashMap<ContactId, Vec<Message>>,
    clock: Arc<dyn Clock>,
}

impl ConversationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            timelines: HashMap::new(),
            clock,
        }
    }

    /// Store pre-populated with the demo conversation for contact 2
    pub fn seeded(clock: Arc<dyn Clock>) -> Self {
        let mut store = Self::new(clock);
        store.timelines.insert(
            ContactId(2),
            vec![
                Message::seed(
                    "Hey there! 😊 I've been feeling quite overwhelmed lately with work.",
                    Sender::Counterpart,
                    "04:15 am",
                ),
                Message::seed("When will the contract be sent?", Sender::Counterpart, "06:15 am"),
                Message::seed("Paperless opt-in email sent", Sender::Me, "08:20 pm"),
                Message::seed(
                    "Amante de cinema e viciado em pipoca! 🍿🎬",
                    Sender::Me,
                    "08:20 pm",
                ),
            ],
        );
        store
    }

    /// Messages for a contact in append order; empty if none were recorded
    pub fn timeline(&self, contact_id: ContactId) -> &[Message] {
        self.timelines
            .get(&contact_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Stamp and append a message, returning the stored copy
    pub fn append(
        &mut self,
        contact_id: ContactId,
        text: impl Into<String>,
        sender: Sender,
    ) -> Message {
        let message = Message {
            text: text.into(),
            sender,
            timestamp: self.clock.local_time().format(TIMESTAMP_FORMAT).to_string(),
        };
        debug_assert!(!message.text.trim().is_empty(), "blank message appended");

        self.timelines
            .entry(contact_id)
            .or_default()
            .push(message.clone());
        message
    }

    /// Total messages across all timelines
    pub fn message_count(&self) -> usize {
        self.timelines.values().map(Vec::len).sum()
    }
}
