//! Effects produced by state transitions

use crate::directory::ContactId;
use crate::store::Sender;
use crate::state_machine::state::Selection;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to a contact's timeline
    AppendMessage {
        contact_id: ContactId,
        text: String,
        sender: Sender,
    },

    /// Queue a counterpart reply bound to `contact_id`
    ScheduleReply {
        contact_id: ContactId,
        delay: Duration,
        text: String,
    },

    /// Tell subscribers the open conversation changed
    NotifySelection { selection: Selection },

    /// Tell subscribers the composer text changed
    NotifyDraft { draft: String },
}

impl Effect {
    pub fn append_outgoing(contact_id: ContactId, text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            contact_id,
            text: text.into(),
            sender: Sender::Me,
        }
    }

    pub fn append_reply(contact_id: ContactId, text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            contact_id,
            text: text.into(),
            sender: Sender::Counterpart,
        }
    }
}
