//! Chat session
//!
//! Owns the directory, conversation store, reply scheduler and UI state, and
//! exposes the operations the rendering layer calls. Every mutation goes
//! through the pure `transition` function; this type executes the effects.

use crate::clock::Clock;
use crate::config::{ChatConfig, ConfigError};
use crate::directory::{Contact, ContactDirectory, ContactId};
use crate::scheduler::ReplyScheduler;
use crate::search;
use crate::state_machine::{
    transition, Effect, Event, Selection, SessionContext, SessionState, TransitionError,
};
use crate::store::{ConversationStore, Message};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

/// Change notifications for the rendering layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    MessageAppended {
        contact_id: ContactId,
        message: Message,
    },
    SelectionChanged {
        selection: Selection,
    },
    DraftChanged {
        draft: String,
    },
}

pub struct ChatSession {
    directory: ContactDirectory,
    store: ConversationStore,
    scheduler: ReplyScheduler,
    state: SessionState,
    config: ChatConfig,
    clock: Arc<dyn Clock>,
}

impl ChatSession {
    /// Fails if `config` would produce blank replies
    pub fn new(
        directory: ContactDirectory,
        store: ConversationStore,
        config: ChatConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            directory,
            store,
            scheduler: ReplyScheduler::new(),
            state: SessionState::default(),
            config,
            clock,
        })
    }

    /// Sample directory with the seeded demo conversation
    pub fn demo(config: ChatConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let store = ConversationStore::seeded(Arc::clone(&clock));
        Self::new(ContactDirectory::sample(), store, config, clock)
    }

    // ==================== Reads ====================

    pub fn visible_contacts(&self, query: &str) -> Vec<&Contact> {
        search::filter(self.directory.list(), query)
    }

    pub fn active_contact(&self) -> Option<&Contact> {
        self.state
            .selection
            .contact_id()
            .and_then(|id| self.directory.find_by_id(id))
    }

    #[allow(dead_code)] // Read through active_contact() outside tests
    pub fn selection(&self) -> Selection {
        self.state.selection
    }

    pub fn timeline(&self, contact_id: ContactId) -> &[Message] {
        self.store.timeline(contact_id)
    }

    pub fn draft(&self) -> &str {
        &self.state.draft
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    pub fn message_count(&self) -> usize {
        self.store.message_count()
    }

    pub fn pending_replies(&self) -> usize {
        self.scheduler.pending()
    }

    /// Whether the counterpart still owes `contact_id` a reply
    pub fn is_typing(&self, contact_id: ContactId) -> bool {
        self.scheduler.pending_for(contact_id) > 0
    }

    pub fn next_reply_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    // ==================== Writes ====================

    pub fn set_draft(&mut self, text: impl Into<String>) -> Vec<ViewEvent> {
        self.dispatch_infallible(Event::DraftChanged { text: text.into() })
    }

    /// Commit the current draft to the active conversation
    pub fn commit_draft(&mut self) -> Vec<ViewEvent> {
        self.dispatch_infallible(Event::Send)
    }

    /// Put `text` in the composer and commit it
    pub fn send(&mut self, text: impl Into<String>) -> Vec<ViewEvent> {
        let mut events = self.set_draft(text);
        events.extend(self.commit_draft());
        events
    }

    pub fn select(&mut self, contact_id: ContactId) -> Result<Vec<ViewEvent>, TransitionError> {
        self.dispatch(Event::Select { contact_id })
    }

    pub fn clear_selection(&mut self) -> Vec<ViewEvent> {
        self.dispatch_infallible(Event::ClearSelection)
    }

    /// Deliver every reply whose deadline has passed on the session clock
    pub fn deliver_due(&mut self) -> Vec<ViewEvent> {
        let due = self.scheduler.pop_due(self.clock.now());
        let mut events = Vec::new();
        for task in due {
            tracing::debug!(contact_id = %task.target, seq = task.seq, "Delivering reply");
            events.extend(self.dispatch_infallible(Event::ReplyDue { task }));
        }
        events
    }

    // ==================== Effect execution ====================

    fn dispatch(&mut self, event: Event) -> Result<Vec<ViewEvent>, TransitionError> {
        let context = SessionContext::new(&self.directory, &self.config);
        let result = transition(&self.state, &context, event)?;

        self.state = result.new_state;
        Ok(result
            .effects
            .into_iter()
            .filter_map(|effect| self.execute_effect(effect))
            .collect())
    }

    fn dispatch_infallible(&mut self, event: Event) -> Vec<ViewEvent> {
        self.dispatch(event).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Unexpected transition error");
            Vec::new()
        })
    }

    fn execute_effect(&mut self, effect: Effect) -> Option<ViewEvent> {
        match effect {
            Effect::AppendMessage {
                contact_id,
                text,
                sender,
            } => {
                let message = self.store.append(contact_id, text, sender);
                tracing::debug!(contact_id = %contact_id, ?sender, "Message appended");
                Some(ViewEvent::MessageAppended {
                    contact_id,
                    message,
                })
            }

            Effect::ScheduleReply {
                contact_id,
                delay,
                text,
            } => {
                let task = self
                    .scheduler
                    .schedule(contact_id, self.clock.now() + delay, text);
                tracing::debug!(
                    contact_id = %contact_id,
                    seq = task.seq,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Reply scheduled"
                );
                None
            }

            Effect::NotifySelection { selection } => {
                Some(ViewEvent::SelectionChanged { selection })
            }

            Effect::NotifyDraft { draft } => Some(ViewEvent::DraftChanged { draft }),
        }
    }
}
