//! Pure state transition function
//!
//! Send pipeline: Idle -> Validate -> Commit -> Schedule Reply -> Idle.
//! Validation failures are silent no-ops: the state is returned unchanged and
//! no effects are produced.

use super::{Effect, Event, Selection, SessionContext, SessionState};
use crate::directory::ContactId;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// No state change, no effects
    pub fn unchanged(state: &SessionState) -> Self {
        Self::new(state.clone())
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Unknown contact: {0}")]
    UnknownContact(ContactId),
}

/// Why a send was dropped at the Validate step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    EmptyDraft,
    NoSelection,
}

/// Validate step of the send pipeline
pub fn validate_send(state: &SessionState) -> Result<ContactId, SendRejection> {
    if state.draft.trim().is_empty() {
        return Err(SendRejection::EmptyDraft);
    }
    state.selection.contact_id().ok_or(SendRejection::NoSelection)
}

/// Pure transition function
///
/// Given the same inputs, always produces the same outputs, with no I/O.
pub fn transition(
    state: &SessionState,
    context: &SessionContext<'_>,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Composer
        // ============================================================
        Event::DraftChanged { text } => {
            if text == state.draft {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(
                TransitionResult::new(state.clone().with_draft(text.clone()))
                    .with_effect(Effect::NotifyDraft { draft: text }),
            )
        }

        Event::Send => match validate_send(state) {
            Err(reason) => {
                tracing::debug!(?reason, "Send ignored");
                Ok(TransitionResult::unchanged(state))
            }
            // The reply target is captured here by value; later selection
            // changes do not affect it
            Ok(contact_id) => Ok(TransitionResult::new(state.clone().with_draft(String::new()))
                .with_effect(Effect::append_outgoing(contact_id, state.draft.clone()))
                .with_effect(Effect::NotifyDraft {
                    draft: String::new(),
                })
                .with_effect(Effect::ScheduleReply {
                    contact_id,
                    delay: context.config.reply_delay(),
                    text: context.config.reply_text.clone(),
                })),
        },

        // ============================================================
        // Selection
        // ============================================================
        Event::Select { contact_id } => {
            if !context.directory.contains(contact_id) {
                return Err(TransitionError::UnknownContact(contact_id));
            }
            let selection = Selection::Active(contact_id);
            if state.selection == selection {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(TransitionResult::new(state.clone().with_selection(selection))
                .with_effect(Effect::NotifySelection { selection }))
        }

        Event::ClearSelection => {
            if state.selection == Selection::None {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(TransitionResult::new(state.clone().with_selection(Selection::None))
                .with_effect(Effect::NotifySelection {
                    selection: Selection::None,
                }))
        }

        // ============================================================
        // Reply delivery
        // ============================================================

        // Delivered to the task's own target, whatever is selected now
        Event::ReplyDue { task } => {
            Ok(TransitionResult::unchanged(state)
                .with_effect(Effect::append_reply(task.target, task.text)))
        }
    }
}
