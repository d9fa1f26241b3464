//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::config::ChatConfig;
use crate::directory::{ContactDirectory, ContactId};
use crate::scheduler::ReplyTask;
use crate::store::Sender;
use proptest::prelude::*;
use tokio::time::Instant;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Ids 1..=6 exist in the sample directory; 7..=9 do not
fn arb_contact_id() -> impl Strategy<Value = ContactId> {
    (1u64..=9).prop_map(ContactId)
}

fn arb_known_contact_id() -> impl Strategy<Value = ContactId> {
    (1u64..=6).prop_map(ContactId)
}

fn arb_selection() -> impl Strategy<Value = Selection> {
    prop_oneof![
        Just(Selection::None),
        arb_known_contact_id().prop_map(Selection::Active),
    ]
}

fn arb_blank_text() -> impl Strategy<Value = String> {
    "[ \t\n]{0,5}"
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![arb_blank_text(), "[a-zA-Z ]{1,20}",]
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    (arb_selection(), arb_text()).prop_map(|(selection, draft)| SessionState { selection, draft })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_text().prop_map(|text| Event::DraftChanged { text }),
        Just(Event::Send),
        arb_contact_id().prop_map(|contact_id| Event::Select { contact_id }),
        Just(Event::ClearSelection),
        (arb_known_contact_id(), "[a-z]{1,10}", any::<u64>()).prop_map(|(target, text, seq)| {
            Event::ReplyDue {
                task: ReplyTask {
                    target,
                    fire_at: Instant::now(),
                    text,
                    seq,
                },
            }
        }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A blank draft never produces effects or clears the composer
    #[test]
    fn blank_draft_send_is_noop(selection in arb_selection(), draft in arb_blank_text()) {
        let directory = ContactDirectory::sample();
        let config = ChatConfig::default();
        let ctx = SessionContext::new(&directory, &config);
        let state = SessionState { selection, draft };

        let result = transition(&state, &ctx, Event::Send).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        prop_assert!(result.effects.is_empty());
    }

    /// With nothing selected, Send never touches any timeline
    #[test]
    fn unselected_send_is_noop(draft in arb_text()) {
        let directory = ContactDirectory::sample();
        let config = ChatConfig::default();
        let ctx = SessionContext::new(&directory, &config);
        let state = SessionState { selection: Selection::None, draft };

        let result = transition(&state, &ctx, Event::Send).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        prop_assert!(result.effects.is_empty());
    }

    /// A valid send appends the draft to the selected contact, clears the
    /// draft and schedules exactly one reply for the same contact
    #[test]
    fn valid_send_commits_to_selected(id in arb_known_contact_id(), draft in "[a-zA-Z]{1,10}") {
        let directory = ContactDirectory::sample();
        let config = ChatConfig::default();
        let ctx = SessionContext::new(&directory, &config);
        let state = SessionState { selection: Selection::Active(id), draft: draft.clone() };

        let result = transition(&state, &ctx, Event::Send).unwrap();
        prop_assert_eq!(result.new_state.draft.as_str(), "");
        prop_assert_eq!(result.new_state.selection, Selection::Active(id));

        let appends: Vec<_> = result.effects.iter().filter_map(|e| match e {
            Effect::AppendMessage { contact_id, text, sender } => Some((*contact_id, text.clone(), *sender)),
            _ => None,
        }).collect();
        prop_assert_eq!(appends, vec![(id, draft, Sender::Me)]);

        let replies: Vec<ContactId> = result.effects.iter().filter_map(|e| match e {
            Effect::ScheduleReply { contact_id, .. } => Some(*contact_id),
            _ => None,
        }).collect();
        prop_assert_eq!(replies, vec![id]);
    }

    /// Reply delivery ignores the current selection entirely
    #[test]
    fn reply_targets_bound_contact(state in arb_state(), target in arb_known_contact_id()) {
        let directory = ContactDirectory::sample();
        let config = ChatConfig::default();
        let ctx = SessionContext::new(&directory, &config);
        let task = ReplyTask { target, fire_at: Instant::now(), text: "r".to_string(), seq: 0 };

        let result = transition(&state, &ctx, Event::ReplyDue { task }).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        prop_assert_eq!(result.effects, vec![Effect::append_reply(target, "r")]);
    }

    /// Only ids present in the directory can become the selection
    #[test]
    fn selection_is_always_known(events in proptest::collection::vec(arb_event(), 1..30)) {
        let directory = ContactDirectory::sample();
        let config = ChatConfig::default();
        let ctx = SessionContext::new(&directory, &config);
        let mut state = SessionState::default();

        for event in events {
            let before = state.clone();
            match transition(&state, &ctx, event) {
                Ok(result) => state = result.new_state,
                Err(TransitionError::UnknownContact(id)) => {
                    prop_assert!(!directory.contains(id));
                    prop_assert_eq!(&state, &before);
                }
            }
            if let Selection::Active(id) = state.selection {
                prop_assert!(directory.contains(id));
            }
        }
    }

    /// Every outgoing append is paired with a reply for the same contact,
    /// in the same order
    #[test]
    fn outgoing_and_replies_pair_up(events in proptest::collection::vec(arb_event(), 1..40)) {
        let directory = ContactDirectory::sample();
        let config = ChatConfig::default();
        let ctx = SessionContext::new(&directory, &config);
        let mut state = SessionState::default();
        let mut outgoing = Vec::new();
        let mut scheduled = Vec::new();

        for event in events {
            let Ok(result) = transition(&state, &ctx, event) else { continue };
            for effect in &result.effects {
                match effect {
                    Effect::AppendMessage { contact_id, sender: Sender::Me, text } => {
                        prop_assert!(!text.trim().is_empty());
                        outgoing.push(*contact_id);
                    }
                    Effect::ScheduleReply { contact_id, .. } => scheduled.push(*contact_id),
                    _ => {}
                }
            }
            state = result.new_state;
        }

        prop_assert_eq!(outgoing, scheduled);
    }
}
