//! Test doubles and harness for the chat runtime
//!
//! `ManualClock` drives session-level tests without sleeping. Runtime tests
//! run on a paused tokio clock so reply delays elapse instantly.

use super::{spawn, ChatHandle};
use crate::clock::{Clock, SystemClock};
use crate::config::ChatConfig;
use crate::directory::{Contact, ContactDirectory, ContactId};
use crate::session::{ChatSession, ViewEvent};
use crate::store::{ConversationStore, Message, Sender};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Manual Clock
// ============================================================================

/// Clock that only moves when told to
pub struct ManualClock {
    inner: Mutex<(Instant, DateTime<Local>)>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    /// Start with a fixed wall-clock time
    pub fn at(local: DateTime<Local>) -> Self {
        Self {
            inner: Mutex::new((Instant::now(), local)),
        }
    }

    /// Move both monotonic and wall-clock time forward
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.0 += by;
        inner.1 += chrono::Duration::from_std(by).unwrap();
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap().0
    }

    fn local_time(&self) -> DateTime<Local> {
        self.inner.lock().unwrap().1
    }
}

// ============================================================================
// Test Runtime Builder
// ============================================================================

/// A running session plus a subscription opened before any command
pub struct TestRuntime {
    pub handle: ChatHandle,
    pub events: broadcast::Receiver<ViewEvent>,
    pub shutdown: CancellationToken,
    pub join: tokio::task::JoinHandle<()>,
}

pub struct TestRuntimeBuilder {
    contacts: Vec<Contact>,
    config: ChatConfig,
    seeded: bool,
}

impl TestRuntime {
    pub fn builder() -> TestRuntimeBuilder {
        TestRuntimeBuilder {
            contacts: ContactDirectory::sample().list().to_vec(),
            config: ChatConfig::default(),
            seeded: false,
        }
    }
}

impl TestRuntimeBuilder {
    pub fn contacts(mut self, contacts: Vec<Contact>) -> Self {
        self.contacts = contacts;
        self
    }

    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seeded(mut self) -> Self {
        self.seeded = true;
        self
    }

    pub fn build(self) -> TestRuntime {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let directory = ContactDirectory::new(self.contacts).expect("valid test contacts");
        let store = if self.seeded {
            ConversationStore::seeded(Arc::clone(&clock))
        } else {
            ConversationStore::new(Arc::clone(&clock))
        };
        let session =
            ChatSession::new(directory, store, self.config, clock).expect("valid test config");

        let shutdown = CancellationToken::new();
        let (handle, join) = spawn(session, shutdown.clone());
        let events = handle.subscribe();

        TestRuntime {
            handle,
            events,
            shutdown,
            join,
        }
    }
}

impl TestRuntime {
    /// Wait for the next appended message, skipping other view events
    pub async fn next_message(&mut self, timeout: Duration) -> Option<(ContactId, Message)> {
        let deadline = Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Ok(ViewEvent::MessageAppended {
                    contact_id,
                    message,
                })) => return Some((contact_id, message)),
                Ok(Ok(_)) => continue,
                _ => return None,
            }
        }
    }

    pub async fn timeline(&self, contact_id: u64) -> Vec<(String, Sender)> {
        self.handle
            .timeline(ContactId(contact_id))
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.text, m.sender))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_REPLY_TEXT;
    use crate::runtime::RuntimeError;
    use crate::state_machine::{Selection, TransitionError};

    fn me(text: &str) -> (String, Sender) {
        (text.to_string(), Sender::Me)
    }

    fn reply() -> (String, Sender) {
        (DEFAULT_REPLY_TEXT.to_string(), Sender::Counterpart)
    }

    #[test]
    fn test_manual_clock_advances_both_clocks() {
        let clock = ManualClock::new();
        let (start, wall) = (clock.now(), clock.local_time());
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now() - start, Duration::from_secs(90));
        assert_eq!((clock.local_time() - wall).num_seconds(), 90);
    }

    /// Directory = [Arlene], select, send, reply after the delay
    #[tokio::test(start_paused = true)]
    async fn test_send_and_delayed_reply() {
        let mut rt = TestRuntime::builder()
            .contacts(vec![Contact::new(1, "Arlene McCoy")])
            .build();

        rt.handle.select(ContactId(1)).await.unwrap();
        rt.handle.send("hi").await.unwrap();
        assert_eq!(rt.timeline(1).await, vec![me("hi")]);
        assert_eq!(rt.handle.draft().await.unwrap(), "");

        let (contact, message) = rt.next_message(Duration::from_secs(1)).await.unwrap();
        assert_eq!(contact, ContactId(1));
        assert_eq!(message.sender, Sender::Me);

        // Nothing more until the 2s delay passes
        assert!(rt.next_message(Duration::from_millis(1900)).await.is_none());

        let (contact, message) = rt.next_message(Duration::from_secs(1)).await.unwrap();
        assert_eq!(contact, ContactId(1));
        assert_eq!(message.sender, Sender::Counterpart);
        assert_eq!(rt.timeline(1).await, vec![me("hi"), reply()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_lands_on_original_contact() {
        let mut rt = TestRuntime::builder().build();

        rt.handle.select(ContactId(1)).await.unwrap();
        rt.handle.send("to arlene").await.unwrap();
        rt.handle.select(ContactId(3)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(rt.timeline(1).await, vec![me("to arlene"), reply()]);
        assert!(rt.timeline(3).await.is_empty());
        assert_eq!(
            rt.handle.active_contact().await.unwrap().map(|c| c.id),
            Some(ContactId(3))
        );

        let mut appended = Vec::new();
        while let Some((contact, message)) = rt.next_message(Duration::from_millis(10)).await {
            appended.push((contact, message.sender));
        }
        assert_eq!(
            appended,
            vec![
                (ContactId(1), Sender::Me),
                (ContactId(1), Sender::Counterpart)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_delay_replies_keep_commit_order() {
        let config = ChatConfig::default().with_reply_delay(Duration::from_millis(1000));
        let rt = TestRuntime::builder().config(config).build();

        rt.handle.select(ContactId(2)).await.unwrap();
        rt.handle.send("a").await.unwrap();
        rt.handle.send("b").await.unwrap();
        rt.handle.select(ContactId(5)).await.unwrap();
        rt.handle.send("c").await.unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(rt.timeline(2).await, vec![me("a"), me("b"), reply(), reply()]);
        assert_eq!(rt.timeline(5).await, vec![me("c"), reply()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guards_are_silent() {
        let rt = TestRuntime::builder().build();

        // No selection
        rt.handle.send("nobody listening").await.unwrap();
        // Blank draft
        rt.handle.select(ContactId(1)).await.unwrap();
        rt.handle.send("  ").await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;

        for id in 1..=6 {
            assert!(rt.timeline(id).await.is_empty(), "contact {id} got a message");
        }
        assert_eq!(rt.handle.draft().await.unwrap(), "  ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_draft_then_commit() {
        let rt = TestRuntime::builder().build();

        rt.handle.select(ContactId(4)).await.unwrap();
        rt.handle.set_draft("typed slowly").await.unwrap();
        assert_eq!(rt.handle.draft().await.unwrap(), "typed slowly");

        rt.handle.commit_draft().await.unwrap();
        assert_eq!(rt.timeline(4).await, vec![me("typed slowly")]);
        assert_eq!(rt.handle.draft().await.unwrap(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_unknown_contact() {
        let mut rt = TestRuntime::builder().build();

        let err = rt.handle.select(ContactId(77)).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Transition(TransitionError::UnknownContact(ContactId(77)))
        ));
        assert!(rt.handle.active_contact().await.unwrap().is_none());

        rt.handle.select(ContactId(2)).await.unwrap();
        match rt.events.recv().await.unwrap() {
            ViewEvent::SelectionChanged { selection } => {
                assert_eq!(selection, Selection::Active(ContactId(2)));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_contacts_and_seed() {
        let rt = TestRuntime::builder().seeded().build();

        let all = rt.handle.visible_contacts("").await.unwrap();
        assert_eq!(all.len(), 6);
        let hits = rt.handle.visible_contacts("COOPER").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, ContactId(5));

        assert_eq!(rt.timeline(2).await.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_fails_after_shutdown() {
        let rt = TestRuntime::builder().build();
        rt.handle.select(ContactId(1)).await.unwrap();
        rt.handle.send("pending").await.unwrap();

        rt.shutdown.cancel();
        rt.join.await.unwrap();

        assert!(matches!(
            rt.handle.timeline(ContactId(1)).await,
            Err(RuntimeError::Closed)
        ));
    }
}
