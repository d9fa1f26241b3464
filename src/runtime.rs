//! Runtime hosting a chat session
//!
//! A single actor task owns the `ChatSession`. Commands from the rendering
//! layer and reply deadlines are serialized through its event loop, so
//! appends land in completion order without locking the store.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;

use crate::directory::{Contact, ContactId};
use crate::session::{ChatSession, ViewEvent};
use crate::state_machine::TransitionError;
use crate::store::Message;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Chat runtime has stopped")]
    Closed,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Requests handled by the runtime's event loop
#[derive(Debug)]
pub enum Command {
    SetDraft {
        text: String,
    },
    CommitDraft,
    Send {
        text: String,
    },
    Select {
        contact_id: ContactId,
        reply: oneshot::Sender<Result<(), TransitionError>>,
    },
    ClearSelection,
    VisibleContacts {
        query: String,
        reply: oneshot::Sender<Vec<Contact>>,
    },
    ActiveContact {
        reply: oneshot::Sender<Option<Contact>>,
    },
    Timeline {
        contact_id: ContactId,
        reply: oneshot::Sender<Vec<Message>>,
    },
    Draft {
        reply: oneshot::Sender<String>,
    },
    IsTyping {
        contact_id: ContactId,
        reply: oneshot::Sender<bool>,
    },
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct ChatHandle {
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<ViewEvent>,
}

/// Start a runtime for `session` on the current tokio runtime
pub fn spawn(session: ChatSession, shutdown: CancellationToken) -> (ChatHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = ChatRuntime::new(session, command_rx, broadcast_tx.clone(), shutdown);
    let join = tokio::spawn(async move {
        runtime.run().await;
    });

    (
        ChatHandle {
            command_tx,
            broadcast_tx,
        },
        join,
    )
}

impl ChatHandle {
    async fn submit(&self, command: Command) -> Result<(), RuntimeError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::Closed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.submit(make(tx)).await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.submit(Command::SetDraft { text: text.into() }).await
    }

    /// Commit the composer's current text
    pub async fn commit_draft(&self) -> Result<(), RuntimeError> {
        self.submit(Command::CommitDraft).await
    }

    pub async fn send(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.submit(Command::Send { text: text.into() }).await
    }

    pub async fn select(&self, contact_id: ContactId) -> Result<(), RuntimeError> {
        self.request(|reply| Command::Select { contact_id, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    pub async fn clear_selection(&self) -> Result<(), RuntimeError> {
        self.submit(Command::ClearSelection).await
    }

    pub async fn visible_contacts(&self, query: impl Into<String>) -> Result<Vec<Contact>, RuntimeError> {
        let query = query.into();
        self.request(|reply| Command::VisibleContacts { query, reply })
            .await
    }

    pub async fn active_contact(&self) -> Result<Option<Contact>, RuntimeError> {
        self.request(|reply| Command::ActiveContact { reply }).await
    }

    pub async fn timeline(&self, contact_id: ContactId) -> Result<Vec<Message>, RuntimeError> {
        self.request(|reply| Command::Timeline { contact_id, reply })
            .await
    }

    pub async fn draft(&self) -> Result<String, RuntimeError> {
        self.request(|reply| Command::Draft { reply }).await
    }

    /// Whether a reply to `contact_id` is still pending
    pub async fn is_typing(&self, contact_id: ContactId) -> Result<bool, RuntimeError> {
        self.request(|reply| Command::IsTyping { contact_id, reply })
            .await
    }

    /// Subscribe to view updates
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.broadcast_tx.subscribe()
    }
}
