//! Chat runtime executor

use super::Command;
use crate::session::{ChatSession, ViewEvent};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Event loop that owns a session
pub struct ChatRuntime {
    session: ChatSession,
    command_rx: mpsc::Receiver<Command>,
    broadcast_tx: broadcast::Sender<ViewEvent>,
    shutdown: CancellationToken,
}

impl ChatRuntime {
    pub fn new(
        session: ChatSession,
        command_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<ViewEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            session,
            command_rx,
            broadcast_tx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            contacts = self.session.directory().len(),
            "Starting chat runtime"
        );

        loop {
            let deadline = self.session.next_reply_deadline();

            tokio::select! {
                () = self.shutdown.cancelled() => break,
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let events = self.session.deliver_due();
                    self.publish(events);
                }
            }
        }

        tracing::info!(
            messages = self.session.message_count(),
            pending_replies = self.session.pending_replies(),
            "Chat runtime stopped"
        );
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetDraft { text } => {
                let events = self.session.set_draft(text);
                self.publish(events);
            }
            Command::CommitDraft => {
                let events = self.session.commit_draft();
                self.publish(events);
            }
            Command::Send { text } => {
                let events = self.session.send(text);
                self.publish(events);
            }
            Command::Select { contact_id, reply } => {
                let result = self.session.select(contact_id).map(|events| {
                    self.publish(events);
                });
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Selection rejected");
                }
                let _ = reply.send(result);
            }
            Command::ClearSelection => {
                let events = self.session.clear_selection();
                self.publish(events);
            }
            Command::VisibleContacts { query, reply } => {
                let contacts = self
                    .session
                    .visible_contacts(&query)
                    .into_iter()
                    .cloned()
                    .collect();
                let _ = reply.send(contacts);
            }
            Command::ActiveContact { reply } => {
                let _ = reply.send(self.session.active_contact().cloned());
            }
            Command::Timeline { contact_id, reply } => {
                let _ = reply.send(self.session.timeline(contact_id).to_vec());
            }
            Command::Draft { reply } => {
                let _ = reply.send(self.session.draft().to_string());
            }
            Command::IsTyping { contact_id, reply } => {
                let _ = reply.send(self.session.is_typing(contact_id));
            }
        }
    }

    fn publish(&self, events: Vec<ViewEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.broadcast_tx.send(event);
        }
    }
}
