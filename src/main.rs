//! Glass Chat - single-user chat with a simulated counterpart
//!
//! A contact directory, per-contact timelines and delayed auto-replies,
//! driven from the terminal.

mod clock;
mod config;
mod directory;
mod driver;
mod runtime;
mod scheduler;
mod search;
mod session;
mod state_machine;
mod store;

use clock::{Clock, SystemClock};
use config::ChatConfig;
use directory::{Contact, ContactDirectory};
use driver::Input;
use runtime::{ChatHandle, RuntimeError};
use session::{ChatSession, ViewEvent};
use state_machine::Selection;
use std::sync::Arc;
use store::ConversationStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the chat on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glass_chat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Configuration
    let config = ChatConfig::from_env()?;
    tracing::info!(
        reply_delay_ms = config.reply_delay_ms,
        directory = ?config.directory_path,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let session = match &config.directory_path {
        Some(path) => {
            let directory = ContactDirectory::load(path)?;
            if directory.is_empty() {
                tracing::warn!(path = %path.display(), "Contacts file has no contacts");
            } else {
                tracing::info!(path = %path.display(), contacts = directory.len(), "Contacts loaded");
            }
            let store = ConversationStore::new(Arc::clone(&clock));
            ChatSession::new(directory, store, config.clone(), clock)?
        }
        None => ChatSession::demo(config.clone(), clock)?,
    };

    let shutdown = CancellationToken::new();
    let (handle, runtime) = runtime::spawn(session, shutdown.clone());

    let contacts = handle.visible_contacts("").await?;
    let printer = tokio::spawn(print_messages(handle.subscribe(), contacts.clone()));

    println!("{}\n", driver::HELP);
    print!("{}", driver::render_contacts(&contacts, Selection::None));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&handle, &line).await? {
                    break;
                }
            }
        }
    }

    shutdown.cancel();
    runtime.await?;
    printer.abort();
    Ok(())
}

/// Apply one input line; returns false when the user asked to quit
async fn handle_line(handle: &ChatHandle, line: &str) -> Result<bool, RuntimeError> {
    let input = match driver::parse_line(line) {
        Ok(input) => input,
        Err(e) => {
            println!("{e}");
            return Ok(true);
        }
    };

    match input {
        Input::Contacts => {
            let contacts = handle.visible_contacts("").await?;
            print!("{}", driver::render_contacts(&contacts, selection_of(handle).await?));
        }
        Input::Search(query) => {
            let contacts = handle.visible_contacts(query).await?;
            print!("{}", driver::render_contacts(&contacts, selection_of(handle).await?));
        }
        Input::Open(contact_id) => match handle.select(contact_id).await {
            Ok(()) => show_active(handle).await?,
            Err(RuntimeError::Transition(e)) => println!("{e}"),
            Err(e) => return Err(e),
        },
        Input::Back => {
            handle.clear_selection().await?;
            println!("Conversation closed.");
        }
        Input::Show => show_active(handle).await?,
        Input::Draft(text) => handle.set_draft(text).await?,
        Input::Commit => {
            if handle.active_contact().await?.is_none() {
                println!("Open a conversation first (/open <id>).");
            }
            handle.commit_draft().await?;
        }
        Input::Help => println!("{}", driver::HELP),
        Input::Quit => return Ok(false),
        Input::Message(text) => {
            if !text.trim().is_empty() && handle.active_contact().await?.is_none() {
                println!("Open a conversation first (/open <id>).");
            }
            handle.send(text).await?;
        }
    }
    Ok(true)
}

async fn selection_of(handle: &ChatHandle) -> Result<Selection, RuntimeError> {
    Ok(handle
        .active_contact()
        .await?
        .map_or(Selection::None, |c| Selection::Active(c.id)))
}

async fn show_active(handle: &ChatHandle) -> Result<(), RuntimeError> {
    match handle.active_contact().await? {
        Some(contact) => {
            let messages = handle.timeline(contact.id).await?;
            print!("{}", driver::render_timeline(&contact, &messages));
            if handle.is_typing(contact.id).await? {
                println!("  {} is typing...", contact.display_name);
            }
            let draft = handle.draft().await?;
            if !draft.is_empty() {
                println!("  draft: {draft}");
            }
        }
        None => println!("No conversation open."),
    }
    Ok(())
}

/// Print every appended message, including replies that arrive while the
/// user is idle or looking at another conversation
async fn print_messages(
    mut events: tokio::sync::broadcast::Receiver<ViewEvent>,
    contacts: Vec<Contact>,
) {
    loop {
        match events.recv().await {
            Ok(ViewEvent::MessageAppended {
                contact_id,
                message,
            }) => {
                if let Some(contact) = contacts.iter().find(|c| c.id == contact_id) {
                    println!(
                        "[{}]{}",
                        contact.display_name,
                        driver::render_message(contact, &message)
                    );
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Message printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
