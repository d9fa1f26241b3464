//! Line-oriented terminal front end
//!
//! Plain lines are typed into the composer and committed, like pressing
//! Enter in the chat pane. Lines starting with `/` are commands.

use crate::directory::{Contact, ContactId};
use crate::state_machine::Selection;
use crate::store::{Message, Sender};
use std::fmt::Write as _;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  /contacts           list all contacts
  /search <text>      list contacts whose name contains <text>
  /open <id>          open the conversation with contact <id>
  /back               close the open conversation
  /show               print the open conversation
  /draft <text>       type <text> into the composer without sending
  /send               send the composer text
  /help               show this help
  /quit               exit
Any other line is sent to the open conversation.";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Contacts,
    Search(String),
    Open(ContactId),
    Back,
    Show,
    Help,
    Quit,
    /// Replace the composer text
    Draft(String),
    /// Commit the composer text
    Commit,
    /// Text for the composer, committed immediately
    Message(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command: /{0} (try /help)")]
    UnknownCommand(String),
    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("Not a contact id: {0}")]
    InvalidId(String),
}

pub fn parse_line(line: &str) -> Result<Input, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Message(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "contacts" | "ls" => Ok(Input::Contacts),
        // The search query keeps inner spaces but not the separator
        "search" | "s" => Ok(Input::Search(arg.to_string())),
        "open" | "o" => {
            if arg.is_empty() {
                return Err(ParseError::MissingArgument("open"));
            }
            arg.parse::<u64>()
                .map(|id| Input::Open(ContactId(id)))
                .map_err(|_| ParseError::InvalidId(arg.to_string()))
        }
        "back" => Ok(Input::Back),
        "show" => Ok(Input::Show),
        "draft" => Ok(Input::Draft(arg.to_string())),
        "send" => Ok(Input::Commit),
        "help" | "?" => Ok(Input::Help),
        "quit" | "q" | "exit" => Ok(Input::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Contact list with the open conversation marked
pub fn render_contacts(contacts: &[Contact], selection: Selection) -> String {
    if contacts.is_empty() {
        return "No contacts match.\n".to_string();
    }
    let mut out = String::new();
    for contact in contacts {
        let marker = if selection == Selection::Active(contact.id) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} [{:>2}] {:<16} {:<10} {}",
            contact.id, contact.display_name, contact.last_activity, contact.preview_text
        );
    }
    out
}

pub fn render_message(contact: &Contact, message: &Message) -> String {
    let who = match message.sender {
        Sender::Me => "me",
        Sender::Counterpart => contact.display_name.as_str(),
    };
    format!("  {}  {who}: {}", message.timestamp, message.text)
}

/// Conversation header followed by the timeline
pub fn render_timeline(contact: &Contact, messages: &[Message]) -> String {
    let mut out = format!("--- {} ---\n", contact.display_name);
    if messages.is_empty() {
        out.push_str("  (no messages yet)\n");
    }
    for message in messages {
        out.push_str(&render_message(contact, message));
        out.push('\n');
    }
    out
}
