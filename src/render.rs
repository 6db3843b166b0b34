// Projection of a session into what the page, the JSON API and the terminal
// display. Pure function of the session state.

use serde::Serialize;

use crate::constants::{INPUT_PLACEHOLDER, PAGE_TITLE};
use crate::message::{Message, Sender};
use crate::session::{ChatSession, SessionState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptRow {
    pub index: usize,
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptView {
    pub title: &'static str,
    pub placeholder: &'static str,
    pub messages: Vec<TranscriptRow>,
    pub pending_query: String,
    pub state: SessionState,
    /// False while a reply is outstanding; the page disables its send button.
    pub can_submit: bool,
}

pub fn transcript_view(session: &ChatSession) -> TranscriptView {
    TranscriptView {
        title: PAGE_TITLE,
        placeholder: INPUT_PLACEHOLDER,
        messages: session
            .messages()
            .iter()
            .enumerate()
            .map(|(index, message)| TranscriptRow {
                index,
                sender: message.sender,
                text: message.text.clone(),
            })
            .collect(),
        pending_query: session.pending_query().to_string(),
        state: session.state(),
        can_submit: !session.is_awaiting(),
    }
}

/// One terminal line for a transcript entry, e.g. `bot> 120 MWh`.
pub fn terminal_line(message: &Message) -> String {
    format!("{}> {}", message.sender, message.text)
}
