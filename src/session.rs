use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{classify, Collaborator, Reply};
use crate::error::SubmitRejected;
use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

/// Handed out by [`ChatSession::begin_submit`] and consumed by
/// [`ChatSession::complete_submit`]. Holds the query exactly as typed.
#[derive(Debug)]
#[must_use = "an exchange must be completed or the session stays busy"]
pub struct PendingExchange {
    query: String,
}

impl PendingExchange {
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Conversation state for one client: the transcript and the text currently
/// in the input field.
///
/// The transcript is append-only. Every accepted submission adds a user
/// message immediately and a bot message once the reply is in, so after a
/// completed exchange the transcript has grown by exactly two entries.
#[derive(Debug)]
pub struct ChatSession {
    pending_query: String,
    messages: Vec<Message>,
    state: SessionState,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            pending_query: String::new(),
            messages: Vec::new(),
            state: SessionState::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn pending_query(&self) -> &str {
        &self.pending_query
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == SessionState::AwaitingResponse
    }

    pub fn update_query_text(&mut self, new_text: impl Into<String>) {
        self.pending_query = new_text.into();
    }

    /// First half of a submission: validates the input, appends the user
    /// message and marks the session busy.
    ///
    /// Whitespace-only input and input arriving while a reply is outstanding
    /// are rejected without touching the transcript or the pending query.
    pub fn begin_submit(
        &mut self,
        raw_input: impl Into<String>,
    ) -> Result<PendingExchange, SubmitRejected> {
        let raw_input = raw_input.into();
        if raw_input.trim().is_empty() {
            debug!("Ignoring empty query");
            return Err(SubmitRejected::Empty);
        }
        if self.is_awaiting() {
            warn!("Submission rejected while awaiting a reply");
            return Err(SubmitRejected::Busy);
        }

        self.messages.push(Message::user(raw_input.clone()));
        self.state = SessionState::AwaitingResponse;
        Ok(PendingExchange { query: raw_input })
    }

    /// Second half of a submission: appends the bot message for `reply`,
    /// clears the pending query and returns to idle.
    pub fn complete_submit(&mut self, exchange: PendingExchange, reply: Reply) -> &Message {
        if let Reply::Failure { reason } = &reply {
            error!(query = %exchange.query, error = %reason, "Error fetching data");
        }

        self.messages.push(Message::bot(classify(&reply)));
        self.pending_query.clear();
        self.state = SessionState::Idle;

        &self.messages[self.messages.len() - 1]
    }

    /// Sends `raw_input` to `collaborator` and records the exchange. Returns
    /// the bot message that was appended.
    #[instrument(skip_all)]
    pub async fn submit_query<C: Collaborator>(
        &mut self,
        collaborator: &C,
        raw_input: impl Into<String>,
    ) -> Result<&Message, SubmitRejected> {
        let exchange = self.begin_submit(raw_input)?;
        info!(query = %exchange.query(), "Submitting query");
        let reply = collaborator.ask(exchange.query()).await;
        Ok(self.complete_submit(exchange, reply))
    }

    /// Submits whatever is currently in the input field.
    pub async fn submit_pending<C: Collaborator>(
        &mut self,
        collaborator: &C,
    ) -> Result<&Message, SubmitRejected> {
        let raw_input = self.pending_query.clone();
        self.submit_query(collaborator, raw_input).await
    }
}
