use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::constants::{EMPTY_OBJECT_MARKER, ERROR_TEXT, NO_DATA_TEXT};
use crate::error::ChatbotError;

// Body of the POST to the chatbot endpoint
#[derive(Serialize, Debug)]
struct ChatbotRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatbotResponse {
    response: String,
}

/// Result of one round trip to the chatbot. Failures are values, never
/// panics or early returns, so the caller can always turn them into a bot
/// message.
#[derive(Debug)]
pub enum Reply {
    Success { text: String },
    Failure { reason: ChatbotError },
}

impl From<Result<String, ChatbotError>> for Reply {
    fn from(result: Result<String, ChatbotError>) -> Self {
        match result {
            Ok(text) => Reply::Success { text },
            Err(reason) => Reply::Failure { reason },
        }
    }
}

/// Maps a reply to the text shown in the transcript.
///
/// The chatbot signals "nothing matched" with the literal string `{}`; that
/// exact string (no trimming) becomes the fixed no-data text. Every failure
/// collapses into one fixed error text.
pub fn classify(reply: &Reply) -> String {
    match reply {
        Reply::Success { text } if text == EMPTY_OBJECT_MARKER => NO_DATA_TEXT.to_string(),
        Reply::Success { text } => text.clone(),
        Reply::Failure { .. } => ERROR_TEXT.to_string(),
    }
}

/// Anything a session can send a query to.
pub trait Collaborator {
    fn ask(&self, query: &str) -> impl Future<Output = Reply> + Send;
}

/// HTTP client for the chatbot endpoint.
#[derive(Clone, Debug)]
pub struct ChatbotClient {
    http: Client,
    endpoint: String,
}

impl ChatbotClient {
    /// Builds a client for `endpoint`. Without a timeout the request waits as
    /// long as the transport does.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ChatbotError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn post_query(&self, query: &str) -> Result<String, ChatbotError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ChatbotRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Chatbot request failed");
            return Err(ChatbotError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ChatbotResponse =
            serde_json::from_str(&body).map_err(|e| ChatbotError::Decode(e.to_string()))?;

        debug!(response = ?parsed.response, "Received chatbot response");
        Ok(parsed.response)
    }
}

impl Collaborator for ChatbotClient {
    async fn ask(&self, query: &str) -> Reply {
        self.post_query(query).await.into()
    }
}
