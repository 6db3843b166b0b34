use thiserror::Error;

/// Why a call to the chatbot endpoint produced no usable reply. Only ever
/// logged; the user sees a fixed message instead.
#[derive(Debug, Error)]
pub enum ChatbotError {
    #[error("request to chatbot failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chatbot answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected chatbot response body: {0}")]
    Decode(String),
}

/// A submission that was turned away before anything was appended or sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("query is empty")]
    Empty,
    #[error("still waiting for the previous reply")]
    Busy,
}
