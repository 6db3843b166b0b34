pub mod chat;
pub mod client;
pub mod constants;
pub mod error;
pub mod message;
pub mod render;
pub mod session;
pub mod web_server;

pub use client::{classify, ChatbotClient, Collaborator, Reply};
pub use error::{ChatbotError, SubmitRejected};
pub use message::{Message, Sender};
pub use session::{ChatSession, PendingExchange, SessionState};
