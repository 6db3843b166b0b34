// Fixed texts shown to the user and defaults that can be overridden from the
// environment (or a .env file loaded in main).

use std::env;

/// Reply text the collaborator uses to say a lookup matched nothing.
pub const EMPTY_OBJECT_MARKER: &str = "{}";

pub const NO_DATA_TEXT: &str = "No data found for the specified criteria.";
pub const ERROR_TEXT: &str = "Error fetching data. Please try again later.";

pub const PAGE_TITLE: &str = "Energy Chatbot";
pub const INPUT_PLACEHOLDER: &str = "Ask about solar or electricity data...";

pub const DEFAULT_PORT: u16 = 9900;

lazy_static::lazy_static! {
    pub static ref CHATBOT_URL: String = env::var("ENERGY_CHAT_URL").unwrap_or_else(|_| "http://localhost:5000/chatbot".to_string());
    pub static ref TEMPLATES_DIR: String = env::var("ENERGY_CHAT_TEMPLATES").unwrap_or_else(|_| "templates".to_string());
    pub static ref STATIC_DIR: String = env::var("ENERGY_CHAT_STATIC").unwrap_or_else(|_| "static".to_string());
}
