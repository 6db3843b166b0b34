// Terminal front end over the same ChatSession the web UI uses. Each line
// typed is put in the input field and submitted; the next line is only read
// once the reply is in.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::client::Collaborator;
use crate::constants::{INPUT_PLACEHOLDER, PAGE_TITLE};
use crate::render::terminal_line;
use crate::session::ChatSession;

const QUIT_COMMAND: &str = "/quit";

/// Runs an interactive session on stdin/stdout.
pub async fn run_chat<C: Collaborator>(collaborator: &C) -> Result<ChatSession> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_chat_with(collaborator, stdin, &mut stdout).await
}

pub async fn run_chat_with<C, R, W>(collaborator: &C, input: R, out: &mut W) -> Result<ChatSession>
where
    C: Collaborator,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    info!("Starting chat session...");
    writeln!(out, "{} ({}, {} to exit)", PAGE_TITLE, INPUT_PLACEHOLDER, QUIT_COMMAND)?;
    out.flush()?;

    let mut session = ChatSession::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.trim() == QUIT_COMMAND {
            break;
        }

        session.update_query_text(line);
        match session.submit_pending(collaborator).await {
            Ok(reply) => writeln!(out, "{}", terminal_line(reply))?,
            Err(rejected) => debug!(%rejected, "Skipping input line"),
        }
        out.flush()?;
    }

    info!(messages = session.messages().len(), "Chat session finished");
    Ok(session)
}

/// Submits one query and returns the bot text, or `None` for a blank query.
pub async fn ask_once<C: Collaborator>(collaborator: &C, query: String) -> Option<String> {
    let mut session = ChatSession::new();
    session.update_query_text(query);
    let reply = session.submit_pending(collaborator).await.ok()?;
    Some(reply.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Reply;
    use crate::message::Message;

    struct EchoBot;

    impl Collaborator for EchoBot {
        async fn ask(&self, query: &str) -> Reply {
            Reply::Success {
                text: format!("echo: {}", query.trim()),
            }
        }
    }

    #[tokio::test]
    async fn test_chat_loop_submits_each_line() {
        let input: &[u8] = b"solar\n   \nelectricity\n";
        let mut out = Vec::new();

        let session = run_chat_with(&EchoBot, input, &mut out).await.unwrap();

        assert_eq!(
            session.messages(),
            &[
                Message::user("solar"),
                Message::bot("echo: solar"),
                Message::user("electricity"),
                Message::bot("echo: electricity"),
            ]
        );
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Energy Chatbot"));
        assert!(printed.contains("bot> echo: solar\n"));
        assert!(printed.contains("bot> echo: electricity\n"));
    }

    #[tokio::test]
    async fn test_chat_loop_stops_on_quit() {
        let input: &[u8] = b"solar\n/quit\nelectricity\n";
        let mut out = Vec::new();

        let session = run_chat_with(&EchoBot, input, &mut out).await.unwrap();

        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_ask_once() {
        assert_eq!(
            ask_once(&EchoBot, "solar".to_string()).await.as_deref(),
            Some("echo: solar")
        );
        assert_eq!(ask_once(&EchoBot, "  ".to_string()).await, None);
    }
}
