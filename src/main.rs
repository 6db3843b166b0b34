use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

use energy_chat::{chat, constants, web_server, ChatbotClient};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[arg(long, global = true, env = "ENERGY_CHAT_URL", help = "Chatbot endpoint URL.")]
    chatbot_url: Option<String>,
    #[arg(
        long,
        global = true,
        env = "ENERGY_CHAT_TIMEOUT_SECS",
        help = "Give up on a chatbot request after this many seconds."
    )]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the chat page and its API.
    Serve {
        #[arg(long, env = "ENERGY_CHAT_PORT", default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, help = "Directory holding index.html.")]
        templates: Option<String>,
        #[arg(long = "static", help = "Directory served under /static.")]
        static_dir: Option<String>,
    },
    /// Chat with the energy chatbot in the terminal.
    Chat,
    /// Send a single query and print the reply.
    Ask {
        #[arg(help = "The question to send.")]
        query: String,
    },
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ENERGY_CHAT_URL, ENERGY_CHAT_PORT, ...)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,energy_chat=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Energy chat starting with command: {:?}", cli.command);

    let endpoint = cli
        .chatbot_url
        .unwrap_or_else(|| constants::CHATBOT_URL.clone());
    let client = ChatbotClient::new(endpoint, cli.timeout_secs.map(Duration::from_secs))
        .context("Failed to build chatbot client")?;

    match cli.command {
        Commands::Serve {
            port,
            templates,
            static_dir,
        } => {
            let config = web_server::ServerConfig {
                port,
                templates_dir: templates.unwrap_or_else(|| constants::TEMPLATES_DIR.clone()),
                static_dir: static_dir.unwrap_or_else(|| constants::STATIC_DIR.clone()),
            };
            info!("Starting web server on port {}...", port);

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(config, client).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat => {
            chat::run_chat(&client)
                .await
                .context("Chat session failed")?;
        }
        Commands::Ask { query } => {
            if let Some(reply) = chat::ask_once(&client, query).await {
                println!("{}", reply);
            }
        }
    }

    Ok(())
}
