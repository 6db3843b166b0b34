use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router, serve,
};
use futures::{sink::SinkExt, stream::StreamExt};
use minijinja::{context, path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, net::SocketAddr, sync::Arc};
use tokio::sync::{broadcast, Mutex};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::client::{ChatbotClient, Collaborator};
use crate::constants::ERROR_TEXT;
use crate::error::SubmitRejected;
use crate::message::Message;
use crate::render::{transcript_view, TranscriptView};
use crate::session::ChatSession;

// Pushed to every open page whenever the transcript changes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub message_type: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub templates_dir: String,
    pub static_dir: String,
}

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    session: Arc<Mutex<ChatSession>>,
    client: ChatbotClient,
    // Channel for broadcasting appended messages to all connected WebSocket clients
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
}

impl AppState {
    pub fn new(client: ChatbotClient, templates_dir: &str) -> Result<Self> {
        let templates =
            create_minijinja_env(templates_dir).context("Failed to initialize template engine")?;
        let (broadcast_tx, _) = broadcast::channel::<BroadcastMessage>(100);
        Ok(Self {
            templates: Arc::new(templates),
            session: Arc::new(Mutex::new(ChatSession::new())),
            client,
            broadcast_tx,
        })
    }

    pub fn session(&self) -> Arc<Mutex<ChatSession>> {
        self.session.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.broadcast_tx.subscribe()
    }

    fn announce(&self, index: usize, message: &Message) {
        let update = BroadcastMessage {
            message_type: "MessageAppended".to_string(),
            payload: serde_json::json!({
                "index": index,
                "sender": message.sender,
                "text": message.text,
            }),
        };
        if self.broadcast_tx.send(update).is_err() {
            debug!("No WebSocket clients to notify");
        }
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: &str) -> Result<AutoReloader> {
    let templates_dir = templates_dir.to_string();
    let reloader = AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(templates_dir.clone()));
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    });
    Ok(reloader)
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, Response> {
    let view = transcript_view(&*state.session.lock().await);

    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html")
                .and_then(|tmpl| tmpl.render(context! { view => view }))
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
                .into_response()
        })
}

/// Appends the user message, releases the session while the chatbot is
/// asked, then appends the bot message. Returns the bot message.
///
/// The ask and the completion run in their own task so the exchange still
/// finishes if the HTTP client goes away mid-request.
async fn run_submission(
    state: &AppState,
    raw_input: Option<String>,
) -> Result<Message, SubmitRejected> {
    let exchange = {
        let mut session = state.session.lock().await;
        let raw_input = raw_input.unwrap_or_else(|| session.pending_query().to_string());
        let exchange = session.begin_submit(raw_input)?;
        let index = session.messages().len() - 1;
        state.announce(index, &session.messages()[index]);
        exchange
    };

    let task_state = state.clone();
    let completion = tokio::spawn(async move {
        info!(query = %exchange.query(), "Forwarding query to chatbot");
        let reply = task_state.client.ask(exchange.query()).await;

        let mut session = task_state.session.lock().await;
        let message = session.complete_submit(exchange, reply).clone();
        task_state.announce(session.messages().len() - 1, &message);
        message
    });

    Ok(completion.await.unwrap_or_else(|e| {
        error!("Submission task failed: {:?}", e);
        Message::bot(ERROR_TEXT)
    }))
}

#[derive(Debug, Deserialize)]
struct SubmitForm {
    query: Option<String>,
}

async fn submit_form_handler(
    State(state): State<AppState>,
    Form(form): Form<SubmitForm>,
) -> Redirect {
    if let Err(rejected) = run_submission(&state, form.query).await {
        debug!(%rejected, "Form submission ignored");
    }
    Redirect::to("/")
}

async fn session_handler(State(state): State<AppState>) -> Json<TranscriptView> {
    Json(transcript_view(&*state.session.lock().await))
}

#[derive(Debug, Deserialize)]
struct UpdateQuery {
    text: String,
}

async fn update_query_handler(
    State(state): State<AppState>,
    Json(update): Json<UpdateQuery>,
) -> Json<TranscriptView> {
    let mut session = state.session.lock().await;
    session.update_query_text(update.text);
    Json(transcript_view(&session))
}

#[derive(Debug, Default, Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    reply: Message,
    session: TranscriptView,
}

async fn submit_api_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Response {
    match run_submission(&state, request.query).await {
        Ok(reply) => {
            let session = transcript_view(&*state.session.lock().await);
            Json(SubmitResponse { reply, session }).into_response()
        }
        Err(rejected) => {
            let status = match rejected {
                SubmitRejected::Empty => StatusCode::UNPROCESSABLE_ENTITY,
                SubmitRejected::Busy => StatusCode::CONFLICT,
            };
            (
                status,
                Json(serde_json::json!({ "error": rejected.to_string() })),
            )
                .into_response()
        }
    }
}

// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

// Forward transcript updates to one WebSocket client until it goes away
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("New WebSocket connection established");
    let mut broadcast_rx = state.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let welcome_msg = BroadcastMessage {
        message_type: "Connected".to_string(),
        payload: serde_json::json!({ "message": "Connected to Energy Chatbot" }),
    };
    if let Ok(json_msg) = serde_json::to_string(&welcome_msg) {
        if sender.send(WsMessage::Text(json_msg)).await.is_err() {
            warn!("Failed to send welcome message to new WebSocket client");
            return;
        }
    }

    loop {
        tokio::select! {
            update = broadcast_rx.recv() => {
                match update {
                    Ok(msg) => {
                        let Ok(json_msg) = serde_json::to_string(&msg) else {
                            error!("Failed to serialize broadcast message");
                            continue;
                        };
                        if sender.send(WsMessage::Text(json_msg)).await.is_err() {
                            warn!("WebSocket client disconnected or send error. Closing connection.");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket client fell behind on transcript updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(WsMessage::Text(text))) => {
                        debug!("Ignoring text message from client: {}", text);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }
    info!("WebSocket connection closed");
}

pub fn build_router(state: AppState, static_dir: &str) -> Router {
    let static_files_service = ServeDir::new(static_dir).not_found_service(tower::service_fn(
        |_req: Request| async {
            Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        },
    ));

    Router::new()
        .route("/", get(index_handler))
        .route("/submit", post(submit_form_handler))
        .route("/api/session", get(session_handler))
        .route("/api/query", axum::routing::put(update_query_handler))
        .route("/api/submit", post(submit_api_handler))
        .route("/ws", get(ws_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(config: ServerConfig, client: ChatbotClient) -> Result<()> {
    info!(chatbot = %client.endpoint(), "Using chatbot endpoint");
    let state = AppState::new(client, &config.templates_dir)?;
    let app = build_router(state, &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
