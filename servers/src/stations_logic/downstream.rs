use crate::stations_logic::model::{ClientEvent, ServerEvent};
use crate::stations_logic::state::AppState;
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use lib_stations::ClientId;
use lib_stations::chat::{ChatConversation, ChatError};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tower_http::cors::CorsLayer;

/// A finished chat call hands the conversation back together with the reply.
type ChatDone = (ChatConversation, Option<ServerEvent>);

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn run(
    port: u16,
    app_state: AppState,
    shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Downstream server listening on {}", addr);
    serve(listener, app_state, shutdown).await
}

/// Serves on an already bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    app_state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(app_state))
        .with_graceful_shutdown(async move {
            shutdown.recv().await.ok();
            log::info!("Downstream server shutting down.");
        })
        .await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn health_handler() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "OK")
}

enum Step {
    Incoming(Option<Result<Message, axum::Error>>),
    Tick,
    ChatDone(ChatDone),
}

/// Everything one connection knows besides its socket.
struct Connection {
    client_id: ClientId,
    state: AppState,
    // Started by the first valid location, dropped with the connection
    ticker: Option<Interval>,
    // Taken while a chat call is in flight
    conversation: Option<ChatConversation>,
    chat_tx: mpsc::Sender<ChatDone>,
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = state.hub.connect();
    let (mut sender, mut receiver) = socket.split();
    let (chat_tx, mut chat_rx) = mpsc::channel::<ChatDone>(1);

    let mut conn = Connection {
        client_id,
        state: state.clone(),
        ticker: None,
        conversation: Some(ChatConversation::new()),
        chat_tx,
    };

    // One task per connection: the timer and the message handlers of a
    // session never run concurrently, and pushes leave in event order.
    loop {
        let step = tokio::select! {
            incoming = receiver.next() => Step::Incoming(incoming),
            _ = next_tick(&mut conn.ticker) => Step::Tick,
            Some(done) = chat_rx.recv() => Step::ChatDone(done),
        };

        let outgoing = match step {
            Step::Incoming(Some(Ok(Message::Text(text)))) => conn.handle_text(text.as_str()),
            Step::Incoming(Some(Ok(Message::Close(_)))) | Step::Incoming(None) => break,
            Step::Incoming(Some(Ok(_))) => None,
            Step::Incoming(Some(Err(e))) => {
                log::warn!("Client {} transport error: {}", client_id, e);
                break;
            }
            Step::Tick => state.hub.tick(client_id).map(ServerEvent::from),
            Step::ChatDone((conversation, reply)) => {
                conn.conversation = Some(conversation);
                reply
            }
        };

        if let Some(event) = outgoing {
            if !send_event(&mut sender, client_id, &event).await {
                break;
            }
        }
    }

    state.hub.disconnect(client_id);
}

impl Connection {
    fn handle_text(&mut self, text: &str) -> Option<ServerEvent> {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(ClientEvent::UserLocation(payload)) => Some(self.on_location(payload)),
            Ok(ClientEvent::ChatMessage(message)) => self.on_chat(message.text),
            Err(e) => {
                log::warn!("Client {} sent an unrecognised message: {}", self.client_id, e);
                Some(ServerEvent::error(format!("unrecognised message: {}", e)))
            }
        }
    }

    fn on_location(&mut self, payload: Value) -> ServerEvent {
        match self.state.hub.report_location(self.client_id, &payload) {
            Ok(snapshot) => {
                if self.ticker.is_none() {
                    let period = self.state.update_interval;
                    let mut ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    self.ticker = Some(ticker);
                }
                snapshot.into()
            }
            Err(e) => ServerEvent::error(e.to_string()),
        }
    }

    fn on_chat(&mut self, text: String) -> Option<ServerEvent> {
        if text.trim().is_empty() {
            return None;
        }
        let Some(mut conversation) = self.conversation.take() else {
            return Some(ServerEvent::error("A chat reply is still pending, please wait."));
        };

        let backend = self.state.chat.clone();
        let done_tx = self.chat_tx.clone();
        let client_id = self.client_id;
        tokio::spawn(async move {
            let reply = match conversation.ask(backend.as_deref(), &text).await {
                Ok(answer) => Some(ServerEvent::chat_reply(answer)),
                Err(ChatError::EmptyPrompt) => None,
                Err(e) => {
                    log::warn!("Chat request for client {} failed: {}", client_id, e);
                    Some(ServerEvent::chat_reply(e.user_message()))
                }
            };
            // The connection may be gone by now.
            let _ = done_tx.send((conversation, reply)).await;
        });
        None
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Returns false once the client can no longer be reached.
async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    client_id: ClientId,
    event: &ServerEvent,
) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to encode event for client {}: {}", client_id, e);
            return true;
        }
    };
    log::trace!("Sending to client {}: {}", client_id, json);

    match sender.send(Message::Text(json.into())).await {
        Ok(()) => true,
        Err(e) => {
            log::info!("Client {} is no longer reachable: {}", client_id, e);
            false
        }
    }
}
