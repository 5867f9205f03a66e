use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use wasapp_core::ServerEvent;

use crate::config::AppState;

/// Query string accepted on `/ws`.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub username: Option<String>,
}

/// GET /ws?username=<name>
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.username))
}

/// Drive one connection from upgrade to close.
async fn handle_socket(socket: WebSocket, state: AppState, username: Option<String>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.config.outbox_capacity);

    let connection_id = state.hub.connect(username.as_deref(), tx).id;

    let forward_id = connection_id.clone();
    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!(connection_id = %forward_id, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => state.hub.handle_frame(&connection_id, text.as_str()),
            Ok(Message::Binary(_)) => state.hub.handle_binary(&connection_id),
            Ok(Message::Close(_)) => {
                info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            // Ping/pong are answered by axum.
            Ok(_) => {}
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    state.hub.disconnect(&connection_id);
    forward_task.abort();
}
