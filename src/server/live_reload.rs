//! WebSocket live reload channel
//!
//! Forwards reload events published by the watch dispatcher to connected
//! browsers, and serves the client script that listens for them.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;
use tokio::sync::broadcast;

use super::AppState;
use crate::tasks::LeafTask;

/// Event sent to connected clients when a triggered task finishes.
#[derive(Clone, Debug, Serialize)]
pub struct ReloadEvent {
    /// Event type (always "reload").
    #[serde(rename = "type")]
    event_type: String,
    /// Asset class that was rebuilt.
    path: String,
}

impl ReloadEvent {
    /// Reload event for a finished leaf task run.
    pub fn for_task(task: LeafTask) -> Self {
        Self { event_type: "reload".to_string(), path: task.to_string() }
    }
}

/// Client script injected into served HTML documents.
///
/// Reloads the page on any event and reconnects after the server restarts.
pub(crate) const CLIENT_SCRIPT: &str = r#"(() => {
  const connect = () => {
    const ws = new WebSocket(`ws://${location.host}/__livereload`);
    ws.onmessage = () => location.reload();
    ws.onclose = () => setTimeout(connect, 1000);
  };
  connect();
})();
"#;

/// Serve the live reload client script.
pub(crate) async fn client_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], CLIENT_SCRIPT)
}

/// Handle WebSocket upgrade for live reload.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut receiver: broadcast::Receiver<ReloadEvent> = state.reload_tx.subscribe();

    loop {
        tokio::select! {
            // Forward reload events to the client
            result = receiver.recv() => {
                match result {
                    Ok(event) => {
                        let Ok(msg) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if socket.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                }
            }
            // Handle client messages (for keepalive)
            result = socket.recv() => {
                match result {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}
