//! WebSocket channel carrying relay events

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, StreamExt};
use std::sync::Arc;
use tracing::Instrument;

use ddsweb_core::dds::Launcher;
use ddsweb_core::relay::{ClientEvent, Relay, ServerEvent};

/// Path of the WebSocket upgrade route
pub const SOCKET_PATH: &str = "/ws";

/// Handles WebSocket upgrade requests to [`SOCKET_PATH`]
pub async fn upgrade<L>(ws: WebSocketUpgrade, State(relay): State<Arc<Relay<L>>>) -> Response
where
    L: Launcher + 'static,
{
    let id = uuid::Uuid::new_v4();
    ws.on_upgrade(move |socket| {
        handle_socket(socket, relay).instrument(tracing::info_span!("client", %id))
    })
}

/// Runs one client connection until it closes
///
/// Sends the idle greeting, then handles frames strictly in order: a
/// trigger finishes (and its status is sent) before the next frame is read.
/// A continuous `dds` run this client started is stopped when it leaves.
async fn handle_socket<L: Launcher>(socket: WebSocket, relay: Arc<Relay<L>>) {
    tracing::info!("Client connected");
    let session = relay.open_session();
    let (mut sender, mut receiver) = socket.split();

    if send_event(&mut sender, &relay.greeting()).await.is_err() {
        return;
    }

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            // Ping/pong are answered by axum; binary frames are not part of the protocol
            Ok(_) => continue,
        };

        let event = match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => {
                tracing::debug!("Received {}", event.name());
                event
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed frame: {}", e);
                continue;
            }
        };

        if let Some(reply) = relay.handle(&session, event).await {
            if send_event(&mut sender, &reply).await.is_err() {
                break;
            }
        }
    }

    relay.release(&session).await;
    tracing::info!("Client disconnected");
}

/// Serialize and send one event; an error means the client is gone
async fn send_event<S>(sender: &mut S, event: &ServerEvent) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Failed to serialize {:?}: {}", event, e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await
}
