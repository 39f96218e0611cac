use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use walkabout_shared::protocol::{ClientMsg, PlayerId, ServerMsg};

use crate::relay::{RelayBroadcast, RelayCommand};

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub relay_tx: mpsc::Sender<RelayCommand>,
    pub max_message_bytes: usize,
    pub max_parse_errors: u32,
}

/// Routes served by the relay. CORS and other layers are added by the caller.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.max_message_size(app_state.max_message_bytes)
        .on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .relay_tx
        .send(RelayCommand::Connect { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Connect command");
        return;
    }

    let connected = match resp_rx.await {
        Ok(connected) => connected,
        Err(_) => {
            tracing::error!("Failed to receive snapshot");
            return;
        }
    };
    let my_id = connected.id;
    let mut events = connected.events;

    tracing::info!("Connection {} opened", my_id);

    if send_msg(&mut sink, &ServerMsg::PlayersInit(connected.init))
        .await
        .is_err()
    {
        leave(&app_state, my_id).await;
        return;
    }

    let mut parse_errors: u32 = 0;

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(client_msg) => {
                                let cmd = match client_msg {
                                    ClientMsg::Join { display_name } => RelayCommand::Join {
                                        id: my_id,
                                        display_name,
                                    },
                                    ClientMsg::State(state) => RelayCommand::State { id: my_id, state },
                                };
                                if app_state.relay_tx.send(cmd).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                parse_errors += 1;
                                tracing::debug!("Connection {} sent bad frame: {}", my_id, e);
                                if parse_errors > app_state.max_parse_errors {
                                    tracing::warn!(
                                        "Connection {} closed after {} bad frames",
                                        my_id,
                                        parse_errors
                                    );
                                    let _ = sink
                                        .send(Message::Close(Some(CloseFrame {
                                            code: close_code::POLICY,
                                            reason: "too many malformed messages".into(),
                                        })))
                                        .await;
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Connection {} read error: {}", my_id, e);
                        break;
                    }
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = events.recv() => {
                match outbound(result, my_id) {
                    Outbound::Send(msg) => {
                        if send_msg(&mut sink, &msg).await.is_err() {
                            break;
                        }
                    }
                    Outbound::Skip => {}
                    Outbound::Lagged(n) => {
                        // Skipped joins and leaves cannot be replayed.
                        tracing::warn!(
                            "Connection {} lagged by {} messages, closing",
                            my_id,
                            n
                        );
                        let _ = sink
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::AGAIN,
                                reason: "fell behind the relay".into(),
                            })))
                            .await;
                        break;
                    }
                    Outbound::Closed => break,
                }
            }
        }
    }

    leave(&app_state, my_id).await;
    tracing::info!("Connection {} closed", my_id);
}

#[derive(Debug)]
enum Outbound {
    Send(ServerMsg),
    Skip,
    Lagged(u64),
    Closed,
}

fn outbound(
    result: Result<RelayBroadcast, broadcast::error::RecvError>,
    my_id: PlayerId,
) -> Outbound {
    match result {
        Ok(event) if event.is_for(my_id) => Outbound::Send(event.msg),
        Ok(_) => Outbound::Skip,
        Err(broadcast::error::RecvError::Lagged(n)) => Outbound::Lagged(n),
        Err(broadcast::error::RecvError::Closed) => Outbound::Closed,
    }
}

async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!("Failed to encode {:?}: {}", msg, e);
            Ok(())
        }
    }
}

async fn leave(app_state: &AppState, id: PlayerId) {
    let _ = app_state
        .relay_tx
        .send(RelayCommand::Disconnect { id })
        .await;
}
