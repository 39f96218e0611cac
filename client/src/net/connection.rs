use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use bevy::prelude::Resource;
use tokio::sync::mpsc::UnboundedSender;
use walkabout_shared::protocol::{ClientMsg, PlayerStateWire, ServerMsg, PROTOCOL_VERSION};

#[derive(Debug, Clone)]
pub enum NetEvent {
    Connected,
    Disconnected,
    Message(ServerMsg),
    ProtocolMismatch { server: u32, client: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Display-loop side of the WebSocket. The socket itself lives on a
/// background thread; events come in through `poll_events` and commands go
/// out through an unbounded channel.
#[derive(Resource)]
pub struct ServerConnection {
    pub state: ConnectionState,
    event_rx: Mutex<Receiver<NetEvent>>,
    cmd_tx: Option<UnboundedSender<ClientMsg>>,
}

impl ServerConnection {
    pub fn new(url: String) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<NetEvent>();
        let cmd_tx = spawn_network_thread(url, event_tx);

        Self {
            state: ConnectionState::Connecting,
            event_rx: Mutex::new(event_rx),
            cmd_tx: Some(cmd_tx),
        }
    }

    pub fn poll_events(&mut self) -> Vec<NetEvent> {
        let mut out = Vec::new();
        if let Ok(rx) = self.event_rx.lock() {
            while let Ok(evt) = rx.try_recv() {
                out.push(evt);
            }
        }
        out
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn send_join(&self, display_name: Option<String>) {
        self.send(ClientMsg::Join { display_name });
    }

    pub fn send_state(&self, state: PlayerStateWire) {
        self.send(ClientMsg::State(state));
    }

    fn send(&self, msg: ClientMsg) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(msg);
        }
    }

    /// Stub wired to in-memory channels: the returned sender injects events,
    /// the receiver observes what the app tried to send.
    #[cfg(test)]
    pub fn test_stub_with_sender() -> (
        Self,
        Sender<NetEvent>,
        tokio::sync::mpsc::UnboundedReceiver<ClientMsg>,
    ) {
        let (event_tx, event_rx) = mpsc::channel::<NetEvent>();
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel::<ClientMsg>();
        let conn = Self {
            state: ConnectionState::Connecting,
            event_rx: Mutex::new(event_rx),
            cmd_tx: Some(cmd_tx),
        };
        (conn, event_tx, cmd_rx)
    }
}

/// Single attempt: a failed connect or a dropped socket ends the thread and
/// leaves the session single-participant.
fn spawn_network_thread(url: String, event_tx: Sender<NetEvent>) -> UnboundedSender<ClientMsg> {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::unbounded_channel::<ClientMsg>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_io()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                bevy::log::error!("Failed to build network runtime: {}", e);
                let _ = event_tx.send(NetEvent::Disconnected);
                return;
            }
        };

        rt.block_on(async move {
            let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
                Ok((ws_stream, _)) => ws_stream,
                Err(e) => {
                    bevy::log::warn!("Could not connect to {}: {}", url, e);
                    let _ = event_tx.send(NetEvent::Disconnected);
                    return;
                }
            };

            let _ = event_tx.send(NetEvent::Connected);

            let (mut write, mut read) = ws_stream.split();

            loop {
                tokio::select! {
                    biased;

                    Some(cmd) = cmd_rx.recv() => {
                        if let Ok(text) = serde_json::to_string(&cmd) {
                            if write.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                    }

                    msg = read.next() => {
                        match msg {
                            Some(Ok(Message::Text(txt))) => {
                                let Ok(server_msg) = serde_json::from_str::<ServerMsg>(&txt) else {
                                    continue;
                                };
                                if let ServerMsg::PlayersInit(init) = &server_msg {
                                    if init.protocol_version != PROTOCOL_VERSION {
                                        let _ = event_tx.send(NetEvent::ProtocolMismatch {
                                            server: init.protocol_version,
                                            client: PROTOCOL_VERSION,
                                        });
                                        let _ = write.close().await;
                                        break;
                                    }
                                }
                                let _ = event_tx.send(NetEvent::Message(server_msg));
                            }
                            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                            Some(Ok(_)) => {}
                        }
                    }
                }
            }

            let _ = event_tx.send(NetEvent::Disconnected);
        });
    });

    cmd_tx
}
