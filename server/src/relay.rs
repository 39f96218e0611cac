use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, oneshot};
use walkabout_shared::protocol::{
    PlayerId, PlayerJoinedMsg, PlayerLeftMsg, PlayerStateMsg, PlayerStateWire, PlayersInitMsg,
    ServerMsg, PROTOCOL_VERSION,
};

use crate::config::ServerConfig;
use crate::registry::PresenceRegistry;

/// How often the stale sweep runs when eviction is enabled
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Commands from client connections to the relay
pub enum RelayCommand {
    Connect {
        response: oneshot::Sender<Connected>,
    },
    Join {
        id: PlayerId,
        display_name: Option<String>,
    },
    State {
        id: PlayerId,
        state: PlayerStateWire,
    },
    Disconnect {
        id: PlayerId,
    },
}

/// Handed back to a new connection. `events` was subscribed while the
/// snapshot in `init` was taken, so nothing published after the snapshot is
/// missed and nothing before it is repeated.
pub struct Connected {
    pub id: PlayerId,
    pub init: PlayersInitMsg,
    pub events: broadcast::Receiver<RelayBroadcast>,
}

/// Fan-out event. `exclude` names the connection that caused it.
#[derive(Debug, Clone)]
pub struct RelayBroadcast {
    pub exclude: Option<PlayerId>,
    pub msg: ServerMsg,
}

impl RelayBroadcast {
    pub fn is_for(&self, id: PlayerId) -> bool {
        self.exclude != Some(id)
    }
}

/// Registry plus the fan-out channel. All mutation goes through `handle`.
pub struct Relay {
    registry: PresenceRegistry,
    broadcast_tx: broadcast::Sender<RelayBroadcast>,
}

impl Relay {
    pub fn new(broadcast_tx: broadcast::Sender<RelayBroadcast>) -> Self {
        Self {
            registry: PresenceRegistry::new(),
            broadcast_tx,
        }
    }

    pub fn registry(&self) -> &PresenceRegistry {
        &self.registry
    }

    pub fn handle(&mut self, cmd: RelayCommand, now: Instant) {
        match cmd {
            RelayCommand::Connect { response } => {
                let id = self.registry.allocate_id();
                let connected = Connected {
                    id,
                    init: PlayersInitMsg {
                        protocol_version: PROTOCOL_VERSION,
                        self_id: id,
                        players: self.registry.snapshot(),
                    },
                    events: self.broadcast_tx.subscribe(),
                };
                if response.send(connected).is_err() {
                    tracing::debug!("Connection {} dropped before its snapshot", id);
                }
            }
            RelayCommand::Join { id, display_name } => {
                let entry = self.registry.register(id, display_name.as_deref(), now);
                tracing::info!("Player {} joined as {:?}", id, entry.display_name);
                let msg = ServerMsg::PlayerJoined(PlayerJoinedMsg {
                    id,
                    display_name: entry.display_name.clone(),
                });
                self.publish(Some(id), msg);
            }
            RelayCommand::State { id, state } => {
                if self.registry.update(id, state, now) {
                    self.publish(Some(id), ServerMsg::PlayerState(PlayerStateMsg { id, state }));
                } else {
                    tracing::debug!("Ignoring state from unjoined connection {}", id);
                }
            }
            RelayCommand::Disconnect { id } => {
                if self.registry.remove(id).is_some() {
                    self.publish(None, ServerMsg::PlayerLeft(PlayerLeftMsg { id }));
                    tracing::info!("Player {} left", id);
                }
            }
        }
    }

    /// Drop players silent for longer than `max_age`. Returns the evicted ids.
    pub fn evict_stale(&mut self, now: Instant, max_age: Duration) -> Vec<PlayerId> {
        let stale = self.registry.stale(now, max_age);
        for &id in &stale {
            self.registry.remove(id);
            self.publish(None, ServerMsg::PlayerLeft(PlayerLeftMsg { id }));
            tracing::info!("Player {} evicted after {:?} of silence", id, max_age);
        }
        stale
    }

    fn publish(&self, exclude: Option<PlayerId>, msg: ServerMsg) {
        // No receivers is not an error: nobody else is connected.
        let _ = self.broadcast_tx.send(RelayBroadcast { exclude, msg });
    }
}

/// Run the relay. Owns the presence registry until every command sender is gone.
pub async fn run_relay(
    mut cmd_rx: mpsc::Receiver<RelayCommand>,
    broadcast_tx: broadcast::Sender<RelayBroadcast>,
    config: ServerConfig,
) {
    let mut relay = Relay::new(broadcast_tx);
    let stale_after = config.stale_after();

    let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
    sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(cmd) = cmd_rx.recv() => {
                relay.handle(cmd, Instant::now());
            }

            _ = sweep.tick(), if stale_after.is_some() => {
                if let Some(max_age) = stale_after {
                    relay.evict_stale(Instant::now(), max_age);
                }
            }

            else => break,
        }
    }

    tracing::info!("Relay ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> (Relay, broadcast::Receiver<RelayBroadcast>) {
        let (tx, rx) = broadcast::channel(64);
        (Relay::new(tx), rx)
    }

    fn connect(relay: &mut Relay) -> Connected {
        let (tx, mut rx) = oneshot::channel();
        relay.handle(RelayCommand::Connect { response: tx }, Instant::now());
        rx.try_recv().expect("connect response")
    }

    fn join(relay: &mut Relay, id: PlayerId, name: &str) {
        relay.handle(
            RelayCommand::Join {
                id,
                display_name: Some(name.to_string()),
            },
            Instant::now(),
        );
    }

    #[test]
    fn connect_returns_snapshot_without_self() {
        let (mut relay, _rx) = relay();
        let a = connect(&mut relay);
        join(&mut relay, a.id, "ada");

        let b = connect(&mut relay);
        assert_ne!(a.id, b.id);
        assert_eq!(b.init.self_id, b.id);
        assert_eq!(b.init.protocol_version, PROTOCOL_VERSION);
        assert_eq!(b.init.players.len(), 1);
        assert_eq!(b.init.players[0].id, a.id);
        assert_eq!(b.init.players[0].display_name, "ada");
    }

    #[test]
    fn join_is_broadcast_excluding_sender() {
        let (mut relay, mut rx) = relay();
        let a = connect(&mut relay);
        join(&mut relay, a.id, "ada");

        let event = rx.try_recv().expect("joined event");
        assert!(!event.is_for(a.id));
        assert!(event.is_for(a.id + 1));
        match event.msg {
            ServerMsg::PlayerJoined(j) => {
                assert_eq!(j.id, a.id);
                assert_eq!(j.display_name, "ada");
            }
            other => panic!("Expected PlayerJoined, got {other:?}"),
        }
    }

    #[test]
    fn state_before_join_is_dropped() {
        let (mut relay, mut rx) = relay();
        let a = connect(&mut relay);
        relay.handle(
            RelayCommand::State {
                id: a.id,
                state: PlayerStateWire::default(),
            },
            Instant::now(),
        );
        assert!(rx.try_recv().is_err());
        assert!(relay.registry().is_empty());
    }

    #[test]
    fn state_is_stored_and_relayed() {
        let (mut relay, mut rx) = relay();
        let a = connect(&mut relay);
        join(&mut relay, a.id, "ada");
        let _ = rx.try_recv();

        let state = PlayerStateWire {
            x: 2.0,
            z: -1.0,
            ..Default::default()
        };
        relay.handle(RelayCommand::State { id: a.id, state }, Instant::now());

        let event = rx.try_recv().expect("state event");
        assert_eq!(event.exclude, Some(a.id));
        match event.msg {
            ServerMsg::PlayerState(s) => assert_eq!(s.state, state),
            other => panic!("Expected PlayerState, got {other:?}"),
        }
        let b = connect(&mut relay);
        assert_eq!(b.init.players[0].state, Some(state));
    }

    #[test]
    fn disconnect_of_joined_player_broadcasts_left_once() {
        let (mut relay, mut rx) = relay();
        let a = connect(&mut relay);
        join(&mut relay, a.id, "ada");
        let _ = rx.try_recv();

        relay.handle(RelayCommand::Disconnect { id: a.id }, Instant::now());
        relay.handle(RelayCommand::Disconnect { id: a.id }, Instant::now());

        let event = rx.try_recv().expect("left event");
        assert!(event.exclude.is_none());
        assert!(matches!(event.msg, ServerMsg::PlayerLeft(PlayerLeftMsg { id }) if id == a.id));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn disconnect_without_join_is_silent() {
        let (mut relay, mut rx) = relay();
        let a = connect(&mut relay);
        relay.handle(RelayCommand::Disconnect { id: a.id }, Instant::now());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn subscription_starts_at_snapshot() {
        let (mut relay, _rx) = relay();
        let a = connect(&mut relay);
        join(&mut relay, a.id, "ada");

        let mut b = connect(&mut relay);
        // A's join happened before B's snapshot and is already in it.
        assert!(b.events.try_recv().is_err());

        relay.handle(
            RelayCommand::State {
                id: a.id,
                state: PlayerStateWire::default(),
            },
            Instant::now(),
        );
        let event = b.events.try_recv().expect("state after snapshot");
        assert!(event.is_for(b.id));
    }

    #[test]
    fn evict_stale_broadcasts_left() {
        let (mut relay, mut rx) = relay();
        let a = connect(&mut relay);
        join(&mut relay, a.id, "ada");
        let _ = rx.try_recv();

        let later = Instant::now() + Duration::from_secs(30);
        let evicted = relay.evict_stale(later, Duration::from_secs(10));
        assert_eq!(evicted, vec![a.id]);
        assert!(relay.registry().is_empty());
        assert!(matches!(
            rx.try_recv().map(|e| e.msg),
            Ok(ServerMsg::PlayerLeft(_))
        ));
    }
}
