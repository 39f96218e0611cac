use std::collections::BTreeMap;

use bevy::prelude::Resource;
use walkabout_shared::look::Look;
use walkabout_shared::protocol::{default_display_name, PlayerId, PlayerStateWire, ServerMsg};
use walkabout_shared::vec3::Vec3;

use super::remote::RemotePlayer;

/// Client half of the replication protocol: decides when to send the local
/// state and keeps the set of remote players in step with server events.
#[derive(Resource, Debug)]
pub struct NetworkSession {
    pub self_id: Option<PlayerId>,
    pub protocol_mismatch: bool,
    send_interval: f64,
    send_accumulator: f64,
    remotes: BTreeMap<PlayerId, RemotePlayer>,
}

impl NetworkSession {
    pub fn new(send_interval: f64) -> Self {
        Self {
            self_id: None,
            protocol_mismatch: false,
            send_interval,
            send_accumulator: 0.0,
            remotes: BTreeMap::new(),
        }
    }

    /// Add `dt` to the accumulator. True once it exceeds the send interval;
    /// the accumulator then starts again from zero.
    pub fn should_send(&mut self, dt: f64) -> bool {
        if dt.is_finite() && dt > 0.0 {
            self.send_accumulator += dt;
        }
        if self.send_accumulator > self.send_interval {
            self.send_accumulator = 0.0;
            true
        } else {
            false
        }
    }

    pub fn apply(&mut self, msg: ServerMsg) {
        match msg {
            ServerMsg::PlayersInit(init) => {
                self.self_id = Some(init.self_id);
                self.remotes.clear();
                for entry in init.players {
                    if entry.id == init.self_id {
                        continue;
                    }
                    self.remotes.insert(
                        entry.id,
                        RemotePlayer::new(entry.id, entry.display_name, entry.state),
                    );
                }
            }
            ServerMsg::PlayerJoined(joined) => {
                if self.is_self(joined.id) {
                    return;
                }
                match self.remotes.get_mut(&joined.id) {
                    // A rejoin renames; the pose is kept until the next state.
                    Some(remote) => remote.display_name = joined.display_name,
                    None => {
                        self.remotes.insert(
                            joined.id,
                            RemotePlayer::new(joined.id, joined.display_name, None),
                        );
                    }
                }
            }
            ServerMsg::PlayerState(update) => {
                if self.is_self(update.id) {
                    return;
                }
                match self.remotes.get_mut(&update.id) {
                    Some(remote) => remote.set_target(update.state),
                    None => {
                        self.remotes.insert(
                            update.id,
                            RemotePlayer::new(
                                update.id,
                                default_display_name(update.id),
                                Some(update.state),
                            ),
                        );
                    }
                }
            }
            ServerMsg::PlayerLeft(left) => {
                self.remotes.remove(&left.id);
            }
        }
    }

    /// Forget everyone. Used when the connection goes away.
    pub fn clear(&mut self) {
        self.remotes.clear();
        self.self_id = None;
        self.send_accumulator = 0.0;
    }

    pub fn remote(&self, id: PlayerId) -> Option<&RemotePlayer> {
        self.remotes.get(&id)
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.remotes.values()
    }

    pub fn remotes_mut(&mut self) -> impl Iterator<Item = &mut RemotePlayer> {
        self.remotes.values_mut()
    }

    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }

    fn is_self(&self, id: PlayerId) -> bool {
        self.self_id == Some(id)
    }
}

/// Wire state for the local player. `position.y` is the foot height; the
/// angles come from the look direction so pitch never bleeds into yaw.
pub fn local_state(position: Vec3, look_direction: Vec3, client_timestamp: f64) -> PlayerStateWire {
    let look = Look::from_direction(look_direction);
    PlayerStateWire {
        x: position.x,
        y: position.y,
        z: position.z,
        yaw: look.yaw,
        pitch: look.pitch,
        client_timestamp,
    }
}
