use std::time::{SystemTime, UNIX_EPOCH};

use bevy::prelude::*;

use crate::net::connection::{ConnectionState, NetEvent, ServerConnection};
use crate::net::session::{local_state, NetworkSession};

use super::player::{CameraRig, LocalPlayer};
use super::UpdateSet;

pub struct NetworkPlugin;

#[derive(Resource, Debug, Clone)]
pub(crate) struct NetSettings {
    pub(crate) display_name: Option<String>,
    pub(crate) interpolation_gain: f64,
}

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (network_event_system, send_state_system)
                .chain()
                .in_set(UpdateSet::Network),
        )
        .add_systems(Update, interpolate_remotes_system.in_set(UpdateSet::Visuals));
    }
}

fn network_event_system(
    mut conn: ResMut<ServerConnection>,
    mut session: ResMut<NetworkSession>,
    settings: Res<NetSettings>,
) {
    for evt in conn.poll_events() {
        match evt {
            NetEvent::Connected => {
                info!("WebSocket connected");
                conn.state = ConnectionState::Connected;
                conn.send_join(settings.display_name.clone());
            }
            NetEvent::Disconnected => {
                if conn.state != ConnectionState::Disconnected {
                    info!("WebSocket disconnected, continuing alone");
                }
                conn.state = ConnectionState::Disconnected;
                session.clear();
            }
            NetEvent::ProtocolMismatch { server, client } => {
                warn!("Protocol mismatch: server {} != client {}", server, client);
                session.protocol_mismatch = true;
            }
            NetEvent::Message(msg) => session.apply(msg),
        }
    }
}

fn send_state_system(
    time: Res<Time>,
    conn: Res<ServerConnection>,
    mut session: ResMut<NetworkSession>,
    local: Res<LocalPlayer>,
    camera: Res<CameraRig>,
) {
    if !session.should_send(time.delta_secs_f64()) {
        return;
    }
    if !conn.is_connected() {
        return;
    }
    conn.send_state(local_state(
        local.motion.position,
        camera.direction,
        now_ms(),
    ));
}

fn interpolate_remotes_system(
    time: Res<Time>,
    settings: Res<NetSettings>,
    mut session: ResMut<NetworkSession>,
) {
    let dt = time.delta_secs_f64();
    for remote in session.remotes_mut() {
        remote.interpolate(dt, settings.interpolation_gain);
    }
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
