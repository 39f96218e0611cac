use bevy::prelude::*;
use walkabout_shared::world::World;

use crate::config::ClientConfig;
use crate::net::connection::ServerConnection;
use crate::net::session::NetworkSession;

use super::network::NetSettings;
use super::player::{CameraRig, LocalPlayer, PlayerIntents};

/// How often the headless status line is printed (seconds)
const STATUS_INTERVAL: f64 = 5.0;

#[derive(SystemSet, Debug, Hash, Eq, PartialEq, Clone)]
pub(crate) enum UpdateSet {
    Input,
    Simulate,
    Network,
    Visuals,
}

/// The generated static world. Identical on every client with the same seed.
#[derive(Resource)]
pub(crate) struct SessionWorld(pub(crate) World);

pub struct CorePlugin {
    pub config: ClientConfig,
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;
        let world = World::generate(&config.world);
        let local = LocalPlayer::new(config.motion);
        let camera = CameraRig::following(&local);

        app.insert_resource(ServerConnection::new(config.ws_url.clone()))
            .insert_resource(NetworkSession::new(config.send_interval))
            .insert_resource(NetSettings {
                display_name: config.display_name.clone(),
                interpolation_gain: config.interpolation_gain,
            })
            .insert_resource(SessionWorld(world))
            .insert_resource(local)
            .insert_resource(camera)
            .init_resource::<PlayerIntents>()
            .configure_sets(
                Update,
                (
                    UpdateSet::Input,
                    UpdateSet::Simulate,
                    UpdateSet::Network,
                    UpdateSet::Visuals,
                )
                    .chain(),
            )
            .add_systems(Startup, log_world)
            .add_systems(Update, status_system.in_set(UpdateSet::Visuals));
    }
}

fn log_world(world: Res<SessionWorld>) {
    let (min, max) = world.0.bounds();
    info!(
        "World generated: {} obstacles, bounds ({:.1}, {:.1}) .. ({:.1}, {:.1})",
        world.0.len(),
        min.x,
        min.z,
        max.x,
        max.z
    );
}

fn status_system(
    time: Res<Time>,
    mut since_last: Local<f64>,
    local: Res<LocalPlayer>,
    session: Res<NetworkSession>,
    conn: Res<ServerConnection>,
) {
    *since_last += time.delta_secs_f64();
    if *since_last < STATUS_INTERVAL {
        return;
    }
    *since_last = 0.0;

    let p = local.motion.position;
    info!(
        "[{:?}] at ({:.1}, {:.1}, {:.1}) yaw {:.2}, {} remote player(s)",
        conn.state,
        p.x,
        p.y,
        p.z,
        local.look.yaw,
        session.remote_count()
    );
    for remote in session.remotes() {
        debug!(
            "  {} {:?} at ({:.1}, {:.1}, {:.1}), updated {:.1}s ago",
            remote.id,
            remote.display_name,
            remote.rendered.x,
            remote.rendered.y,
            remote.rendered.z,
            remote.last_update.elapsed().as_secs_f64()
        );
    }
}
