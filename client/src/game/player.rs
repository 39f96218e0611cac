use bevy::prelude::*;
use walkabout_shared::config::MotionConfig;
use walkabout_shared::look::Look;
use walkabout_shared::motion::{Intents, Motion};
use walkabout_shared::vec3::Vec3;

use super::core::SessionWorld;
use super::UpdateSet;

pub struct PlayerPlugin;

/// The local participant: kinematic state plus where it is looking.
#[derive(Resource, Debug)]
pub(crate) struct LocalPlayer {
    pub(crate) motion: Motion,
    pub(crate) look: Look,
}

impl LocalPlayer {
    pub(crate) fn new(config: MotionConfig) -> Self {
        Self {
            motion: Motion::new(config),
            look: Look::default(),
        }
    }
}

/// Written by whatever drives input. `jump` is consumed by the next step.
#[derive(Resource, Debug, Default)]
pub(crate) struct PlayerIntents(pub(crate) Intents);

/// Presentation side of the local player: camera height and look direction.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub(crate) struct CameraRig {
    pub(crate) height: f64,
    pub(crate) direction: Vec3,
}

impl CameraRig {
    pub(crate) fn following(local: &LocalPlayer) -> Self {
        Self {
            height: local.motion.camera_height(),
            direction: local.look.direction(),
        }
    }
}

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, player_step_system.in_set(UpdateSet::Simulate));
    }
}

fn player_step_system(
    time: Res<Time>,
    world: Res<SessionWorld>,
    mut intents: ResMut<PlayerIntents>,
    mut local: ResMut<LocalPlayer>,
    mut camera: ResMut<CameraRig>,
) {
    let dt = time.delta_secs_f64();
    let look = local.look;
    local.motion.step(dt, &intents.0, &look, world.0.obstacles());
    intents.0.jump = false;

    *camera = CameraRig::following(&local);
}
