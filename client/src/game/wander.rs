//! Headless input source: a seeded bot that strolls around the world.

use bevy::prelude::*;
use walkabout_shared::motion::Intents;

use super::player::{LocalPlayer, PlayerIntents};
use super::UpdateSet;

const TURN_RATE_MAX: f64 = 1.2;
const LEG_MIN: f64 = 1.0;
const LEG_MAX: f64 = 4.0;
const SPRINT_CHANCE: f64 = 0.25;
const PAUSE_CHANCE: f64 = 0.1;
/// Jump attempts per second, on average
const JUMP_RATE: f64 = 0.3;
const JUMP_COOLDOWN: f64 = 1.5;
const PITCH_RANGE: f64 = 0.35;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct WanderOutput {
    pub(crate) intents: Intents,
    pub(crate) delta_yaw: f64,
    pub(crate) delta_pitch: f64,
}

/// Walks in legs: each leg has a turn rate, a pitch to drift toward and a
/// chance to sprint or stand still. Jumps now and then.
#[derive(Resource, Debug)]
pub(crate) struct WanderBot {
    seed: u32,
    leg_left: f64,
    turn_rate: f64,
    target_pitch: f64,
    sprinting: bool,
    paused: bool,
    jump_cooldown: f64,
}

impl WanderBot {
    pub(crate) fn new(seed: u32) -> Self {
        Self {
            seed: seed.max(1),
            leg_left: 0.0,
            turn_rate: 0.0,
            target_pitch: 0.0,
            sprinting: false,
            paused: false,
            jump_cooldown: JUMP_COOLDOWN,
        }
    }

    fn next_random(&mut self) -> f64 {
        self.seed = self.seed.wrapping_mul(1664525).wrapping_add(1013904223) & 0x7fff_ffff;
        self.seed as f64 / 0x7fff_ffffu32 as f64
    }

    fn start_leg(&mut self) {
        self.leg_left = LEG_MIN + self.next_random() * (LEG_MAX - LEG_MIN);
        self.turn_rate = (self.next_random() * 2.0 - 1.0) * TURN_RATE_MAX;
        self.target_pitch = (self.next_random() * 2.0 - 1.0) * PITCH_RANGE;
        self.sprinting = self.next_random() < SPRINT_CHANCE;
        self.paused = self.next_random() < PAUSE_CHANCE;
    }

    pub(crate) fn update(&mut self, dt: f64, current_pitch: f64) -> WanderOutput {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.leg_left -= dt;
        if self.leg_left <= 0.0 {
            self.start_leg();
        }

        self.jump_cooldown = (self.jump_cooldown - dt).max(0.0);
        let mut jump = false;
        if self.jump_cooldown <= 0.0 && !self.paused && self.next_random() < JUMP_RATE * dt {
            jump = true;
            self.jump_cooldown = JUMP_COOLDOWN;
        }

        let intents = Intents {
            forward: !self.paused,
            sprint: self.sprinting && !self.paused,
            jump,
            ..Default::default()
        };

        WanderOutput {
            intents,
            delta_yaw: self.turn_rate * dt,
            delta_pitch: (self.target_pitch - current_pitch) * (dt * 2.0).min(1.0),
        }
    }
}

pub struct WanderPlugin {
    pub seed: u32,
}

impl Plugin for WanderPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(WanderBot::new(self.seed))
            .add_systems(Update, wander_system.in_set(UpdateSet::Input));
    }
}

fn wander_system(
    time: Res<Time>,
    mut bot: ResMut<WanderBot>,
    mut intents: ResMut<PlayerIntents>,
    mut local: ResMut<LocalPlayer>,
) {
    let out = bot.update(time.delta_secs_f64(), local.look.pitch);
    // Keep an unconsumed jump from an earlier frame.
    let pending_jump = intents.0.jump;
    intents.0 = out.intents;
    intents.0.jump |= pending_jump;
    local.look = local.look.turned(out.delta_yaw, out.delta_pitch);
}
