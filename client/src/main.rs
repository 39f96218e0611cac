mod config;
mod game;
mod net;

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use config::ClientConfig;
use game::{CorePlugin, NetworkPlugin, PlayerPlugin, WanderPlugin};

/// Display-loop rate of the headless client
const FRAME_RATE: f64 = 60.0;

fn main() {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid client configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid client configuration: {}", e);
        std::process::exit(1);
    }

    let wander_seed = std::process::id();

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / FRAME_RATE),
        )))
        .add_plugins(LogPlugin::default())
        .add_plugins(CorePlugin { config })
        .add_plugins(WanderPlugin { seed: wander_seed })
        .add_plugins(PlayerPlugin)
        .add_plugins(NetworkPlugin)
        .run();
}
