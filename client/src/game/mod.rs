mod core;
mod network;
mod player;
mod wander;

pub use self::core::CorePlugin;
pub(crate) use self::core::UpdateSet;
pub use network::NetworkPlugin;
pub use player::PlayerPlugin;
pub use wander::WanderPlugin;
