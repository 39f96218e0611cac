//! Code shared by the walkabout server and client: the deterministic world,
//! local player physics and the wire protocol.

pub mod collision;
pub mod config;
pub mod look;
pub mod motion;
pub mod protocol;
pub mod rng;
pub mod vec3;
pub mod world;
