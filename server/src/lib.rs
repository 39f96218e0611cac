//! Walkabout relay server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod config;
pub mod registry;
pub mod relay;
pub mod ws;
