//! CLI command implementations.

pub mod devices;
pub mod params;
pub mod play;
