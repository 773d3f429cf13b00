//! Domain layer for branching playback.

pub mod commands;
pub mod decisions;
pub mod events;
pub mod graph;
pub mod path;
pub mod playback;
