//! Route modules.

pub mod health;
pub mod playback;
pub mod stories;
