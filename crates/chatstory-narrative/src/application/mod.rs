//! Application layer: the playback runner, preview sessions and their
//! command/query handlers.

pub mod command_handlers;
pub mod driver;
pub mod query_handlers;
pub mod session;
