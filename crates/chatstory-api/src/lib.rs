//! Chat story builder: HTTP preview host.
//!
//! Exposes preview sessions over a JSON API. Sessions live in memory only.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
