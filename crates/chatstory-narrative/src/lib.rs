//! Chat Story Builder: branching path resolution and animated playback.
//!
//! The domain layer holds the pure pieces: the story graph, the decision
//! map, the path resolver and the playback state machine. The application
//! layer runs that machine on a timer, bridges reader decisions into it and
//! composes what the preview shows.

pub mod application;
pub mod domain;
