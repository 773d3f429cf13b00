//! Chat Story Core: shared story model and scheduling abstractions.
//!
//! This crate defines the data model every other crate speaks (characters,
//! messages, scripts) together with the clock and timer traits that let the
//! playback engine run deterministically under test. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod model;
pub mod script;
pub mod timer;
