//! Shared test doubles and fixtures for the chat story builder.

mod clock;
mod fixtures;
mod timer;

pub use clock::FixedClock;
pub use fixtures::{sample_roster, sample_script, script_of};
pub use timer::{InstantTimer, ManualTimer};
