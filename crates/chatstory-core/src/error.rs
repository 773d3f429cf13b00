//! Domain error types.
//!
//! Only the authoring boundary can fail. Path resolution and playback
//! degrade to "halt" or "finish" instead of returning errors.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No preview session exists for the given story.
    #[error("story not found: {0}")]
    StoryNotFound(Uuid),

    /// The submitted draft violates a structural rule.
    #[error("validation error: {0}")]
    Validation(String),
}
