//! Command handlers for preview sessions.
//!
//! Each handler applies one command to a session and reports what changed.
//! Sessions hold their own state, so handlers stay synchronous.

use chatstory_core::command::Command;
use chatstory_core::error::DomainError;
use tracing::info;
use uuid::Uuid;

use super::session::{ChoiceOutcome, PlaybackEffect, PreviewSession};
use crate::domain::commands::{
    RemoveCharacter, ReplaceScript, ResolveChoice, StartPlayback, StopPlayback,
};

fn log_command(command: &dyn Command, session: &PreviewSession) {
    info!(
        session_id = %session.id(),
        correlation_id = %command.correlation_id(),
        command_type = command.command_type(),
        "handling command"
    );
}

/// Handles `StartPlayback`: restarts playback from the top.
///
/// Returns the new run's id, or `None` if the script is empty.
pub fn handle_start_playback(command: &StartPlayback, session: &PreviewSession) -> Option<Uuid> {
    log_command(command, session);
    session.play().map(|handle| handle.run_id())
}

/// Handles `StopPlayback`. Returns whether a run was cancelled.
pub fn handle_stop_playback(command: &StopPlayback, session: &PreviewSession) -> bool {
    log_command(command, session);
    session.stop()
}

/// Handles `ResolveChoice`: records the decision and resumes a suspended
/// run waiting on that fork.
pub fn handle_resolve_choice(command: &ResolveChoice, session: &PreviewSession) -> ChoiceOutcome {
    log_command(command, session);
    session.choose(&command.message_id, command.option)
}

/// Handles `ReplaceScript`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if message ids repeat.
pub fn handle_replace_script(
    command: &ReplaceScript,
    session: &PreviewSession,
) -> Result<PlaybackEffect, DomainError> {
    log_command(command, session);
    session.replace_script(command.messages.clone())
}

/// Handles `RemoveCharacter`: deletes the character and its messages.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the character does not exist.
pub fn handle_remove_character(
    command: &RemoveCharacter,
    session: &PreviewSession,
) -> Result<PlaybackEffect, DomainError> {
    log_command(command, session);
    session.remove_character(&command.character_id)
}
