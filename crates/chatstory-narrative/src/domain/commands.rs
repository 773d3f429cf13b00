//! Commands accepted by a preview session.

use chatstory_core::command::Command;
use chatstory_core::model::{CharacterId, Message, MessageId, OptionId};
use uuid::Uuid;

/// Command to (re)start animated playback from the first message.
#[derive(Debug, Clone)]
pub struct StartPlayback {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

/// Command to stop animated playback.
#[derive(Debug, Clone)]
pub struct StopPlayback {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

/// Command carrying a reader's click on a choice option.
#[derive(Debug, Clone)]
pub struct ResolveChoice {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The fork that was clicked.
    pub message_id: MessageId,
    /// The chosen option.
    pub option: OptionId,
}

/// Command to replace the script with an edited version.
#[derive(Debug, Clone)]
pub struct ReplaceScript {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The edited messages in authored order.
    pub messages: Vec<Message>,
}

/// Command to delete a character together with every message it sent.
#[derive(Debug, Clone)]
pub struct RemoveCharacter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character to delete.
    pub character_id: CharacterId,
}

macro_rules! impl_command {
    ($($ty:ident => $name:literal),* $(,)?) => {
        $(
            impl Command for $ty {
                fn command_type(&self) -> &'static str {
                    $name
                }

                fn correlation_id(&self) -> Uuid {
                    self.correlation_id
                }
            }
        )*
    };
}

impl_command! {
    StartPlayback => "playback.start",
    StopPlayback => "playback.stop",
    ResolveChoice => "playback.resolve_choice",
    ReplaceScript => "script.replace",
    RemoveCharacter => "roster.remove_character",
}
