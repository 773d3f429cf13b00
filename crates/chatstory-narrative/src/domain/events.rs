//! Events emitted while a playback run progresses.

use chatstory_core::model::{CharacterId, MessageId, OptionId};
use serde::Serialize;
use uuid::Uuid;

/// Something observable that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// A run began at the first message.
    Started {
        /// The run.
        run_id: Uuid,
    },
    /// A sender started typing a message.
    TypingStarted {
        /// The run.
        run_id: Uuid,
        /// The message being typed.
        message_id: MessageId,
        /// Who is typing.
        sender_id: CharacterId,
    },
    /// A message was appended to the visible output.
    MessageRevealed {
        /// The run.
        run_id: Uuid,
        /// The revealed message.
        message_id: MessageId,
    },
    /// The run suspended at a fork.
    AwaitingChoice {
        /// The run.
        run_id: Uuid,
        /// The fork awaiting a decision.
        message_id: MessageId,
    },
    /// A decision resumed the run.
    ChoiceResolved {
        /// The run.
        run_id: Uuid,
        /// The fork that was decided.
        message_id: MessageId,
        /// The chosen option.
        option: OptionId,
        /// Where playback continues; `None` ends the run.
        target: Option<MessageId>,
    },
    /// The run reached the end of its path.
    Finished {
        /// The run.
        run_id: Uuid,
    },
    /// The run was stopped before finishing.
    Cancelled {
        /// The run.
        run_id: Uuid,
    },
}

impl PlaybackEvent {
    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "playback.started",
            Self::TypingStarted { .. } => "playback.typing_started",
            Self::MessageRevealed { .. } => "playback.message_revealed",
            Self::AwaitingChoice { .. } => "playback.awaiting_choice",
            Self::ChoiceResolved { .. } => "playback.choice_resolved",
            Self::Finished { .. } => "playback.finished",
            Self::Cancelled { .. } => "playback.cancelled",
        }
    }

    /// The run this event belongs to.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        match self {
            Self::Started { run_id }
            | Self::TypingStarted { run_id, .. }
            | Self::MessageRevealed { run_id, .. }
            | Self::AwaitingChoice { run_id, .. }
            | Self::ChoiceResolved { run_id, .. }
            | Self::Finished { run_id }
            | Self::Cancelled { run_id } => *run_id,
        }
    }
}
