//! Playback state machine.
//!
//! The machine is synchronous: it advances from one suspension point to the
//! next and tells its runner what to wait for. Timers, the reader's decision
//! and cancellation all live in the runner (see
//! [`crate::application::driver`]), which keeps every transition here
//! testable without a clock.
//!
//! ```text
//! Idle → Typing(m) → Revealed(m) → Advancing(next) → Typing(next) → …
//!                                ↘ AwaitingChoice(m) → Advancing(target)
//! any non-terminal state → Cancelled;  Advancing(none) → Finished
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chatstory_core::model::{MessageId, MessageKind, OptionId};
use chatstory_core::script::Script;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::events::PlaybackEvent;
use super::graph::{StoryGraph, Successor};

/// Spacing between reveals, so zero-delay lines still appear one by one.
pub const DEFAULT_PACING: Duration = Duration::from_millis(60);

/// Tunables for a playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Fixed wait after every reveal.
    pub pacing: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
        }
    }
}

/// Externally visible state of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// Not started.
    #[default]
    Idle,
    /// The sender of `message_id` is typing.
    Typing {
        /// The message about to be revealed.
        message_id: MessageId,
    },
    /// `message_id` was just revealed.
    Revealed {
        /// The revealed message.
        message_id: MessageId,
    },
    /// Pacing before moving on to `next` (or finishing when `None`).
    Advancing {
        /// The message playback continues with.
        next: Option<MessageId>,
    },
    /// Suspended until the reader decides the fork `message_id`.
    AwaitingChoice {
        /// The fork.
        message_id: MessageId,
    },
    /// The run reached the end of its path.
    Finished,
    /// The run was stopped.
    Cancelled,
}

impl PlaybackPhase {
    /// Returns true for `Finished` and `Cancelled`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

/// What the runner should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Wait this long, then call [`PlaybackMachine::step`].
    Wait(Duration),
    /// Wait for a decision on this fork, then call
    /// [`PlaybackMachine::choose`].
    AwaitChoice(MessageId),
    /// The run is over.
    Stop,
}

/// Observable state published after every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    /// The run this snapshot belongs to; `None` before the first run.
    pub run_id: Option<Uuid>,
    /// Current phase.
    pub phase: PlaybackPhase,
    /// Message whose sender is shown typing.
    pub typing: Option<MessageId>,
    /// Fork awaiting a decision.
    pub awaiting: Option<MessageId>,
    /// Revealed messages in reveal order.
    pub revealed: Vec<MessageId>,
    /// When the run started.
    pub started_at: Option<DateTime<Utc>>,
}

impl PlaybackSnapshot {
    /// Returns true while a run is in progress.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.run_id.is_some() && !self.phase.is_terminal()
    }
}

/// A script position together with the id found there.
#[derive(Debug, Clone, PartialEq, Eq)]
struct At {
    index: usize,
    id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Idle,
    Typing(At),
    Revealed(At),
    Advancing(Option<At>),
    AwaitingChoice(At),
    Finished,
    Cancelled,
}

/// One run's walk through a script.
#[derive(Debug)]
pub struct PlaybackMachine {
    run_id: Uuid,
    script: Arc<Script>,
    pacing: Duration,
    started_at: DateTime<Utc>,
    cursor: Cursor,
    typing: Option<MessageId>,
    awaiting: Option<MessageId>,
    revealed: Vec<MessageId>,
    revealed_set: HashSet<MessageId>,
    uncommitted_events: Vec<PlaybackEvent>,
}

impl PlaybackMachine {
    /// Creates an idle machine for `script`.
    #[must_use]
    pub fn new(
        run_id: Uuid,
        script: Arc<Script>,
        config: PlaybackConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            script,
            pacing: config.pacing,
            started_at,
            cursor: Cursor::Idle,
            typing: None,
            awaiting: None,
            revealed: Vec::new(),
            revealed_set: HashSet::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// The run identifier.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The script being played.
    #[must_use]
    pub fn script(&self) -> &Arc<Script> {
        &self.script
    }

    /// Advances to the next suspension point.
    ///
    /// Called once to begin, and again each time a [`Directive::Wait`]
    /// elapses. While awaiting a choice it repeats the await directive.
    pub fn step(&mut self) -> Directive {
        match self.cursor.clone() {
            Cursor::Idle => {
                self.record(PlaybackEvent::Started {
                    run_id: self.run_id,
                });
                self.enter(0)
            }
            Cursor::Typing(at) => {
                self.typing = None;
                self.reveal_at(at.index)
            }
            Cursor::Revealed(at) => self.after_reveal(at.index),
            Cursor::Advancing(Some(at)) => self.enter(at.index),
            Cursor::Advancing(None) => self.finish(),
            Cursor::AwaitingChoice(at) => Directive::AwaitChoice(at.id),
            Cursor::Finished | Cursor::Cancelled => Directive::Stop,
        }
    }

    /// Applies the reader's decision at the current fork.
    ///
    /// Returns `None` if the machine is not awaiting a choice. An option
    /// whose target is missing, or whose fallback runs past the end of the
    /// script, finishes the run.
    pub fn choose(&mut self, option: OptionId) -> Option<Directive> {
        let Cursor::AwaitingChoice(At { index, id }) = &self.cursor else {
            return None;
        };
        let (index, message_id) = (*index, id.clone());
        self.awaiting = None;

        let successor = StoryGraph::new(&self.script).choice_target(index, option);
        let next = match successor {
            Successor::At(next) => self.at(next),
            Successor::Missing(target) => {
                warn!(run_id = %self.run_id, %message_id, %target, "choice target does not exist");
                None
            }
            Successor::End | Successor::Undecided => None,
        };
        let target = next.as_ref().map(|at| at.id.clone());

        self.record(PlaybackEvent::ChoiceResolved {
            run_id: self.run_id,
            message_id,
            option,
            target,
        });

        Some(match next {
            Some(next) => {
                self.cursor = Cursor::Advancing(Some(next));
                Directive::Wait(self.pacing)
            }
            None => self.finish(),
        })
    }

    /// Stops the run. Returns false if it had already ended.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.cursor, Cursor::Finished | Cursor::Cancelled) {
            return false;
        }
        self.cursor = Cursor::Cancelled;
        self.typing = None;
        self.awaiting = None;
        self.revealed.clear();
        self.revealed_set.clear();
        self.record(PlaybackEvent::Cancelled {
            run_id: self.run_id,
        });
        true
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> PlaybackPhase {
        match &self.cursor {
            Cursor::Idle => PlaybackPhase::Idle,
            Cursor::Typing(at) => PlaybackPhase::Typing {
                message_id: at.id.clone(),
            },
            Cursor::Revealed(at) => PlaybackPhase::Revealed {
                message_id: at.id.clone(),
            },
            Cursor::Advancing(next) => PlaybackPhase::Advancing {
                next: next.as_ref().map(|at| at.id.clone()),
            },
            Cursor::AwaitingChoice(at) => PlaybackPhase::AwaitingChoice {
                message_id: at.id.clone(),
            },
            Cursor::Finished => PlaybackPhase::Finished,
            Cursor::Cancelled => PlaybackPhase::Cancelled,
        }
    }

    /// The observable state of this run.
    #[must_use]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            run_id: Some(self.run_id),
            phase: self.phase(),
            typing: self.typing.clone(),
            awaiting: self.awaiting.clone(),
            revealed: self.revealed.clone(),
            started_at: Some(self.started_at),
        }
    }

    /// Events produced since the last call to
    /// [`PlaybackMachine::take_events`].
    #[must_use]
    pub fn uncommitted_events(&self) -> &[PlaybackEvent] {
        &self.uncommitted_events
    }

    /// Drains pending events for publishing.
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.uncommitted_events)
    }

    fn record(&mut self, event: PlaybackEvent) {
        self.uncommitted_events.push(event);
    }

    fn at(&self, index: usize) -> Option<At> {
        self.script.get(index).map(|m| At {
            index,
            id: m.id.clone(),
        })
    }

    fn enter(&mut self, index: usize) -> Directive {
        let Some(message) = self.script.get(index) else {
            return self.finish();
        };
        if message.delay_ms == 0 {
            return self.reveal_at(index);
        }
        let delay = Duration::from_millis(message.delay_ms);
        let message_id = message.id.clone();
        let sender_id = message.sender_id.clone();

        self.cursor = Cursor::Typing(At {
            index,
            id: message_id.clone(),
        });
        self.typing = Some(message_id.clone());
        self.record(PlaybackEvent::TypingStarted {
            run_id: self.run_id,
            message_id,
            sender_id,
        });
        Directive::Wait(delay)
    }

    fn reveal_at(&mut self, index: usize) -> Directive {
        let Some(message_id) = self.script.get(index).map(|m| m.id.clone()) else {
            return self.finish();
        };
        self.reveal(message_id.clone());
        self.cursor = Cursor::Revealed(At {
            index,
            id: message_id,
        });
        self.after_reveal(index)
    }

    /// Appends `message_id` to the visible output. Re-revealing an id is a
    /// no-op.
    fn reveal(&mut self, message_id: MessageId) -> bool {
        if !self.revealed_set.insert(message_id.clone()) {
            return false;
        }
        self.revealed.push(message_id.clone());
        self.record(PlaybackEvent::MessageRevealed {
            run_id: self.run_id,
            message_id,
        });
        true
    }

    fn after_reveal(&mut self, index: usize) -> Directive {
        let Some(message) = self.script.get(index) else {
            return self.finish();
        };
        match message.kind {
            MessageKind::Choice => {
                let message_id = message.id.clone();
                self.cursor = Cursor::AwaitingChoice(At {
                    index,
                    id: message_id.clone(),
                });
                self.awaiting = Some(message_id.clone());
                self.record(PlaybackEvent::AwaitingChoice {
                    run_id: self.run_id,
                    message_id: message_id.clone(),
                });
                Directive::AwaitChoice(message_id)
            }
            MessageKind::Line => {
                let next = StoryGraph::new(&self.script)
                    .next_in_order(index)
                    .and_then(|next| self.at(next));
                self.cursor = Cursor::Advancing(next);
                Directive::Wait(self.pacing)
            }
        }
    }

    /// Ends the run and leaves the whole script visible.
    fn finish(&mut self) -> Directive {
        self.cursor = Cursor::Finished;
        self.typing = None;
        self.awaiting = None;
        self.revealed = self.script.ids().cloned().collect();
        self.revealed_set = self.revealed.iter().cloned().collect();
        self.record(PlaybackEvent::Finished {
            run_id: self.run_id,
        });
        Directive::Stop
    }
}
