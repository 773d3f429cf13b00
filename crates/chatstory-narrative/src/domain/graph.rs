//! Edge function over a script.
//!
//! The script is stored in authored order, but traversal only ever moves
//! along edges computed here: the default next-in-order edge, and for forks
//! the edge selected by a decision. Both the path resolver and the playback
//! machine go through this module rather than doing index arithmetic.

use chatstory_core::model::{MessageId, MessageKind, OptionId};
use chatstory_core::script::Script;

use super::decisions::DecisionMap;

/// Where traversal goes after a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Successor {
    /// Continue at this position.
    At(usize),
    /// No successor: the message is last in order and nothing overrides it.
    End,
    /// The explicit target does not exist in the script.
    Missing(MessageId),
    /// The message is a fork with no decision yet.
    Undecided,
}

/// Read-only view of a script as a directed graph.
#[derive(Debug, Clone, Copy)]
pub struct StoryGraph<'a> {
    script: &'a Script,
}

impl<'a> StoryGraph<'a> {
    /// Wraps a script.
    #[must_use]
    pub fn new(script: &'a Script) -> Self {
        Self { script }
    }

    /// The underlying script.
    #[must_use]
    pub fn script(&self) -> &'a Script {
        self.script
    }

    /// Position immediately after `index`, if there is one.
    #[must_use]
    pub fn next_in_order(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.script.len()).then_some(next)
    }

    /// Edge taken when `option` is chosen at the fork at `index`.
    ///
    /// An option without an explicit target falls back to the message after
    /// the fork in the current order.
    #[must_use]
    pub fn choice_target(&self, index: usize, option: OptionId) -> Successor {
        let explicit = self
            .script
            .get(index)
            .and_then(|m| m.option(option))
            .and_then(|c| c.target());

        match explicit {
            Some(target) => self
                .script
                .position(target)
                .map_or_else(|| Successor::Missing(target.clone()), Successor::At),
            None => self.next_in_order(index).map_or(Successor::End, Successor::At),
        }
    }

    /// Edge leaving the message at `index` given the decisions so far.
    #[must_use]
    pub fn successor(&self, index: usize, decisions: &DecisionMap) -> Successor {
        let Some(message) = self.script.get(index) else {
            return Successor::End;
        };
        match message.kind {
            MessageKind::Line => self.next_in_order(index).map_or(Successor::End, Successor::At),
            MessageKind::Choice => match decisions.get(&message.id) {
                Some(option) => self.choice_target(index, option),
                None => Successor::Undecided,
            },
        }
    }
}
