//! Path resolution: which messages a reader is on, given their decisions.

use std::collections::HashSet;

use chatstory_core::model::MessageId;
use chatstory_core::script::Script;
use serde::Serialize;

use super::decisions::DecisionMap;
use super::graph::{StoryGraph, Successor};

/// Why a path walk stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PathStop {
    /// The walk ran off the end of the script.
    End,
    /// The walk reached a fork with no decision.
    Undecided {
        /// The fork awaiting a decision.
        message_id: MessageId,
    },
    /// The chosen option points at a message that does not exist.
    Missing {
        /// The fork whose option dangles.
        message_id: MessageId,
        /// The id that could not be found.
        target: MessageId,
    },
    /// The next message is already on the path.
    Revisit {
        /// The message whose successor was already visited.
        message_id: MessageId,
        /// The message that would be visited twice.
        target: MessageId,
    },
}

/// A computed path from the first message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    visited: Vec<MessageId>,
    #[serde(skip)]
    members: HashSet<MessageId>,
    stop: PathStop,
}

impl ResolvedPath {
    /// Visited ids in walk order.
    #[must_use]
    pub fn visited(&self) -> &[MessageId] {
        &self.visited
    }

    /// Returns true if `id` is on the path.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.members.contains(id)
    }

    /// Why the walk stopped.
    #[must_use]
    pub fn stop(&self) -> &PathStop {
        &self.stop
    }

    /// The message where the walk halted, or `None` if it reached the end.
    #[must_use]
    pub fn halted_at(&self) -> Option<&MessageId> {
        match &self.stop {
            PathStop::End => None,
            PathStop::Undecided { message_id }
            | PathStop::Missing { message_id, .. }
            | PathStop::Revisit { message_id, .. } => Some(message_id),
        }
    }
}

/// Result of [`resolve_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PathView {
    /// No decision has been made yet: show the whole script unfiltered.
    Unfiltered,
    /// Show only the messages on this path.
    Filtered(ResolvedPath),
}

impl PathView {
    /// Returns true if `id` should be shown.
    #[must_use]
    pub fn shows(&self, id: &MessageId) -> bool {
        match self {
            Self::Unfiltered => true,
            Self::Filtered(path) => path.contains(id),
        }
    }

    /// The resolved path, unless unfiltered.
    #[must_use]
    pub fn path(&self) -> Option<&ResolvedPath> {
        match self {
            Self::Unfiltered => None,
            Self::Filtered(path) => Some(path),
        }
    }
}

/// Resolves what the preview should show for the decisions made so far.
///
/// An empty decision map yields [`PathView::Unfiltered`], which differs from
/// a filtered path that happens to include every id whenever some messages
/// are unreachable. Otherwise the result is [`walk_path`].
#[must_use]
pub fn resolve_path(script: &Script, decisions: &DecisionMap) -> PathView {
    if decisions.is_empty() {
        return PathView::Unfiltered;
    }
    PathView::Filtered(walk_path(script, decisions))
}

/// Walks the script from its first message following `decisions`.
///
/// Lines continue to the next message in order. A fork without a decision
/// halts the walk; a decided fork follows the chosen option's target, or the
/// message after the fork when the option has none. A target that does not
/// exist halts the walk, as does reaching a message already visited, so
/// every call finishes in a single pass.
#[must_use]
pub fn walk_path(script: &Script, decisions: &DecisionMap) -> ResolvedPath {
    let graph = StoryGraph::new(script);
    let mut visited = Vec::new();
    let mut members = HashSet::new();

    let mut cursor = if script.is_empty() { None } else { Some(0) };
    let stop = loop {
        let Some(index) = cursor else {
            break PathStop::End;
        };
        let Some(message) = script.get(index) else {
            break PathStop::End;
        };
        visited.push(message.id.clone());
        members.insert(message.id.clone());

        match graph.successor(index, decisions) {
            Successor::At(next) => {
                let Some(target) = script.get(next) else {
                    break PathStop::End;
                };
                if members.contains(&target.id) {
                    break PathStop::Revisit {
                        message_id: message.id.clone(),
                        target: target.id.clone(),
                    };
                }
                cursor = Some(next);
            }
            Successor::End => cursor = None,
            Successor::Missing(target) => {
                break PathStop::Missing {
                    message_id: message.id.clone(),
                    target,
                };
            }
            Successor::Undecided => {
                break PathStop::Undecided {
                    message_id: message.id.clone(),
                };
            }
        }
    };

    ResolvedPath {
        visited,
        members,
        stop,
    }
}
