//! The reader's decisions at each fork.

use std::collections::HashMap;

use chatstory_core::model::{MessageId, OptionId};
use serde::{Deserialize, Serialize};

/// Choice-message id → chosen option, accumulated over one preview session
/// and cleared whenever playback starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionMap(HashMap<MessageId, OptionId>);

impl DecisionMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) the decision for a fork.
    pub fn record(&mut self, message_id: MessageId, option: OptionId) {
        self.0.insert(message_id, option);
    }

    /// The decision made at `message_id`, if any.
    #[must_use]
    pub fn get(&self, message_id: &MessageId) -> Option<OptionId> {
        self.0.get(message_id).copied()
    }

    /// Returns true if no decision has been made.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Forgets every decision.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<const N: usize> From<[(MessageId, OptionId); N]> for DecisionMap {
    fn from(entries: [(MessageId, OptionId); N]) -> Self {
        Self(HashMap::from(entries))
    }
}
