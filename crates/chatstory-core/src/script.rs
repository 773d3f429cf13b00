//! Ordered scripts and character rosters.
//!
//! A `Script` keeps the authored order (which defines "next in order" and
//! the playback starting point) alongside an id → position index built once
//! at construction.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::model::{Character, CharacterId, Message, MessageId};

/// The ordered sequence of messages forming the narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Message>", into = "Vec<Message>")]
pub struct Script {
    messages: Vec<Message>,
    positions: HashMap<MessageId, usize>,
}

impl Script {
    /// Builds a script from messages in authored order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if two messages share an id.
    pub fn new(messages: Vec<Message>) -> Result<Self, DomainError> {
        let mut positions = HashMap::with_capacity(messages.len());
        for (index, message) in messages.iter().enumerate() {
            if positions.insert(message.id.clone(), index).is_some() {
                return Err(DomainError::Validation(format!(
                    "duplicate message id: {}",
                    message.id
                )));
            }
        }
        Ok(Self {
            messages,
            positions,
        })
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the script has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages in authored order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Message at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Position of the message with the given id.
    #[must_use]
    pub fn position(&self, id: &MessageId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Message with the given id.
    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.position(id).and_then(|index| self.messages.get(index))
    }

    /// Message ids in authored order.
    pub fn ids(&self) -> impl Iterator<Item = &MessageId> {
        self.messages.iter().map(|m| &m.id)
    }

    /// The ordered id list. Two scripts with equal structure differ only in
    /// message content.
    #[must_use]
    pub fn structure(&self) -> ScriptStructure {
        ScriptStructure(self.ids().cloned().collect())
    }

    /// Returns a copy of this script without the messages sent by `sender`.
    #[must_use]
    pub fn without_sender(&self, sender: &CharacterId) -> Self {
        let messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| &m.sender_id != sender)
            .cloned()
            .collect();
        let positions = messages
            .iter()
            .enumerate()
            .map(|(index, m)| (m.id.clone(), index))
            .collect();
        Self {
            messages,
            positions,
        }
    }
}

impl TryFrom<Vec<Message>> for Script {
    type Error = DomainError;

    fn try_from(messages: Vec<Message>) -> Result<Self, Self::Error> {
        Self::new(messages)
    }
}

impl From<Script> for Vec<Message> {
    fn from(script: Script) -> Self {
        script.messages
    }
}

/// Ordered message ids of a script, used to detect structural edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStructure(Vec<MessageId>);

/// The set of characters messages may be sent by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Character>", into = "Vec<Character>")]
pub struct Roster {
    characters: Vec<Character>,
}

impl Roster {
    /// Builds a roster.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if two characters share an id.
    pub fn new(characters: Vec<Character>) -> Result<Self, DomainError> {
        let mut seen = HashSet::with_capacity(characters.len());
        for character in &characters {
            if !seen.insert(&character.id) {
                return Err(DomainError::Validation(format!(
                    "duplicate character id: {}",
                    character.id
                )));
            }
        }
        Ok(Self { characters })
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Returns true if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Characters in roster order.
    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Resolves a sender id.
    #[must_use]
    pub fn get(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| &c.id == id)
    }

    /// Removes a character. Returns false if it was not present.
    pub fn remove(&mut self, id: &CharacterId) -> bool {
        let before = self.characters.len();
        self.characters.retain(|c| &c.id != id);
        self.characters.len() != before
    }
}

impl TryFrom<Vec<Character>> for Roster {
    type Error = DomainError;

    fn try_from(characters: Vec<Character>) -> Result<Self, Self::Error> {
        Self::new(characters)
    }
}

impl From<Roster> for Vec<Character> {
    fn from(roster: Roster) -> Self {
        roster.characters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChoiceOption, OptionId, Side};

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::line("m1", "c1", "Hey. You awake?", 800),
            Message::line("m2", "c2", "Barely. What's up?", 1200),
            Message::choice(
                "m3",
                "c1",
                1500,
                ChoiceOption::new(OptionId::A, "It's nothing.", Some("m1".into())),
                ChoiceOption::blank(OptionId::B),
            ),
        ]
    }

    #[test]
    fn test_new_indexes_positions() {
        // Arrange / Act
        let script = Script::new(sample_messages()).unwrap();

        // Assert
        assert_eq!(script.len(), 3);
        assert_eq!(script.position(&"m2".into()), Some(1));
        assert_eq!(script.message(&"m3".into()).map(|m| m.delay_ms), Some(1500));
        assert_eq!(script.position(&"m9".into()), None);
    }

    #[test]
    fn test_new_rejects_duplicate_message_ids() {
        // Arrange
        let mut messages = sample_messages();
        messages.push(Message::line("m2", "c1", "again", 0));

        // Act
        let result = Script::new(messages);

        // Assert
        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("m2")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_rejects_duplicate_ids() {
        let json = serde_json::json!([
            { "id": "m1", "senderId": "c1" },
            { "id": "m1", "senderId": "c2" }
        ]);

        let result: Result<Script, _> = serde_json::from_value(json);

        assert!(result.is_err());
    }

    #[test]
    fn test_structure_ignores_content_changes() {
        // Arrange
        let script = Script::new(sample_messages()).unwrap();
        let mut edited = sample_messages();
        edited[0].text = "Psst.".to_owned();
        let edited = Script::new(edited).unwrap();

        let mut reordered = sample_messages();
        reordered.swap(0, 1);
        let reordered = Script::new(reordered).unwrap();

        // Assert
        assert_eq!(script.structure(), edited.structure());
        assert_ne!(script.structure(), reordered.structure());
    }

    #[test]
    fn test_without_sender_drops_messages_and_reindexes() {
        // Arrange
        let script = Script::new(sample_messages()).unwrap();

        // Act
        let trimmed = script.without_sender(&"c2".into());

        // Assert
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed.position(&"m3".into()), Some(1));
        assert_eq!(trimmed.position(&"m2".into()), None);
    }

    #[test]
    fn test_roster_rejects_duplicates_and_removes() {
        let alex = Character {
            id: "c1".into(),
            name: "Alex".to_owned(),
            side: Side::Left,
            color: "#4f46e5".to_owned(),
        };

        assert!(Roster::new(vec![alex.clone(), alex.clone()]).is_err());

        let mut roster = Roster::new(vec![alex]).unwrap();
        assert_eq!(roster.get(&"c1".into()).map(|c| c.name.as_str()), Some("Alex"));
        assert!(roster.remove(&"c1".into()));
        assert!(!roster.remove(&"c1".into()));
        assert!(roster.is_empty());
    }
}
