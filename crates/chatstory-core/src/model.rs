//! Story data model: characters, messages and their two-way choices.
//!
//! Field names on the wire follow the builder's draft format (`senderId`,
//! `nextId`, `type`, `delay`) so drafts exported from the editor decode
//! directly.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a message within a script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a message identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a character in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(String);

impl CharacterId {
    /// Creates a character identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CharacterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Which side of the conversation a character's bubbles appear on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left-hand bubbles.
    Left,
    /// Right-hand bubbles.
    Right,
}

/// A participant in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Roster identifier referenced by `Message::sender_id`.
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// Bubble side.
    pub side: Side,
    /// Bubble color, as authored (e.g. `#4f46e5`).
    pub color: String,
}

/// Whether a message is an ordinary line or a two-way fork.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A plain line; its successor is the next message in order.
    #[default]
    Line,
    /// A fork whose successor depends on the reader's decision.
    Choice,
}

/// One of the two options of a choice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionId {
    /// First option.
    A,
    /// Second option.
    B,
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("a"),
            Self::B => f.write_str("b"),
        }
    }
}

/// An option offered by a choice message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    /// Option identifier.
    pub id: OptionId,
    /// Label shown to the reader.
    #[serde(default)]
    pub text: String,
    /// Explicit successor. `None` means "next message in order", resolved
    /// when the decision is made rather than when it is authored.
    #[serde(default)]
    pub next_id: Option<MessageId>,
}

impl ChoiceOption {
    /// Creates an option.
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>, next_id: Option<MessageId>) -> Self {
        Self {
            id,
            text: text.into(),
            next_id,
        }
    }

    /// Creates an option with no label and no explicit successor.
    #[must_use]
    pub fn blank(id: OptionId) -> Self {
        Self::new(id, "", None)
    }

    /// Returns the explicit successor, treating an empty id as absent.
    #[must_use]
    pub fn target(&self) -> Option<&MessageId> {
        self.next_id.as_ref().filter(|id| !id.as_str().is_empty())
    }
}

fn blank_choices() -> [ChoiceOption; 2] {
    [ChoiceOption::blank(OptionId::A), ChoiceOption::blank(OptionId::B)]
}

/// Accepts any JSON number or null and truncates it to whole milliseconds.
/// Anything that is not a positive finite number becomes 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn delay_from_draft<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let delay = Option::<f64>::deserialize(deserializer)?;
    Ok(match delay {
        Some(ms) if ms.is_finite() && ms > 0.0 => ms.trunc() as u64,
        _ => 0,
    })
}

/// Normalizes whatever the draft holds into the `a`/`b` pair: the first
/// entry for each id wins, missing ids get a blank option.
fn choices_from_draft<'de, D>(deserializer: D) -> Result<[ChoiceOption; 2], D::Error>
where
    D: Deserializer<'de>,
{
    let mut options = Option::<Vec<ChoiceOption>>::deserialize(deserializer)?.unwrap_or_default();
    let mut take = |id: OptionId| {
        options
            .iter()
            .position(|c| c.id == id)
            .map_or_else(|| ChoiceOption::blank(id), |at| options.remove(at))
    };
    let a = take(OptionId::A);
    let b = take(OptionId::B);
    Ok([a, b])
}

/// A single entry of the script.
///
/// `choices` is always present but only consulted when `kind` is
/// [`MessageKind::Choice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier within the script.
    pub id: MessageId,
    /// Line or choice.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// The character who sends this message.
    pub sender_id: CharacterId,
    /// Message body (unused by choice messages).
    #[serde(default)]
    pub text: String,
    /// How long the sender is shown typing before the reveal.
    #[serde(
        rename = "delay",
        alias = "delayMs",
        default,
        deserialize_with = "delay_from_draft"
    )]
    pub delay_ms: u64,
    /// The two options of a choice message.
    #[serde(default = "blank_choices", deserialize_with = "choices_from_draft")]
    pub choices: [ChoiceOption; 2],
}

impl Message {
    /// Creates a line message.
    #[must_use]
    pub fn line(
        id: impl Into<MessageId>,
        sender_id: impl Into<CharacterId>,
        text: impl Into<String>,
        delay_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Line,
            sender_id: sender_id.into(),
            text: text.into(),
            delay_ms,
            choices: blank_choices(),
        }
    }

    /// Creates a choice message offering `a` and `b`.
    #[must_use]
    pub fn choice(
        id: impl Into<MessageId>,
        sender_id: impl Into<CharacterId>,
        delay_ms: u64,
        a: ChoiceOption,
        b: ChoiceOption,
    ) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Choice,
            sender_id: sender_id.into(),
            text: String::new(),
            delay_ms,
            choices: [a, b],
        }
    }

    /// Returns true if this message is a fork.
    #[must_use]
    pub fn is_choice(&self) -> bool {
        self.kind == MessageKind::Choice
    }

    /// Looks up an option by identifier.
    #[must_use]
    pub fn option(&self, option: OptionId) -> Option<&ChoiceOption> {
        self.choices.iter().find(|c| c.id == option)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<String> for CharacterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A complete draft as produced by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Story title.
    #[serde(default)]
    pub title: String,
    /// Optional blurb.
    #[serde(default)]
    pub description: String,
    /// Character roster.
    #[serde(default)]
    pub characters: Vec<Character>,
    /// Ordered script.
    #[serde(default)]
    pub messages: Vec<Message>,
}
