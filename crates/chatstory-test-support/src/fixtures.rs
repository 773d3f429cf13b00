//! Story fixtures shared by the test suites.

use chatstory_core::model::{Character, ChoiceOption, Message, MessageId, OptionId, Side};
use chatstory_core::script::{Roster, Script};

/// Builds a script, panicking on duplicate ids.
///
/// # Panics
///
/// Panics if two messages share an id.
#[must_use]
pub fn script_of(messages: Vec<Message>) -> Script {
    Script::new(messages).expect("fixture scripts have unique ids")
}

/// The builder's starter conversation: two lines, a fork routing `a` to
/// `m4` and `b` to `m5`, then the two follow-up lines.
#[must_use]
pub fn sample_script() -> Script {
    script_of(vec![
        Message::line("m1", "c1", "Hey. You awake?", 800),
        Message::line("m2", "c2", "Barely. What's up?", 1200),
        Message::choice(
            "m3",
            "c1",
            1500,
            ChoiceOption::new(
                OptionId::A,
                "It's nothing, never mind.",
                Some(MessageId::new("m4")),
            ),
            ChoiceOption::new(
                OptionId::B,
                "I think someone is outside.",
                Some(MessageId::new("m5")),
            ),
        ),
        Message::line(
            "m4",
            "c2",
            "You can't text me at 3am and say it's nothing.",
            1500,
        ),
        Message::line("m5", "c2", "Wait, what? Outside where?", 1500),
    ])
}

/// Alex (left) and Riley (right).
///
/// # Panics
///
/// Never in practice; the ids are distinct.
#[must_use]
pub fn sample_roster() -> Roster {
    Roster::new(vec![
        Character {
            id: "c1".into(),
            name: "Alex".to_owned(),
            side: Side::Left,
            color: "#4f46e5".to_owned(),
        },
        Character {
            id: "c2".into(),
            name: "Riley".to_owned(),
            side: Side::Right,
            color: "#ec4899".to_owned(),
        },
    ])
    .expect("fixture roster has unique ids")
}
