//! A preview session: one draft being previewed, its reader decisions and
//! its playback driver.
//!
//! The session is the only place the draft changes while a preview is
//! open, so it is also where edits are turned into playback reactions: a
//! structural edit cancels the run in flight, a content-only edit restarts
//! it on the new script.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chatstory_core::error::DomainError;
use chatstory_core::model::{Character, CharacterId, Message, MessageId, OptionId, Story};
use chatstory_core::script::{Roster, Script};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::driver::{PlaybackDriver, RunHandle};
use crate::domain::decisions::DecisionMap;
use crate::domain::path::{PathView, resolve_path};

/// How an edit affected playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEffect {
    /// Nothing was playing.
    Unchanged,
    /// The script's structure changed; the run was cancelled.
    Cancelled,
    /// Only content changed; the run restarted from the top.
    Restarted,
}

/// Result of a reader clicking a choice option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceOutcome {
    /// The decision was stored for path resolution.
    pub recorded: bool,
    /// The decision resumed a suspended run.
    pub resumed: bool,
}

/// Point-in-time copy of a session's draft.
#[derive(Debug, Clone)]
pub struct DraftView {
    /// Story title.
    pub title: String,
    /// Story description.
    pub description: String,
    /// Current script.
    pub script: Arc<Script>,
    /// Current roster.
    pub roster: Roster,
    /// Decisions made so far.
    pub decisions: DecisionMap,
}

#[derive(Debug)]
struct Draft {
    title: String,
    description: String,
    roster: Roster,
    script: Arc<Script>,
    decisions: DecisionMap,
}

/// One draft open for preview.
#[derive(Debug)]
pub struct PreviewSession {
    id: Uuid,
    draft: Mutex<Draft>,
    driver: PlaybackDriver,
}

impl PreviewSession {
    /// Opens a session on `story`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if message or character ids repeat.
    pub fn open(story: Story, driver: PlaybackDriver) -> Result<Self, DomainError> {
        let roster = Roster::new(story.characters)?;
        let script = Script::new(story.messages)?;
        Ok(Self {
            id: Uuid::new_v4(),
            draft: Mutex::new(Draft {
                title: story.title,
                description: story.description,
                roster,
                script: Arc::new(script),
                decisions: DecisionMap::new(),
            }),
            driver,
        })
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The playback driver.
    #[must_use]
    pub fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }

    /// Copies the current draft.
    #[must_use]
    pub fn view(&self) -> DraftView {
        let draft = self.draft();
        DraftView {
            title: draft.title.clone(),
            description: draft.description.clone(),
            script: Arc::clone(&draft.script),
            roster: draft.roster.clone(),
            decisions: draft.decisions.clone(),
        }
    }

    /// Starts animated playback from the top with a fresh decision map.
    pub fn play(&self) -> Option<RunHandle> {
        let mut draft = self.draft();
        draft.decisions.clear();
        self.driver.start(Arc::clone(&draft.script))
    }

    /// Stops animated playback.
    pub fn stop(&self) -> bool {
        self.driver.cancel()
    }

    /// Records the reader's pick at a fork and, if playback is suspended
    /// there, resumes it.
    pub fn choose(&self, message_id: &MessageId, option: OptionId) -> ChoiceOutcome {
        let mut draft = self.draft();
        let recorded = draft
            .script
            .message(message_id)
            .is_some_and(Message::is_choice);
        if recorded {
            draft.decisions.record(message_id.clone(), option);
        } else {
            debug!(%message_id, "not a choice message; decision not recorded");
        }
        let resumed = self.driver.resolve_choice(message_id, option);
        ChoiceOutcome { recorded, resumed }
    }

    /// Replaces the script with an edited version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if message ids repeat; the current
    /// script is kept.
    pub fn replace_script(&self, messages: Vec<Message>) -> Result<PlaybackEffect, DomainError> {
        let script = Script::new(messages)?;
        let mut draft = self.draft();
        let structural = draft.script.structure() != script.structure();
        draft.script = Arc::new(script);
        Ok(self.react_to_edit(&mut draft, structural))
    }

    /// Deletes a character and every message it sent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the character is not in the
    /// roster.
    pub fn remove_character(&self, character_id: &CharacterId) -> Result<PlaybackEffect, DomainError> {
        let mut draft = self.draft();
        if !draft.roster.remove(character_id) {
            return Err(DomainError::Validation(format!(
                "unknown character: {character_id}"
            )));
        }
        let script = draft.script.without_sender(character_id);
        draft.script = Arc::new(script);
        // The roster shrank, which always counts as structural.
        Ok(self.react_to_edit(&mut draft, true))
    }

    /// The path for the current decisions.
    #[must_use]
    pub fn path(&self) -> PathView {
        let draft = self.draft();
        resolve_path(&draft.script, &draft.decisions)
    }

    /// The character currently shown typing, if playback is in a typing
    /// phase and the sender resolves.
    #[must_use]
    pub fn typing_sender(&self) -> Option<Character> {
        let typing = self.driver.snapshot().typing?;
        let draft = self.draft();
        let sender = &draft.script.message(&typing)?.sender_id;
        draft.roster.get(sender).cloned()
    }

    fn react_to_edit(&self, draft: &mut Draft, structural: bool) -> PlaybackEffect {
        if !self.driver.is_playing() {
            return PlaybackEffect::Unchanged;
        }
        if structural {
            self.driver.cancel();
            info!(session_id = %self.id, "structure changed during playback; run cancelled");
            PlaybackEffect::Cancelled
        } else {
            draft.decisions.clear();
            self.driver.start(Arc::clone(&draft.script));
            info!(session_id = %self.id, "content changed during playback; run restarted");
            PlaybackEffect::Restarted
        }
    }

    fn draft(&self) -> MutexGuard<'_, Draft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use chatstory_core::timer::Timer;
    use chatstory_test_support::{
        FixedClock, InstantTimer, ManualTimer, sample_roster, sample_script,
    };

    use crate::domain::playback::{PlaybackConfig, PlaybackPhase, PlaybackSnapshot};

    fn sample_story() -> Story {
        Story {
            title: "3am".to_owned(),
            description: String::new(),
            characters: sample_roster().into(),
            messages: sample_script().into(),
        }
    }

    fn open_with(timer: Arc<dyn Timer>) -> PreviewSession {
        let driver = PlaybackDriver::new(
            timer,
            Arc::new(FixedClock::standard()),
            PlaybackConfig::default(),
        );
        PreviewSession::open(sample_story(), driver).unwrap()
    }

    async fn wait_for(
        session: &PreviewSession,
        mut predicate: impl FnMut(&PlaybackSnapshot) -> bool,
    ) -> PlaybackSnapshot {
        let mut rx = session.driver().subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| predicate(s)))
            .await
            .expect("timed out waiting for playback state")
            .expect("driver dropped");
        snapshot.clone()
    }

    #[test]
    fn test_open_rejects_duplicate_message_ids() {
        let mut story = sample_story();
        story.messages.push(Message::line("m1", "c1", "dup", 0));
        let driver = PlaybackDriver::new(
            Arc::new(InstantTimer::new()),
            Arc::new(FixedClock::standard()),
            PlaybackConfig::default(),
        );

        let result = PreviewSession::open(story, driver);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_static_choice_filters_path() {
        // Arrange
        let session = open_with(Arc::new(InstantTimer::new()));
        assert_eq!(session.path(), PathView::Unfiltered);

        // Act
        let outcome = session.choose(&"m3".into(), OptionId::B);

        // Assert
        assert_eq!(
            outcome,
            ChoiceOutcome {
                recorded: true,
                resumed: false
            }
        );
        let path = session.path();
        assert!(path.shows(&"m5".into()));
        assert!(!path.shows(&"m4".into()));
    }

    #[test]
    fn test_choice_on_line_message_is_not_recorded() {
        let session = open_with(Arc::new(InstantTimer::new()));

        let outcome = session.choose(&"m1".into(), OptionId::A);

        assert!(!outcome.recorded);
        assert!(session.view().decisions.is_empty());
    }

    #[tokio::test]
    async fn test_play_clears_decisions_and_choice_resumes_run() {
        // Arrange
        let session = open_with(Arc::new(InstantTimer::new()));
        session.choose(&"m3".into(), OptionId::B);

        // Act
        session.play();
        assert!(session.view().decisions.is_empty());
        wait_for(&session, |s| s.awaiting.is_some()).await;
        let outcome = session.choose(&"m3".into(), OptionId::B);
        let finished = wait_for(&session, |s| s.phase == PlaybackPhase::Finished).await;

        // Assert
        assert_eq!(
            outcome,
            ChoiceOutcome {
                recorded: true,
                resumed: true
            }
        );
        assert_eq!(finished.revealed.len(), 5);
        let path = session.path();
        assert!(path.shows(&"m5".into()));
        assert!(!path.shows(&"m4".into()));
    }

    #[tokio::test]
    async fn test_structural_edit_before_first_reveal_cancels_cleanly() {
        // Arrange
        let timer = Arc::new(ManualTimer::new());
        let session = open_with(timer.clone());
        let first = session.play().unwrap();
        wait_for(&session, |s| s.typing.is_some()).await;

        // Act: delete m2 while m1 is still being typed.
        let mut messages: Vec<Message> = session.view().script.messages().to_vec();
        messages.remove(1);
        let effect = session.replace_script(messages).unwrap();
        timer.release(10);
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        // Assert
        assert_eq!(effect, PlaybackEffect::Cancelled);
        let snapshot = session.driver().snapshot();
        assert_eq!(snapshot.phase, PlaybackPhase::Cancelled);
        assert!(snapshot.revealed.is_empty());

        // A fresh run starts with nothing carried over.
        let second = session.play().unwrap();
        let snapshot = session.driver().snapshot();
        assert_ne!(first.run_id(), second.run_id());
        assert_eq!(snapshot.run_id, Some(second.run_id()));
        assert!(snapshot.revealed.is_empty());
    }

    #[tokio::test]
    async fn test_content_edit_restarts_run() {
        // Arrange
        let timer = Arc::new(ManualTimer::new());
        let session = open_with(timer.clone());
        let first = session.play().unwrap();
        wait_for(&session, |s| s.typing.is_some()).await;

        // Act
        let mut messages: Vec<Message> = session.view().script.messages().to_vec();
        messages[0].text = "Psst. You up?".to_owned();
        let effect = session.replace_script(messages).unwrap();

        // Assert
        assert_eq!(effect, PlaybackEffect::Restarted);
        let snapshot = session.driver().snapshot();
        assert_ne!(snapshot.run_id, Some(first.run_id()));
        assert!(snapshot.is_playing());
    }

    #[test]
    fn test_edit_while_idle_leaves_playback_alone() {
        let session = open_with(Arc::new(InstantTimer::new()));
        let mut messages: Vec<Message> = session.view().script.messages().to_vec();
        messages.swap(0, 1);

        let effect = session.replace_script(messages).unwrap();

        assert_eq!(effect, PlaybackEffect::Unchanged);
        assert_eq!(session.view().script.get(0).map(|m| m.id.as_str()), Some("m2"));
    }

    #[test]
    fn test_remove_character_cascades_to_messages() {
        // Arrange
        let session = open_with(Arc::new(InstantTimer::new()));

        // Act
        let effect = session.remove_character(&"c2".into()).unwrap();

        // Assert
        assert_eq!(effect, PlaybackEffect::Unchanged);
        let view = session.view();
        assert_eq!(view.roster.len(), 1);
        let ids: Vec<&str> = view.script.ids().map(MessageId::as_str).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[test]
    fn test_remove_unknown_character_is_rejected() {
        let session = open_with(Arc::new(InstantTimer::new()));

        let result = session.remove_character(&"c9".into());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_typing_sender_resolves_through_roster() {
        let session = open_with(Arc::new(ManualTimer::new()));
        session.play();
        wait_for(&session, |s| s.typing.is_some()).await;

        let sender = session.typing_sender();

        assert_eq!(sender.map(|c| c.name), Some("Alex".to_owned()));
    }
}
