//! Query handlers for preview sessions.
//!
//! These compose read-only views from a session's draft and its playback
//! state.

use chatstory_core::model::{Character, Message, MessageId};
use serde::Serialize;
use uuid::Uuid;

use super::session::PreviewSession;
use crate::domain::decisions::DecisionMap;
use crate::domain::path::{PathStop, PathView};
use crate::domain::playback::{PlaybackPhase, PlaybackSnapshot};

/// What the preview pane shows right now.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewFrame {
    /// The session identifier.
    pub session_id: Uuid,
    /// Story title.
    pub title: String,
    /// Whether animated playback is running.
    pub playing: bool,
    /// Current playback phase.
    pub phase: PlaybackPhase,
    /// Messages to render, in script order.
    pub messages: Vec<Message>,
    /// Character shown typing, if any.
    pub typing: Option<Character>,
    /// Fork the run is waiting on, if any.
    pub awaiting: Option<MessageId>,
    /// Decisions made so far.
    pub decisions: DecisionMap,
}

/// Read-only view of the resolved path.
#[derive(Debug, Clone, Serialize)]
pub struct PathSummary {
    /// The session identifier.
    pub session_id: Uuid,
    /// False when no decisions exist and every message is shown.
    pub filtered: bool,
    /// Messages on the path, in visit order. Empty when unfiltered.
    pub visited: Vec<MessageId>,
    /// Where the walk stopped early, if it did.
    pub halted_at: Option<MessageId>,
    /// Why the walk stopped. `None` when unfiltered.
    pub stop: Option<PathStop>,
}

/// Composes the preview frame.
///
/// While playing, only revealed messages are candidates; otherwise the
/// whole script is. Either way the candidates are narrowed to the path
/// chosen by the recorded decisions.
#[must_use]
pub fn get_preview_frame(session: &PreviewSession) -> PreviewFrame {
    let snapshot = session.driver().snapshot();
    let draft = session.view();
    let playing = snapshot.is_playing();
    let path = crate::domain::path::resolve_path(&draft.script, &draft.decisions);

    let candidates: Vec<&MessageId> = if playing {
        snapshot.revealed.iter().collect()
    } else {
        draft.script.ids().collect()
    };
    let messages = candidates
        .into_iter()
        .filter(|id| path.shows(id))
        .filter_map(|id| draft.script.message(id).cloned())
        .collect();

    let typing = snapshot
        .typing
        .as_ref()
        .and_then(|id| draft.script.message(id))
        .and_then(|message| draft.roster.get(&message.sender_id))
        .cloned();

    PreviewFrame {
        session_id: session.id(),
        title: draft.title,
        playing,
        phase: snapshot.phase,
        messages,
        typing,
        awaiting: snapshot.awaiting,
        decisions: draft.decisions,
    }
}

/// Resolves the path for the session's current decisions.
#[must_use]
pub fn get_path(session: &PreviewSession) -> PathSummary {
    match session.path() {
        PathView::Unfiltered => PathSummary {
            session_id: session.id(),
            filtered: false,
            visited: Vec::new(),
            halted_at: None,
            stop: None,
        },
        PathView::Filtered(path) => PathSummary {
            session_id: session.id(),
            filtered: true,
            visited: path.visited().to_vec(),
            halted_at: path.halted_at().cloned(),
            stop: Some(path.stop().clone()),
        },
    }
}

/// Current playback state.
#[must_use]
pub fn get_playback(session: &PreviewSession) -> PlaybackSnapshot {
    session.driver().snapshot()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chatstory_core::model::{OptionId, Story};
    use chatstory_core::timer::Timer;
    use chatstory_test_support::{
        FixedClock, InstantTimer, ManualTimer, sample_roster, sample_script,
    };

    use super::*;
    use crate::application::driver::PlaybackDriver;
    use crate::domain::playback::PlaybackConfig;

    fn session_with(timer: Arc<dyn Timer>) -> PreviewSession {
        let driver = PlaybackDriver::new(
            timer,
            Arc::new(FixedClock::standard()),
            PlaybackConfig::default(),
        );
        let story = Story {
            title: "3am".to_owned(),
            description: String::new(),
            characters: sample_roster().into(),
            messages: sample_script().into(),
        };
        PreviewSession::open(story, driver).unwrap()
    }

    fn ids(frame: &PreviewFrame) -> Vec<&str> {
        frame.messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_idle_frame_shows_whole_script() {
        let session = session_with(Arc::new(InstantTimer::new()));

        let frame = get_preview_frame(&session);

        assert!(!frame.playing);
        assert_eq!(ids(&frame), vec!["m1", "m2", "m3", "m4", "m5"]);
        assert!(frame.typing.is_none());
    }

    #[test]
    fn test_idle_frame_follows_static_choice() {
        // Arrange
        let session = session_with(Arc::new(InstantTimer::new()));
        session.choose(&"m3".into(), OptionId::B);

        // Act
        let frame = get_preview_frame(&session);

        // Assert
        assert_eq!(ids(&frame), vec!["m1", "m2", "m3", "m5"]);
    }

    #[tokio::test]
    async fn test_playing_frame_shows_only_revealed_messages() {
        // Arrange
        let timer = Arc::new(ManualTimer::new());
        let session = session_with(timer.clone());
        session.play();
        let mut rx = session.driver().subscribe();

        // Act: let m1's typing delay elapse, then wait for m2 to be typed.
        timer.release(2);
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| s.typing.as_ref().map(MessageId::as_str) == Some("m2")),
        )
        .await
        .expect("timed out")
        .expect("driver dropped");
        let frame = get_preview_frame(&session);

        // Assert
        assert!(frame.playing);
        assert_eq!(ids(&frame), vec!["m1"]);
        assert_eq!(frame.typing.map(|c| c.name), Some("Riley".to_owned()));
    }

    #[test]
    fn test_get_path_unfiltered_without_decisions() {
        let session = session_with(Arc::new(InstantTimer::new()));

        let summary = get_path(&session);

        assert!(!summary.filtered);
        assert!(summary.visited.is_empty());
        assert!(summary.stop.is_none());
    }

    #[test]
    fn test_get_path_filtered_after_decision() {
        // Arrange
        let session = session_with(Arc::new(InstantTimer::new()));
        session.choose(&"m3".into(), OptionId::A);

        // Act
        let summary = get_path(&session);

        // Assert
        assert!(summary.filtered);
        let visited: Vec<&str> = summary.visited.iter().map(MessageId::as_str).collect();
        assert_eq!(visited, vec!["m1", "m2", "m3", "m4", "m5"]);
        assert_eq!(summary.stop, Some(PathStop::End));
        assert!(summary.halted_at.is_none());
    }

    #[test]
    fn test_get_playback_defaults_to_idle() {
        let session = session_with(Arc::new(InstantTimer::new()));

        let snapshot = get_playback(&session);

        assert_eq!(snapshot.phase, PlaybackPhase::Idle);
        assert!(snapshot.run_id.is_none());
    }
}
