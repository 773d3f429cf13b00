//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use chatstory_core::clock::Clock;
use chatstory_core::error::DomainError;
use chatstory_core::model::Story;
use chatstory_core::timer::Timer;
use chatstory_narrative::application::driver::PlaybackDriver;
use chatstory_narrative::application::session::PreviewSession;
use chatstory_narrative::domain::playback::PlaybackConfig;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Open preview sessions by story id.
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<PreviewSession>>>>,
    /// Clock used to stamp runs.
    pub clock: Arc<dyn Clock>,
    /// Scheduler for typing and pacing waits.
    pub timer: Arc<dyn Timer>,
    /// Playback tunables for new sessions.
    pub playback: PlaybackConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, timer: Arc<dyn Timer>, playback: PlaybackConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
            timer,
            playback,
        }
    }

    /// Opens a preview session for `story` and registers it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the story has duplicate ids.
    pub async fn open_story(&self, story: Story) -> Result<Arc<PreviewSession>, DomainError> {
        let driver = PlaybackDriver::new(
            Arc::clone(&self.timer),
            Arc::clone(&self.clock),
            self.playback,
        );
        let session = Arc::new(PreviewSession::open(story, driver)?);
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::clone(&session));
        Ok(session)
    }

    /// Looks up an open session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StoryNotFound` if no session has this id.
    pub async fn session(&self, story_id: Uuid) -> Result<Arc<PreviewSession>, DomainError> {
        self.sessions
            .read()
            .await
            .get(&story_id)
            .cloned()
            .ok_or(DomainError::StoryNotFound(story_id))
    }

    /// Unregisters a session and stops any playback it has in flight.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StoryNotFound` if no session has this id.
    pub async fn close_story(&self, story_id: Uuid) -> Result<(), DomainError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&story_id)
            .ok_or(DomainError::StoryNotFound(story_id))?;
        session.stop();
        Ok(())
    }
}
