use std::sync::Arc;

use academy_core::model::VideoId;
use academy_core::progress::LearnerProgress;
use remote::repository::WatchSessionRepository;

use crate::auth::AuthContext;
use crate::error::ProgressServiceError;

/// Answers "what is my progress across this set of videos?".
///
/// One batched read per snapshot; all derivation happens in core. Without a
/// signed-in learner the service stays inert and reports empty progress.
#[derive(Clone)]
pub struct ProgressService {
    auth: AuthContext,
    sessions: Arc<dyn WatchSessionRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(auth: AuthContext, sessions: Arc<dyn WatchSessionRepository>) -> Self {
        Self { auth, sessions }
    }

    /// Fetch the learner's sessions for the given videos and aggregate them.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Remote` if the batched read fails.
    pub async fn snapshot(
        &self,
        video_ids: Vec<VideoId>,
    ) -> Result<LearnerProgress, ProgressServiceError> {
        let Some(learner) = self.auth.learner() else {
            return Ok(LearnerProgress::empty(video_ids));
        };
        if video_ids.is_empty() {
            return Ok(LearnerProgress::empty(video_ids));
        }

        let sessions = self.sessions.sessions_for_videos(learner, &video_ids).await?;
        Ok(LearnerProgress::from_sessions(video_ids, sessions))
    }
}
