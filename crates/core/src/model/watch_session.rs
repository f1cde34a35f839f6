use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{LearnerId, SessionId, VideoId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WatchSessionError {
    #[error("session_end is before session_start")]
    InvalidTimeRange,

    #[error("completion percentage out of range: {0}")]
    InvalidPercentage(u8),
}

/// One watch attempt for a (learner, video) pair.
///
/// The Remote Data Service owns the durable row; this type is the validated
/// in-memory view. A session is "open" while `completed` is false. The
/// tracker resumes an open session instead of creating a second one, and
/// `completed` flips to true at most once over the row's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSession {
    id: SessionId,
    learner_id: LearnerId,
    video_id: VideoId,
    session_start: DateTime<Utc>,
    session_end: Option<DateTime<Utc>>,
    watch_time_seconds: u32,
    last_position_seconds: u32,
    video_duration_seconds: Option<u32>,
    completion_percentage: u8,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl WatchSession {
    /// Rehydrate a watch session from a persisted row.
    ///
    /// # Errors
    ///
    /// Returns `WatchSessionError::InvalidTimeRange` if `session_end`
    /// precedes `session_start`, or `WatchSessionError::InvalidPercentage`
    /// if the stored percentage exceeds 100.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        learner_id: LearnerId,
        video_id: VideoId,
        session_start: DateTime<Utc>,
        session_end: Option<DateTime<Utc>>,
        watch_time_seconds: u32,
        last_position_seconds: u32,
        video_duration_seconds: Option<u32>,
        completion_percentage: u8,
        completed: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, WatchSessionError> {
        if let Some(end) = session_end {
            if end < session_start {
                return Err(WatchSessionError::InvalidTimeRange);
            }
        }
        if completion_percentage > 100 {
            return Err(WatchSessionError::InvalidPercentage(completion_percentage));
        }

        Ok(Self {
            id,
            learner_id,
            video_id,
            session_start,
            session_end,
            watch_time_seconds,
            last_position_seconds,
            video_duration_seconds,
            completion_percentage,
            completed,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    #[must_use]
    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    #[must_use]
    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    #[must_use]
    pub fn session_end(&self) -> Option<DateTime<Utc>> {
        self.session_end
    }

    #[must_use]
    pub fn watch_time_seconds(&self) -> u32 {
        self.watch_time_seconds
    }

    #[must_use]
    pub fn last_position_seconds(&self) -> u32 {
        self.last_position_seconds
    }

    #[must_use]
    pub fn video_duration_seconds(&self) -> Option<u32> {
        self.video_duration_seconds
    }

    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// True while the session can still be resumed and mutated.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.completed
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
