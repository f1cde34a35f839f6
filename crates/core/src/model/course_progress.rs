use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{CourseId, LearnerId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseProgressError {
    #[error("progress percentage out of range: {0}")]
    InvalidPercentage(u8),
}

/// Coarse per-course progress, upserted once per (learner, course).
///
/// Distinct from watch sessions: a course is a dashboard unit, and its
/// `completed_at` is set the first time progress reaches 100%.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseProgress {
    learner_id: LearnerId,
    course_id: CourseId,
    progress_percentage: u8,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl CourseProgress {
    /// Rehydrate course progress from a persisted row.
    ///
    /// # Errors
    ///
    /// Returns `CourseProgressError::InvalidPercentage` if the stored
    /// percentage exceeds 100.
    pub fn from_persisted(
        learner_id: LearnerId,
        course_id: CourseId,
        progress_percentage: u8,
        completed_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseProgressError> {
        if progress_percentage > 100 {
            return Err(CourseProgressError::InvalidPercentage(progress_percentage));
        }

        Ok(Self {
            learner_id,
            course_id,
            progress_percentage,
            completed_at,
            created_at,
        })
    }

    #[must_use]
    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        self.progress_percentage
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress_percentage >= 100
    }
}
