use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{CourseId, VideoId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title must not be empty")]
    EmptyTitle,
}

/// A catalog course entry.
///
/// Ordering on the learner dashboard follows `order_index` ascending;
/// inactive courses are hidden from the catalog but keep their rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: Option<String>,
    youtube_url: Option<String>,
    thumbnail_url: Option<String>,
    duration_minutes: Option<u32>,
    order_index: u32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Course {
    /// Rehydrate a course from a persisted row.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: CourseId,
        title: String,
        description: Option<String>,
        youtube_url: Option<String>,
        thumbnail_url: Option<String>,
        duration_minutes: Option<u32>,
        order_index: u32,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }

        Ok(Self {
            id,
            title,
            description,
            youtube_url,
            thumbnail_url,
            duration_minutes,
            order_index,
            is_active,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn youtube_url(&self) -> Option<&str> {
        self.youtube_url.as_deref()
    }

    #[must_use]
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    #[must_use]
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_minutes
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The video identifier tracked for this course, derived from its
    /// YouTube URL. `None` when the course has no playable video.
    #[must_use]
    pub fn video_id(&self) -> Option<VideoId> {
        self.youtube_url
            .as_deref()
            .and_then(VideoId::from_watch_url)
    }
}
