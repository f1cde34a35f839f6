use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use academy_core::Clock;
use academy_core::model::{
    Article, Course, CourseId, CourseProgress, LearnerId, LearnerProfile, ProfilePatch, SessionId,
    VideoId, WatchSession,
};

/// Errors surfaced by Remote Data Service adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert payload for a fresh watch session.
///
/// Counters start at zero; the backend assigns the id and the start/created
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWatchSession {
    pub learner_id: LearnerId,
    pub video_id: VideoId,
}

/// Mutable fields written on every checkpoint.
///
/// `session_end` carries a timestamp only when the write completes the
/// session; otherwise the stored value is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSessionPatch {
    pub last_position_seconds: u32,
    pub watch_time_seconds: u32,
    pub completion_percentage: u8,
    pub completed: bool,
    pub session_end: Option<DateTime<Utc>>,
    pub video_duration_seconds: Option<u32>,
}

/// Upsert payload for coarse per-course progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseProgressUpsert {
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    pub progress_percentage: u8,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Repository contract for watch sessions.
#[async_trait]
pub trait WatchSessionRepository: Send + Sync {
    /// Fetch the most recently created open session for (learner, video).
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the read fails.
    async fn latest_open_session(
        &self,
        learner_id: LearnerId,
        video_id: &VideoId,
    ) -> Result<Option<WatchSession>, RemoteError>;

    /// Insert a fresh session with zeroed counters and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the insert fails.
    async fn insert_session(&self, new: NewWatchSession) -> Result<WatchSession, RemoteError>;

    /// Apply a checkpoint patch to a session by id.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` if the row is missing, or other
    /// remote errors.
    async fn update_session(
        &self,
        id: SessionId,
        patch: &WatchSessionPatch,
    ) -> Result<(), RemoteError>;

    /// Fetch all of a learner's sessions for the given video ids, most
    /// recently created first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the read fails.
    async fn sessions_for_videos(
        &self,
        learner_id: LearnerId,
        video_ids: &[VideoId],
    ) -> Result<Vec<WatchSession>, RemoteError>;
}

/// Repository contract for the public catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Active courses, dashboard order (`order_index` ascending).
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the read fails.
    async fn list_active_courses(&self) -> Result<Vec<Course>, RemoteError>;

    /// Active articles, most recently published first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the read fails.
    async fn list_published_articles(&self) -> Result<Vec<Article>, RemoteError>;
}

/// Repository contract for learner profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a learner's profile, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the read fails.
    async fn get_profile(
        &self,
        learner_id: LearnerId,
    ) -> Result<Option<LearnerProfile>, RemoteError>;

    /// Apply a partial update to a learner's profile.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` if no profile row exists.
    async fn update_profile(
        &self,
        learner_id: LearnerId,
        patch: &ProfilePatch,
    ) -> Result<(), RemoteError>;
}

/// Repository contract for per-course progress.
#[async_trait]
pub trait CourseProgressRepository: Send + Sync {
    /// A learner's course progress rows, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the read fails.
    async fn list_progress(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<CourseProgress>, RemoteError>;

    /// Insert-or-merge progress keyed on (learner, course).
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the write fails.
    async fn upsert_progress(&self, record: CourseProgressUpsert) -> Result<(), RemoteError>;
}

fn apply_patch(
    session: &WatchSession,
    patch: &WatchSessionPatch,
) -> Result<WatchSession, RemoteError> {
    WatchSession::from_persisted(
        session.id(),
        session.learner_id(),
        session.video_id().clone(),
        session.session_start(),
        patch.session_end,
        patch.watch_time_seconds,
        patch.last_position_seconds,
        patch.video_duration_seconds,
        patch.completion_percentage,
        patch.completed,
        session.created_at(),
    )
    .map_err(|e| RemoteError::Serialization(e.to_string()))
}

#[derive(Debug, Clone)]
struct StoredSession {
    seq: u64,
    session: WatchSession,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Rows keep an insertion sequence so "most recently created" stays
/// deterministic under a fixed clock.
#[derive(Clone)]
pub struct InMemoryRepository {
    clock: Clock,
    next_seq: Arc<Mutex<u64>>,
    sessions: Arc<Mutex<Vec<StoredSession>>>,
    courses: Arc<Mutex<Vec<Course>>>,
    articles: Arc<Mutex<Vec<Article>>>,
    profiles: Arc<Mutex<HashMap<LearnerId, LearnerProfile>>>,
    course_progress: Arc<Mutex<HashMap<(LearnerId, CourseId), CourseProgress>>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Clock::Default)
    }

    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            next_seq: Arc::new(Mutex::new(0)),
            sessions: Arc::new(Mutex::new(Vec::new())),
            courses: Arc::new(Mutex::new(Vec::new())),
            articles: Arc::new(Mutex::new(Vec::new())),
            profiles: Arc::new(Mutex::new(HashMap::new())),
            course_progress: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn bump_seq(&self) -> Result<u64, RemoteError> {
        let mut guard = self
            .next_seq
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        *guard += 1;
        Ok(*guard)
    }

    /// Seed a catalog course (test/prototyping helper; the admin back
    /// office owns real catalog writes).
    pub fn insert_course(&self, course: Course) -> Result<(), RemoteError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        guard.push(course);
        Ok(())
    }

    /// Seed a catalog article (test/prototyping helper).
    pub fn insert_article(&self, article: Article) -> Result<(), RemoteError> {
        let mut guard = self
            .articles
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        guard.push(article);
        Ok(())
    }

    /// Seed a learner profile (test/prototyping helper).
    pub fn insert_profile(&self, profile: LearnerProfile) -> Result<(), RemoteError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        guard.insert(profile.learner_id(), profile);
        Ok(())
    }

    /// Number of stored session rows, across all learners.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.lock().expect("lock poisoned").len()
    }
}

#[async_trait]
impl WatchSessionRepository for InMemoryRepository {
    async fn latest_open_session(
        &self,
        learner_id: LearnerId,
        video_id: &VideoId,
    ) -> Result<Option<WatchSession>, RemoteError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let latest = guard
            .iter()
            .filter(|stored| {
                stored.session.learner_id() == learner_id
                    && stored.session.video_id() == video_id
                    && stored.session.is_open()
            })
            .max_by_key(|stored| (stored.session.created_at(), stored.seq));
        Ok(latest.map(|stored| stored.session.clone()))
    }

    async fn insert_session(&self, new: NewWatchSession) -> Result<WatchSession, RemoteError> {
        let now = self.clock.now();
        let session = WatchSession::from_persisted(
            SessionId::new(Uuid::new_v4()),
            new.learner_id,
            new.video_id,
            now,
            None,
            0,
            0,
            None,
            0,
            false,
            now,
        )
        .map_err(|e| RemoteError::Serialization(e.to_string()))?;

        let seq = self.bump_seq()?;
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        guard.push(StoredSession {
            seq,
            session: session.clone(),
        });
        Ok(session)
    }

    async fn update_session(
        &self,
        id: SessionId,
        patch: &WatchSessionPatch,
    ) -> Result<(), RemoteError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let stored = guard
            .iter_mut()
            .find(|stored| stored.session.id() == id)
            .ok_or(RemoteError::NotFound)?;
        stored.session = apply_patch(&stored.session, patch)?;
        Ok(())
    }

    async fn sessions_for_videos(
        &self,
        learner_id: LearnerId,
        video_ids: &[VideoId],
    ) -> Result<Vec<WatchSession>, RemoteError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let guard = self
            .sessions
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let mut matching: Vec<&StoredSession> = guard
            .iter()
            .filter(|stored| {
                stored.session.learner_id() == learner_id
                    && video_ids.contains(stored.session.video_id())
            })
            .collect();
        matching.sort_by(|a, b| {
            (b.session.created_at(), b.seq).cmp(&(a.session.created_at(), a.seq))
        });
        Ok(matching
            .into_iter()
            .map(|stored| stored.session.clone())
            .collect())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn list_active_courses(&self) -> Result<Vec<Course>, RemoteError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let mut active: Vec<Course> = guard
            .iter()
            .filter(|course| course.is_active())
            .cloned()
            .collect();
        active.sort_by_key(Course::order_index);
        Ok(active)
    }

    async fn list_published_articles(&self) -> Result<Vec<Article>, RemoteError> {
        let guard = self
            .articles
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let mut active: Vec<Article> = guard
            .iter()
            .filter(|article| article.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
        Ok(active)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn get_profile(
        &self,
        learner_id: LearnerId,
    ) -> Result<Option<LearnerProfile>, RemoteError> {
        let guard = self
            .profiles
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        Ok(guard.get(&learner_id).cloned())
    }

    async fn update_profile(
        &self,
        learner_id: LearnerId,
        patch: &ProfilePatch,
    ) -> Result<(), RemoteError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let existing = guard.get(&learner_id).ok_or(RemoteError::NotFound)?;

        let display_name = match &patch.display_name {
            Some(value) => value.clone(),
            None => existing.display_name().map(str::to_owned),
        };
        let email_notifications = patch
            .email_notifications
            .unwrap_or_else(|| existing.email_notifications());

        let updated = LearnerProfile::from_persisted(
            existing.id(),
            learner_id,
            display_name,
            email_notifications,
            existing.created_at(),
            self.clock.now(),
        );
        guard.insert(learner_id, updated);
        Ok(())
    }
}

#[async_trait]
impl CourseProgressRepository for InMemoryRepository {
    async fn list_progress(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<CourseProgress>, RemoteError> {
        let guard = self
            .course_progress
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let mut rows: Vec<CourseProgress> = guard
            .values()
            .filter(|row| row.learner_id() == learner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(rows)
    }

    async fn upsert_progress(&self, record: CourseProgressUpsert) -> Result<(), RemoteError> {
        let mut guard = self
            .course_progress
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let key = (record.learner_id, record.course_id);
        let created_at = guard
            .get(&key)
            .map_or_else(|| self.clock.now(), CourseProgress::created_at);

        let row = CourseProgress::from_persisted(
            record.learner_id,
            record.course_id,
            record.progress_percentage,
            record.completed_at,
            created_at,
        )
        .map_err(|e| RemoteError::Serialization(e.to_string()))?;
        guard.insert(key, row);
        Ok(())
    }
}

/// Aggregates the repository surfaces behind trait objects so backends can
/// be swapped (in-memory for tests, PostgREST in production).
#[derive(Clone)]
pub struct Remote {
    pub sessions: Arc<dyn WatchSessionRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub course_progress: Arc<dyn CourseProgressRepository>,
}

impl Remote {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let sessions: Arc<dyn WatchSessionRepository> = Arc::new(repo.clone());
        let catalog: Arc<dyn CatalogRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo.clone());
        let course_progress: Arc<dyn CourseProgressRepository> = Arc::new(repo);
        Self {
            sessions,
            catalog,
            profiles,
            course_progress,
        }
    }
}
