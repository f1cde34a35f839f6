use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use academy_core::model::{
    Article, ArticleId, Course, CourseId, CourseProgress, LearnerId, LearnerProfile, ProfilePatch,
    SessionId, VideoId, WatchSession,
};

use crate::repository::{CourseProgressUpsert, NewWatchSession, RemoteError, WatchSessionPatch};

fn ser<E: core::fmt::Display>(e: E) -> RemoteError {
    RemoteError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, RemoteError> {
    u32::try_from(v).map_err(|_| RemoteError::Serialization(format!("invalid {field}: {v}")))
}

fn u8_from_i64(field: &'static str, v: i64) -> Result<u8, RemoteError> {
    u8::try_from(v).map_err(|_| RemoteError::Serialization(format!("invalid {field}: {v}")))
}

fn video_id(raw: String) -> Result<VideoId, RemoteError> {
    VideoId::new(raw).ok_or_else(|| RemoteError::Serialization("empty video_id".into()))
}

//
// ─── WATCH SESSIONS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct WatchSessionRow {
    id: Uuid,
    user_id: Uuid,
    video_id: String,
    session_start: DateTime<Utc>,
    session_end: Option<DateTime<Utc>>,
    watch_time_seconds: i64,
    last_position_seconds: i64,
    video_duration_seconds: Option<i64>,
    completion_percentage: i64,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl WatchSessionRow {
    pub(crate) fn into_session(self) -> Result<WatchSession, RemoteError> {
        let duration = self
            .video_duration_seconds
            .map(|v| u32_from_i64("video_duration_seconds", v))
            .transpose()?;

        WatchSession::from_persisted(
            SessionId::new(self.id),
            LearnerId::new(self.user_id),
            video_id(self.video_id)?,
            self.session_start,
            self.session_end,
            u32_from_i64("watch_time_seconds", self.watch_time_seconds)?,
            u32_from_i64("last_position_seconds", self.last_position_seconds)?,
            duration,
            u8_from_i64("completion_percentage", self.completion_percentage)?,
            self.completed,
            self.created_at,
        )
        .map_err(ser)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewSessionBody {
    user_id: Uuid,
    video_id: String,
    watch_time_seconds: u32,
    last_position_seconds: u32,
}

impl NewSessionBody {
    pub(crate) fn from_new(new: &NewWatchSession) -> Self {
        Self {
            user_id: new.learner_id.value(),
            video_id: new.video_id.as_str().to_owned(),
            watch_time_seconds: 0,
            last_position_seconds: 0,
        }
    }
}

/// Checkpoint body. `session_end` and the duration serialize even when
/// null: a non-completing write clears any stale end timestamp.
#[derive(Debug, Serialize)]
pub(crate) struct SessionPatchBody {
    last_position_seconds: u32,
    watch_time_seconds: u32,
    completion_percentage: u8,
    completed: bool,
    session_end: Option<DateTime<Utc>>,
    video_duration_seconds: Option<u32>,
}

impl SessionPatchBody {
    pub(crate) fn from_patch(patch: &WatchSessionPatch) -> Self {
        Self {
            last_position_seconds: patch.last_position_seconds,
            watch_time_seconds: patch.watch_time_seconds,
            completion_percentage: patch.completion_percentage,
            completed: patch.completed,
            session_end: patch.session_end,
            video_duration_seconds: patch.video_duration_seconds,
        }
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct CourseRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    youtube_url: Option<String>,
    thumbnail_url: Option<String>,
    duration_minutes: Option<i64>,
    order_index: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CourseRow {
    pub(crate) fn into_course(self) -> Result<Course, RemoteError> {
        let duration = self
            .duration_minutes
            .map(|v| u32_from_i64("duration_minutes", v))
            .transpose()?;

        Course::from_persisted(
            CourseId::new(self.id),
            self.title,
            self.description,
            self.youtube_url,
            self.thumbnail_url,
            duration,
            u32_from_i64("order_index", self.order_index)?,
            self.is_active,
            self.created_at,
            self.updated_at,
        )
        .map_err(ser)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArticleRow {
    id: Uuid,
    title: String,
    excerpt: Option<String>,
    content: Option<String>,
    slug: Option<String>,
    author: Option<String>,
    featured_image_url: Option<String>,
    external_url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ArticleRow {
    pub(crate) fn into_article(self) -> Result<Article, RemoteError> {
        Article::from_persisted(
            ArticleId::new(self.id),
            self.title,
            self.excerpt,
            self.content,
            self.slug,
            self.author,
            self.featured_image_url,
            self.external_url,
            self.published_at,
            self.is_active,
            self.created_at,
            self.updated_at,
        )
        .map_err(ser)
    }
}

//
// ─── PROFILES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    display_name: Option<String>,
    email_notifications: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    pub(crate) fn into_profile(self) -> LearnerProfile {
        LearnerProfile::from_persisted(
            self.id,
            LearnerId::new(self.user_id),
            self.display_name,
            self.email_notifications,
            self.created_at,
            self.updated_at,
        )
    }
}

/// Partial profile update; only fields present in the patch are written.
pub(crate) fn profile_patch_body(patch: &ProfilePatch) -> Value {
    let mut body = Map::new();
    if let Some(display_name) = &patch.display_name {
        body.insert(
            "display_name".into(),
            display_name
                .as_ref()
                .map_or(Value::Null, |name| Value::String(name.clone())),
        );
    }
    if let Some(email_notifications) = patch.email_notifications {
        body.insert("email_notifications".into(), Value::Bool(email_notifications));
    }
    Value::Object(body)
}

//
// ─── COURSE PROGRESS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct CourseProgressRow {
    user_id: Uuid,
    course_id: Uuid,
    progress_percentage: i64,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl CourseProgressRow {
    pub(crate) fn into_progress(self) -> Result<CourseProgress, RemoteError> {
        CourseProgress::from_persisted(
            LearnerId::new(self.user_id),
            CourseId::new(self.course_id),
            u8_from_i64("progress_percentage", self.progress_percentage)?,
            self.completed_at,
            self.created_at,
        )
        .map_err(ser)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressUpsertBody {
    user_id: Uuid,
    course_id: Uuid,
    progress_percentage: u8,
    completed_at: Option<DateTime<Utc>>,
}

impl ProgressUpsertBody {
    pub(crate) fn from_upsert(record: &CourseProgressUpsert) -> Self {
        Self {
            user_id: record.learner_id.value(),
            course_id: record.course_id.value(),
            progress_percentage: record.progress_percentage,
            completed_at: record.completed_at,
        }
    }
}
