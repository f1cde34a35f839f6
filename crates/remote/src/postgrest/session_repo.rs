use async_trait::async_trait;

use academy_core::model::{LearnerId, SessionId, VideoId, WatchSession};

use super::PostgrestRepository;
use super::mapping::{NewSessionBody, SessionPatchBody, WatchSessionRow};
use crate::repository::{NewWatchSession, RemoteError, WatchSessionPatch, WatchSessionRepository};

const TABLE: &str = "video_sessions";

/// PostgREST `in.(…)` filter over a set of video ids.
fn video_in_filter(video_ids: &[VideoId]) -> String {
    let quoted: Vec<String> = video_ids
        .iter()
        .map(|id| format!("\"{}\"", id.as_str()))
        .collect();
    format!("in.({})", quoted.join(","))
}

#[async_trait]
impl WatchSessionRepository for PostgrestRepository {
    async fn latest_open_session(
        &self,
        learner_id: LearnerId,
        video_id: &VideoId,
    ) -> Result<Option<WatchSession>, RemoteError> {
        let request = self.get(TABLE).query(&[
            ("user_id", format!("eq.{learner_id}")),
            ("video_id", format!("eq.{}", video_id.as_str())),
            ("completed", "eq.false".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<WatchSessionRow> = Self::fetch_rows(request).await?;
        rows.into_iter()
            .next()
            .map(WatchSessionRow::into_session)
            .transpose()
    }

    async fn insert_session(&self, new: NewWatchSession) -> Result<WatchSession, RemoteError> {
        let request = self
            .post(TABLE)
            .header("Prefer", "return=representation")
            .json(&NewSessionBody::from_new(&new));
        let rows: Vec<WatchSessionRow> = Self::fetch_rows(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::Serialization("empty insert response".into()))?
            .into_session()
    }

    async fn update_session(
        &self,
        id: SessionId,
        patch: &WatchSessionPatch,
    ) -> Result<(), RemoteError> {
        let request = self
            .patch(TABLE)
            .query(&[("id", format!("eq.{id}"))])
            .json(&SessionPatchBody::from_patch(patch));
        Self::execute(request).await
    }

    async fn sessions_for_videos(
        &self,
        learner_id: LearnerId,
        video_ids: &[VideoId],
    ) -> Result<Vec<WatchSession>, RemoteError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.get(TABLE).query(&[
            ("user_id", format!("eq.{learner_id}")),
            ("video_id", video_in_filter(video_ids)),
            ("order", "created_at.desc".to_string()),
        ]);
        let rows: Vec<WatchSessionRow> = Self::fetch_rows(request).await?;
        rows.into_iter()
            .map(WatchSessionRow::into_session)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_filter_quotes_each_id() {
        let ids = vec![
            VideoId::new("abc").unwrap(),
            VideoId::new("def").unwrap(),
        ];
        assert_eq!(video_in_filter(&ids), "in.(\"abc\",\"def\")");
    }
}
