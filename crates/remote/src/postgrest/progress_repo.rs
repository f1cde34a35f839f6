use async_trait::async_trait;

use academy_core::model::{CourseProgress, LearnerId};

use super::PostgrestRepository;
use super::mapping::{CourseProgressRow, ProgressUpsertBody};
use crate::repository::{CourseProgressRepository, CourseProgressUpsert, RemoteError};

const TABLE: &str = "user_progress";

#[async_trait]
impl CourseProgressRepository for PostgrestRepository {
    async fn list_progress(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<CourseProgress>, RemoteError> {
        let request = self.get(TABLE).query(&[
            ("user_id", format!("eq.{learner_id}")),
            ("order", "created_at.desc".to_string()),
        ]);
        let rows: Vec<CourseProgressRow> = Self::fetch_rows(request).await?;
        rows.into_iter()
            .map(CourseProgressRow::into_progress)
            .collect()
    }

    async fn upsert_progress(&self, record: CourseProgressUpsert) -> Result<(), RemoteError> {
        let request = self
            .post(TABLE)
            .query(&[("on_conflict", "user_id,course_id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&ProgressUpsertBody::from_upsert(&record));
        Self::execute(request).await
    }
}
