use async_trait::async_trait;

use academy_core::model::{LearnerId, LearnerProfile, ProfilePatch};

use super::PostgrestRepository;
use super::mapping::{ProfileRow, profile_patch_body};
use crate::repository::{ProfileRepository, RemoteError};

const TABLE: &str = "profiles";

#[async_trait]
impl ProfileRepository for PostgrestRepository {
    async fn get_profile(
        &self,
        learner_id: LearnerId,
    ) -> Result<Option<LearnerProfile>, RemoteError> {
        let request = self.get(TABLE).query(&[
            ("user_id", format!("eq.{learner_id}")),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<ProfileRow> = Self::fetch_rows(request).await?;
        Ok(rows.into_iter().next().map(ProfileRow::into_profile))
    }

    async fn update_profile(
        &self,
        learner_id: LearnerId,
        patch: &ProfilePatch,
    ) -> Result<(), RemoteError> {
        if patch.is_empty() {
            return Ok(());
        }

        let request = self
            .patch(TABLE)
            .query(&[("user_id", format!("eq.{learner_id}"))])
            .json(&profile_patch_body(patch));
        Self::execute(request).await
    }
}
