use std::sync::Arc;

use academy_core::model::{LearnerProfile, ProfilePatch};
use remote::repository::ProfileRepository;

use crate::auth::AuthContext;
use crate::error::ProfileServiceError;

/// Reads and updates the signed-in learner's profile.
#[derive(Clone)]
pub struct ProfileService {
    auth: AuthContext,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(auth: AuthContext, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { auth, profiles }
    }

    /// Fetch the learner's profile.
    ///
    /// Returns `Ok(None)` when no learner is signed in or no profile row
    /// exists yet.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Remote` if the read fails.
    pub async fn profile(&self) -> Result<Option<LearnerProfile>, ProfileServiceError> {
        let Some(learner) = self.auth.learner() else {
            return Ok(None);
        };
        let profile = self.profiles.get_profile(learner).await?;
        Ok(profile)
    }

    /// Apply a partial update to the learner's profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::NotAuthenticated` when no learner is
    /// signed in, or `ProfileServiceError::Remote` if the write fails.
    pub async fn update(&self, patch: ProfilePatch) -> Result<(), ProfileServiceError> {
        let Some(learner) = self.auth.learner() else {
            return Err(ProfileServiceError::NotAuthenticated);
        };
        if patch.is_empty() {
            return Ok(());
        }
        self.profiles.update_profile(learner, &patch).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::model::LearnerId;
    use academy_core::time::{fixed_clock, fixed_now};
    use remote::repository::InMemoryRepository;
    use uuid::Uuid;

    fn seed_profile(repo: &InMemoryRepository, learner: LearnerId) {
        repo.insert_profile(LearnerProfile::from_persisted(
            Uuid::new_v4(),
            learner,
            Some("Ana".to_string()),
            true,
            fixed_now(),
            fixed_now(),
        ))
        .unwrap();
    }

    #[tokio::test]
    async fn anonymous_profile_reads_nothing() {
        let repo = InMemoryRepository::with_clock(fixed_clock());
        let service = ProfileService::new(AuthContext::anonymous(), Arc::new(repo));
        assert!(service.profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn anonymous_update_is_rejected() {
        let repo = InMemoryRepository::with_clock(fixed_clock());
        let service = ProfileService::new(AuthContext::anonymous(), Arc::new(repo));
        let err = service
            .update(ProfilePatch {
                display_name: Some(Some("Ana".to_string())),
                email_notifications: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileServiceError::NotAuthenticated));
    }

    #[tokio::test]
    async fn update_changes_only_patched_fields() {
        let repo = InMemoryRepository::with_clock(fixed_clock());
        let learner = LearnerId::new(Uuid::new_v4());
        seed_profile(&repo, learner);

        let service =
            ProfileService::new(AuthContext::for_learner(learner), Arc::new(repo));
        service
            .update(ProfilePatch {
                display_name: None,
                email_notifications: Some(false),
            })
            .await
            .unwrap();

        let profile = service.profile().await.unwrap().unwrap();
        assert_eq!(profile.display_name(), Some("Ana"));
        assert!(!profile.email_notifications());
    }
}
