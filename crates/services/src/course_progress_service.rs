use std::sync::Arc;

use academy_core::Clock;
use academy_core::model::{CourseId, CourseProgress};
use remote::repository::{CourseProgressRepository, CourseProgressUpsert};

use crate::auth::AuthContext;
use crate::error::CourseProgressServiceError;

/// Coarse per-course progress shown on the learner dashboard.
///
/// One row per (learner, course), written via upsert; the completion
/// timestamp is stamped when progress first reaches 100%.
#[derive(Clone)]
pub struct CourseProgressService {
    auth: AuthContext,
    clock: Clock,
    progress: Arc<dyn CourseProgressRepository>,
}

impl CourseProgressService {
    #[must_use]
    pub fn new(
        auth: AuthContext,
        clock: Clock,
        progress: Arc<dyn CourseProgressRepository>,
    ) -> Self {
        Self {
            auth,
            clock,
            progress,
        }
    }

    /// The learner's progress rows, most recent first. Empty when no
    /// learner is signed in.
    ///
    /// # Errors
    ///
    /// Returns `CourseProgressServiceError::Remote` if the read fails.
    pub async fn list(&self) -> Result<Vec<CourseProgress>, CourseProgressServiceError> {
        let Some(learner) = self.auth.learner() else {
            return Ok(Vec::new());
        };
        let rows = self.progress.list_progress(learner).await?;
        Ok(rows)
    }

    /// Record the learner's progress for a course.
    ///
    /// # Errors
    ///
    /// Returns `CourseProgressServiceError::NotAuthenticated` without a
    /// signed-in learner, `CourseProgressServiceError::InvalidPercentage`
    /// for values above 100, or `CourseProgressServiceError::Remote` if the
    /// write fails.
    pub async fn record(
        &self,
        course_id: CourseId,
        progress_percentage: u8,
    ) -> Result<(), CourseProgressServiceError> {
        let Some(learner) = self.auth.learner() else {
            return Err(CourseProgressServiceError::NotAuthenticated);
        };
        if progress_percentage > 100 {
            return Err(CourseProgressServiceError::InvalidPercentage(
                progress_percentage,
            ));
        }

        let completed_at = (progress_percentage >= 100).then(|| self.clock.now());
        self.progress
            .upsert_progress(CourseProgressUpsert {
                learner_id: learner,
                course_id,
                progress_percentage,
                completed_at,
            })
            .await?;
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

    fn build_service(auth: AuthContext) -> (CourseProgressService, InMemoryRepository) {
        let repo = InMemoryRepository::with_clock(fixed_clock());
        let service = CourseProgressService::new(auth, fixed_clock(), Arc::new(repo.clone()));
        (service, repo)
    }

    #[tokio::test]
    async fn anonymous_list_is_empty_and_record_fails() {
        let (service, _repo) = build_service(AuthContext::anonymous());
        assert!(service.list().await.unwrap().is_empty());

        let err = service
            .record(CourseId::new(Uuid::new_v4()), 50)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseProgressServiceError::NotAuthenticated));
    }

    #[tokio::test]
    async fn completion_timestamp_is_set_at_100_percent() {
        let learner = LearnerId::new(Uuid::new_v4());
        let (service, _repo) = build_service(AuthContext::for_learner(learner));
        let course = CourseId::new(Uuid::new_v4());

        service.record(course, 40).await.unwrap();
        let rows = service.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].progress_percentage(), 40);
        assert_eq!(rows[0].completed_at(), None);

        service.record(course, 100).await.unwrap();
        let rows = service.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].completed_at(), Some(fixed_now()));
        assert!(rows[0].is_complete());
    }

    #[tokio::test]
    async fn out_of_range_percentage_is_rejected() {
        let learner = LearnerId::new(Uuid::new_v4());
        let (service, _repo) = build_service(AuthContext::for_learner(learner));

        let err = service
            .record(CourseId::new(Uuid::new_v4()), 101)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourseProgressServiceError::InvalidPercentage(101)
        ));
    }
}
