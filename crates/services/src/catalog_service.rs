use std::sync::Arc;

use academy_core::model::{Article, Course, VideoId};
use remote::repository::CatalogRepository;

use crate::error::CatalogServiceError;

/// Read-only access to the public course/article catalog.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Active courses in dashboard order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Remote` if the read fails.
    pub async fn active_courses(&self) -> Result<Vec<Course>, CatalogServiceError> {
        let courses = self.catalog.list_active_courses().await?;
        Ok(courses)
    }

    /// Published articles, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Remote` if the read fails.
    pub async fn published_articles(&self) -> Result<Vec<Article>, CatalogServiceError> {
        let articles = self.catalog.list_published_articles().await?;
        Ok(articles)
    }

    /// Video ids of the active courses that carry a playable video, in
    /// dashboard order. This is the id set the progress aggregation runs
    /// over.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Remote` if the read fails.
    pub async fn course_video_ids(&self) -> Result<Vec<VideoId>, CatalogServiceError> {
        let courses = self.catalog.list_active_courses().await?;
        Ok(courses
            .iter()
            .filter_map(Course::video_id)
            .collect())
    }
}
