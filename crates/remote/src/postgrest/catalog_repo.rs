use async_trait::async_trait;

use academy_core::model::{Article, Course};

use super::PostgrestRepository;
use super::mapping::{ArticleRow, CourseRow};
use crate::repository::{CatalogRepository, RemoteError};

#[async_trait]
impl CatalogRepository for PostgrestRepository {
    async fn list_active_courses(&self) -> Result<Vec<Course>, RemoteError> {
        let request = self.get("courses").query(&[
            ("is_active", "eq.true"),
            ("order", "order_index.asc"),
        ]);
        let rows: Vec<CourseRow> = Self::fetch_rows(request).await?;
        rows.into_iter().map(CourseRow::into_course).collect()
    }

    async fn list_published_articles(&self) -> Result<Vec<Article>, RemoteError> {
        let request = self.get("articles").query(&[
            ("is_active", "eq.true"),
            ("order", "published_at.desc"),
        ]);
        let rows: Vec<ArticleRow> = Self::fetch_rows(request).await?;
        rows.into_iter().map(ArticleRow::into_article).collect()
    }
}
