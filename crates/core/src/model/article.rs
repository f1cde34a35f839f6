use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ArticleId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArticleError {
    #[error("article title must not be empty")]
    EmptyTitle,
}

/// A published article shown on the learner dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    id: ArticleId,
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

impl Article {
    /// Rehydrate an article from a persisted row.
    ///
    /// # Errors
    ///
    /// Returns `ArticleError::EmptyTitle` if the title is blank.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: ArticleId,
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
    ) -> Result<Self, ArticleError> {
        if title.trim().is_empty() {
            return Err(ArticleError::EmptyTitle);
        }

        Ok(Self {
            id,
            title,
            excerpt,
            content,
            slug,
            author,
            featured_image_url,
            external_url,
            published_at,
            is_active,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ArticleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn excerpt(&self) -> Option<&str> {
        self.excerpt.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    #[must_use]
    pub fn featured_image_url(&self) -> Option<&str> {
        self.featured_image_url.as_deref()
    }

    #[must_use]
    pub fn external_url(&self) -> Option<&str> {
        self.external_url.as_deref()
    }

    #[must_use]
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use uuid::Uuid;

    #[test]
    fn empty_title_is_rejected() {
        let now = fixed_now();
        let err = Article::from_persisted(
            ArticleId::new(Uuid::new_v4()),
            String::new(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            true,
            now,
            now,
        )
        .unwrap_err();
        assert_eq!(err, ArticleError::EmptyTitle);
    }
}
