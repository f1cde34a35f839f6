use thiserror::Error;

use crate::model::{ArticleError, CourseError, CourseProgressError, WatchSessionError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    WatchSession(#[from] WatchSessionError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Article(#[from] ArticleError),
    #[error(transparent)]
    CourseProgress(#[from] CourseProgressError),
}
