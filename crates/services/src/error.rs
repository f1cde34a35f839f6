//! Shared error types for the services crate.

use thiserror::Error;

use remote::repository::RemoteError;

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error("no learner is signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `CourseProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseProgressServiceError {
    #[error("no learner is signed in")]
    NotAuthenticated,
    #[error("progress percentage out of range: {0}")]
    InvalidPercentage(u8),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
