#![forbid(unsafe_code)]

pub mod auth;
pub mod catalog_service;
pub mod course_progress_service;
pub mod error;
pub mod profile_service;
pub mod progress_service;
pub mod tracker;

pub use academy_core::Clock;

pub use auth::AuthContext;
pub use catalog_service::CatalogService;
pub use course_progress_service::CourseProgressService;
pub use error::{
    CatalogServiceError, CourseProgressServiceError, ProfileServiceError, ProgressServiceError,
};
pub use profile_service::ProfileService;
pub use progress_service::ProgressService;
pub use tracker::{
    NullObserver, PlayerEvent, ProgressUpdate, TrackerObserver, VideoProvider, WatchTracker,
};
