#![forbid(unsafe_code)]

pub mod postgrest;
pub mod repository;

pub use postgrest::{PostgrestInitError, PostgrestRepository, RemoteConfig};
pub use repository::{
    CatalogRepository, CourseProgressRepository, CourseProgressUpsert, InMemoryRepository,
    NewWatchSession, ProfileRepository, Remote, RemoteError, WatchSessionPatch,
    WatchSessionRepository,
};
