mod article;
mod course;
mod course_progress;
mod ids;
mod profile;
mod watch_session;

pub use ids::{ArticleId, CourseId, LearnerId, ParseIdError, SessionId, VideoId};

pub use article::{Article, ArticleError};
pub use course::{Course, CourseError};
pub use course_progress::{CourseProgress, CourseProgressError};
pub use profile::{LearnerProfile, ProfilePatch};
pub use watch_session::{WatchSession, WatchSessionError};
