mod observer;
mod provider;
mod service;

// Public API of the tracking subsystem.
pub use observer::{NullObserver, ProgressUpdate, TrackerObserver};
pub use provider::{PlayerEvent, VideoProvider};
pub use service::WatchTracker;
