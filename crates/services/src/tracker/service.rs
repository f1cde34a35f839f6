use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use academy_core::Clock;
use academy_core::model::{LearnerId, SessionId, VideoId};
use academy_core::tracker::{
    Checkpoint, Effect, PlaybackSample, ResumedSession, TrackerInput, TrackerMachine,
    TrackerPolicy, TrackerState,
};
use remote::repository::{NewWatchSession, WatchSessionPatch, WatchSessionRepository};

use super::observer::{ProgressUpdate, TrackerObserver};
use super::provider::{PlayerEvent, VideoProvider};
use crate::auth::AuthContext;

/// Delay before the resume seek, giving the widget time to settle.
const RESUME_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Ticker period while tracking.
const TICK_PERIOD: Duration = Duration::from_secs(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Aborts the ticker task when released, so no timer outlives the state
/// that acquired it (including abnormal unmounts).
struct TickerGuard {
    handle: JoinHandle<()>,
}

impl Drop for TickerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct TrackerInner {
    /// Handle to ourselves for the ticker task; set once at construction.
    self_weak: Weak<TrackerInner>,
    learner: Option<LearnerId>,
    video_id: VideoId,
    clock: Clock,
    sessions: Arc<dyn WatchSessionRepository>,
    provider: Arc<dyn VideoProvider>,
    observer: Arc<dyn TrackerObserver>,
    machine: Mutex<TrackerMachine>,
    session_id: Mutex<Option<SessionId>>,
    ticker: Mutex<Option<TickerGuard>>,
}

impl TrackerInner {
    /// Feed one input through the machine and carry out the effects.
    ///
    /// Effects run in issue order. Resolution is the only inline await;
    /// checkpoint writes are spawned fire-and-forget so a slow or failing
    /// backend never stalls the playback event path.
    async fn apply(&self, input: TrackerInput) {
        let mut queue: VecDeque<Effect> = lock(&self.machine).apply(input).into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::ResolveSession => {
                    let outcome = self.resolve().await;
                    queue.extend(lock(&self.machine).apply(outcome));
                }
                Effect::Seek { position_seconds } => self.schedule_seek(position_seconds),
                Effect::StartTicker => self.start_ticker(),
                Effect::StopTicker => self.stop_ticker(),
                Effect::SaveCheckpoint(cp) => self.spawn_checkpoint(cp),
                Effect::NotifyComplete => self.observer.on_complete(),
            }
        }
    }

    /// Resume the latest open session or create a fresh one.
    async fn resolve(&self) -> TrackerInput {
        let Some(learner) = self.learner else {
            return TrackerInput::ResolutionFailed;
        };

        match self.sessions.latest_open_session(learner, &self.video_id).await {
            Ok(Some(session)) => {
                *lock(&self.session_id) = Some(session.id());
                TrackerInput::SessionResolved(Some(ResumedSession {
                    watch_time_seconds: session.watch_time_seconds(),
                    last_position_seconds: session.last_position_seconds(),
                }))
            }
            Ok(None) => {
                let new = NewWatchSession {
                    learner_id: learner,
                    video_id: self.video_id.clone(),
                };
                match self.sessions.insert_session(new).await {
                    Ok(session) => {
                        *lock(&self.session_id) = Some(session.id());
                        TrackerInput::SessionResolved(None)
                    }
                    Err(err) => {
                        tracing::warn!(video = %self.video_id, error = %err, "failed to create watch session");
                        TrackerInput::ResolutionFailed
                    }
                }
            }
            Err(err) => {
                tracing::warn!(video = %self.video_id, error = %err, "failed to resolve watch session");
                TrackerInput::ResolutionFailed
            }
        }
    }

    fn schedule_seek(&self, position_seconds: u32) {
        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            tokio::time::sleep(RESUME_SETTLE_DELAY).await;
            provider.seek(position_seconds);
        });
    }

    fn start_ticker(&self) {
        let mut guard = lock(&self.ticker);
        if guard.is_some() {
            return;
        }

        // The task holds a weak handle: dropping the tracker tears the
        // ticker down even if the abort races a tick in flight.
        let weak = self.self_weak.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            loop {
                ticks.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let Some(sample) = inner.provider.sample() else {
                    continue;
                };
                inner.apply(TrackerInput::Tick(sample)).await;
            }
        });
        *guard = Some(TickerGuard { handle });
    }

    fn stop_ticker(&self) {
        lock(&self.ticker).take();
    }

    /// Best-effort checkpoint write.
    ///
    /// Skipped while the session is unresolved; failures are logged and
    /// never reach the caller.
    fn spawn_checkpoint(&self, cp: Checkpoint) {
        let Some(session_id) = *lock(&self.session_id) else {
            tracing::debug!(video = %self.video_id, "checkpoint before session resolution, skipping write");
            return;
        };

        let patch = WatchSessionPatch {
            last_position_seconds: cp.position_seconds,
            watch_time_seconds: cp.watch_time_seconds,
            completion_percentage: cp.completion_percentage,
            completed: cp.completed,
            session_end: if cp.completed {
                Some(self.clock.now())
            } else {
                None
            },
            video_duration_seconds: cp.duration_seconds,
        };

        let sessions = Arc::clone(&self.sessions);
        let observer = Arc::clone(&self.observer);
        tokio::spawn(async move {
            match sessions.update_session(session_id, &patch).await {
                Ok(()) => observer.on_progress(ProgressUpdate {
                    completion_percentage: cp.completion_percentage,
                    watch_time_seconds: cp.watch_time_seconds,
                    position_seconds: cp.position_seconds,
                }),
                Err(err) => {
                    tracing::warn!(session = %session_id, error = %err, "failed to save video progress");
                }
            }
        });
    }
}

/// Tracks one mounted player against the Remote Data Service.
///
/// Session identity is resolved once per mount and reused for every write;
/// dropping the tracker stops the ticker and leaves any in-flight
/// checkpoint to finish (or fail) on its own.
pub struct WatchTracker {
    inner: Arc<TrackerInner>,
}

impl WatchTracker {
    #[must_use]
    pub fn new(
        auth: AuthContext,
        video_id: VideoId,
        policy: TrackerPolicy,
        clock: Clock,
        sessions: Arc<dyn WatchSessionRepository>,
        provider: Arc<dyn VideoProvider>,
        observer: Arc<dyn TrackerObserver>,
    ) -> Self {
        Self {
            inner: Arc::new_cyclic(|weak| TrackerInner {
                self_weak: weak.clone(),
                learner: auth.learner(),
                video_id,
                clock,
                sessions,
                provider,
                observer,
                machine: Mutex::new(TrackerMachine::new(policy)),
                session_id: Mutex::new(None),
                ticker: Mutex::new(None),
            }),
        }
    }

    /// Feed a provider event into the tracker.
    ///
    /// Without a signed-in learner this is a no-op: the view layer shows a
    /// login prompt instead of media, and the tracker performs no remote
    /// reads or writes.
    pub async fn handle(&self, event: PlayerEvent) {
        if self.inner.learner.is_none() {
            return;
        }

        match event {
            PlayerEvent::Ready => self.inner.apply(TrackerInput::ProviderReady).await,
            PlayerEvent::Playing => self.inner.apply(TrackerInput::Playing).await,
            PlayerEvent::Paused => {
                let sample = self.sample();
                self.inner.apply(TrackerInput::Paused(sample)).await;
            }
            PlayerEvent::Ended => {
                let sample = self.sample();
                self.inner.apply(TrackerInput::Ended(sample)).await;
            }
        }
    }

    fn sample(&self) -> PlaybackSample {
        self.inner.provider.sample().unwrap_or(PlaybackSample {
            position_seconds: 0.0,
            duration_seconds: 0.0,
        })
    }

    #[must_use]
    pub fn state(&self) -> TrackerState {
        lock(&self.inner.machine).state()
    }

    /// Locally accumulated watch time for this mount.
    #[must_use]
    pub fn watch_time_seconds(&self) -> u32 {
        lock(&self.inner.machine).watch_time_seconds()
    }

    /// The resolved session id, once resolution has succeeded.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        *lock(&self.inner.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::observer::NullObserver;
    use academy_core::time::fixed_clock;
    use remote::repository::InMemoryRepository;
    use uuid::Uuid;

    struct SilentProvider;

    impl VideoProvider for SilentProvider {
        fn sample(&self) -> Option<PlaybackSample> {
            None
        }

        fn seek(&self, _position_seconds: u32) {}
    }

    fn build_tracker(auth: AuthContext, repo: &InMemoryRepository) -> WatchTracker {
        WatchTracker::new(
            auth,
            VideoId::new("abc").unwrap(),
            TrackerPolicy::default(),
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(SilentProvider),
            Arc::new(NullObserver),
        )
    }

    #[tokio::test]
    async fn anonymous_tracker_is_inert() {
        let repo = InMemoryRepository::with_clock(fixed_clock());
        let tracker = build_tracker(AuthContext::anonymous(), &repo);

        tracker.handle(PlayerEvent::Ready).await;
        tracker.handle(PlayerEvent::Playing).await;

        assert_eq!(tracker.state(), TrackerState::Uninitialized);
        assert_eq!(tracker.session_id(), None);
        assert_eq!(repo.session_count(), 0);
    }

    #[tokio::test]
    async fn ready_creates_a_session_when_none_is_open() {
        let repo = InMemoryRepository::with_clock(fixed_clock());
        let auth = AuthContext::for_learner(LearnerId::new(Uuid::new_v4()));
        let tracker = build_tracker(auth, &repo);

        tracker.handle(PlayerEvent::Ready).await;

        assert_eq!(tracker.state(), TrackerState::Ready);
        assert!(tracker.session_id().is_some());
        assert_eq!(repo.session_count(), 1);
    }
}
