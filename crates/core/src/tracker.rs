//! Watch-session tracking state machine.
//!
//! The machine is pure: playback events and ticker samples go in, effects
//! come out. All I/O (session resolution, checkpoint writes, seeking,
//! ticker management) is carried out by the services layer interpreting the
//! returned [`Effect`]s, which keeps the transition table testable without
//! a real video widget.

use crate::progress::completion_percentage;

/// Checkpoint when the reported position has advanced this many seconds.
pub const DEFAULT_CHECKPOINT_INTERVAL_SECONDS: u32 = 10;

/// A video counts as completed once this share of it has been watched.
pub const DEFAULT_COMPLETION_THRESHOLD_PERCENT: u8 = 80;

/// Saved positions at or below this floor are not worth resuming.
pub const DEFAULT_RESUME_FLOOR_SECONDS: u32 = 10;

/// Tunable thresholds for checkpointing, completion and resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerPolicy {
    pub checkpoint_interval_seconds: u32,
    pub completion_threshold_percent: u8,
    pub resume_floor_seconds: u32,
    pub auto_resume: bool,
}

impl Default for TrackerPolicy {
    fn default() -> Self {
        Self {
            checkpoint_interval_seconds: DEFAULT_CHECKPOINT_INTERVAL_SECONDS,
            completion_threshold_percent: DEFAULT_COMPLETION_THRESHOLD_PERCENT,
            resume_floor_seconds: DEFAULT_RESUME_FLOOR_SECONDS,
            auto_resume: true,
        }
    }
}

/// A playback position/duration pair reported by the embedded provider.
///
/// Durations of zero (or non-finite values) mean "not reported yet".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSample {
    pub position_seconds: f64,
    pub duration_seconds: f64,
}

/// The open session adopted during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumedSession {
    pub watch_time_seconds: u32,
    pub last_position_seconds: u32,
}

/// Inputs to the transition function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerInput {
    /// The embedded provider finished initializing.
    ProviderReady,
    /// Session resolution finished; `Some` when an open session was adopted,
    /// `None` when a fresh one was created.
    SessionResolved(Option<ResumedSession>),
    /// Session resolution failed; the mount stays unresolved.
    ResolutionFailed,
    /// The provider reported a playing state.
    Playing,
    /// The provider reported a paused state.
    Paused(PlaybackSample),
    /// The provider reached the natural end of the video.
    Ended(PlaybackSample),
    /// One-second ticker fired while tracking.
    Tick(PlaybackSample),
}

/// Lifecycle of one mounted player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Uninitialized,
    Resolving,
    Ready,
    Tracking,
    Paused,
    Finalized,
}

/// Payload of a checkpoint write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub position_seconds: u32,
    pub watch_time_seconds: u32,
    pub duration_seconds: Option<u32>,
    pub completion_percentage: u8,
    pub completed: bool,
}

/// Side effects requested by a transition, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Read the latest open session or create a fresh one.
    ResolveSession,
    /// Command the provider to seek to a saved position.
    Seek { position_seconds: u32 },
    /// Acquire the one-second ticker.
    StartTicker,
    /// Release the ticker.
    StopTicker,
    /// Persist the given checkpoint, best-effort.
    SaveCheckpoint(Checkpoint),
    /// Tell the caller the video is complete. Emitted at most once.
    NotifyComplete,
}

/// Pure state machine for one player mount.
#[derive(Debug, Clone)]
pub struct TrackerMachine {
    policy: TrackerPolicy,
    state: TrackerState,
    watch_time_seconds: u32,
    last_saved_position: f64,
    complete_signaled: bool,
}

impl TrackerMachine {
    #[must_use]
    pub fn new(policy: TrackerPolicy) -> Self {
        Self {
            policy,
            state: TrackerState::Uninitialized,
            watch_time_seconds: 0,
            last_saved_position: 0.0,
            complete_signaled: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.state
    }

    #[must_use]
    pub fn policy(&self) -> TrackerPolicy {
        self.policy
    }

    /// Locally accumulated watch time, in seconds.
    #[must_use]
    pub fn watch_time_seconds(&self) -> u32 {
        self.watch_time_seconds
    }

    /// Feed one input through the transition table.
    ///
    /// `Finalized` is terminal: once reached, every input is absorbed with
    /// no effects, which is what makes completion one-way for the mount.
    pub fn apply(&mut self, input: TrackerInput) -> Vec<Effect> {
        if self.state == TrackerState::Finalized {
            return Vec::new();
        }

        match input {
            TrackerInput::ProviderReady => self.on_provider_ready(),
            TrackerInput::SessionResolved(resumed) => self.on_session_resolved(resumed),
            TrackerInput::ResolutionFailed => self.on_resolution_failed(),
            TrackerInput::Playing => self.on_playing(),
            TrackerInput::Paused(sample) => self.on_paused(sample),
            TrackerInput::Ended(sample) => self.on_ended(sample),
            TrackerInput::Tick(sample) => self.on_tick(sample),
        }
    }

    fn on_provider_ready(&mut self) -> Vec<Effect> {
        // Session identity is resolved once per mount; a second ready event
        // must not trigger a second resolution.
        if self.state != TrackerState::Uninitialized {
            return Vec::new();
        }
        self.state = TrackerState::Resolving;
        vec![Effect::ResolveSession]
    }

    fn on_session_resolved(&mut self, resumed: Option<ResumedSession>) -> Vec<Effect> {
        if self.state == TrackerState::Resolving {
            self.state = TrackerState::Ready;
        }

        let Some(resumed) = resumed else {
            return Vec::new();
        };

        self.watch_time_seconds = resumed.watch_time_seconds;
        if self.policy.auto_resume
            && resumed.last_position_seconds > self.policy.resume_floor_seconds
        {
            return vec![Effect::Seek {
                position_seconds: resumed.last_position_seconds,
            }];
        }
        Vec::new()
    }

    fn on_resolution_failed(&mut self) -> Vec<Effect> {
        // Unresolved mounts keep accumulating locally; a later mount starts
        // fresh rather than retrying here.
        if self.state == TrackerState::Resolving {
            self.state = TrackerState::Uninitialized;
        }
        Vec::new()
    }

    fn on_playing(&mut self) -> Vec<Effect> {
        if self.state == TrackerState::Tracking {
            return Vec::new();
        }
        self.state = TrackerState::Tracking;
        vec![Effect::StartTicker]
    }

    fn on_paused(&mut self, sample: PlaybackSample) -> Vec<Effect> {
        let was_tracking = self.state == TrackerState::Tracking;
        self.state = TrackerState::Paused;
        self.last_saved_position = sample.position_seconds;

        let mut effects = Vec::new();
        if was_tracking {
            effects.push(Effect::StopTicker);
        }
        effects.push(Effect::SaveCheckpoint(self.checkpoint(sample, false)));
        effects
    }

    fn on_ended(&mut self, sample: PlaybackSample) -> Vec<Effect> {
        let was_tracking = self.state == TrackerState::Tracking;
        self.state = TrackerState::Finalized;

        let mut effects = Vec::new();
        if was_tracking {
            effects.push(Effect::StopTicker);
        }
        effects.push(Effect::SaveCheckpoint(self.checkpoint(sample, true)));
        if !self.complete_signaled {
            self.complete_signaled = true;
            effects.push(Effect::NotifyComplete);
        }
        effects
    }

    fn on_tick(&mut self, sample: PlaybackSample) -> Vec<Effect> {
        if self.state != TrackerState::Tracking {
            return Vec::new();
        }

        self.watch_time_seconds = self.watch_time_seconds.saturating_add(1);

        if self.watched_share(sample) >= f64::from(self.policy.completion_threshold_percent) {
            self.state = TrackerState::Finalized;
            self.last_saved_position = sample.position_seconds;
            let mut effects = vec![
                Effect::SaveCheckpoint(self.checkpoint(sample, true)),
                Effect::StopTicker,
            ];
            if !self.complete_signaled {
                self.complete_signaled = true;
                effects.push(Effect::NotifyComplete);
            }
            return effects;
        }

        let advanced = sample.position_seconds - self.last_saved_position;
        if advanced >= f64::from(self.policy.checkpoint_interval_seconds) {
            self.last_saved_position = sample.position_seconds;
            return vec![Effect::SaveCheckpoint(self.checkpoint(sample, false))];
        }

        Vec::new()
    }

    /// Unrounded watched share in percent; 0 when duration is unreported.
    fn watched_share(&self, sample: PlaybackSample) -> f64 {
        if !sample.duration_seconds.is_finite() || sample.duration_seconds <= 0.0 {
            return 0.0;
        }
        sample.position_seconds / sample.duration_seconds * 100.0
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn checkpoint(&self, sample: PlaybackSample, completed: bool) -> Checkpoint {
        let duration_seconds = if sample.duration_seconds.is_finite() && sample.duration_seconds > 0.0
        {
            Some(sample.duration_seconds.round() as u32)
        } else {
            None
        };
        let position_seconds = if sample.position_seconds.is_finite() && sample.position_seconds > 0.0
        {
            sample.position_seconds.round() as u32
        } else {
            0
        };

        Checkpoint {
            position_seconds,
            watch_time_seconds: self.watch_time_seconds,
            duration_seconds,
            completion_percentage: completion_percentage(
                sample.position_seconds,
                sample.duration_seconds,
            ),
            completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(position: f64, duration: f64) -> PlaybackSample {
        PlaybackSample {
            position_seconds: position,
            duration_seconds: duration,
        }
    }

    fn machine() -> TrackerMachine {
        TrackerMachine::new(TrackerPolicy::default())
    }

    fn resolved_machine() -> TrackerMachine {
        let mut m = machine();
        m.apply(TrackerInput::ProviderReady);
        m.apply(TrackerInput::SessionResolved(None));
        m
    }

    fn checkpoints(effects: &[Effect]) -> Vec<Checkpoint> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::SaveCheckpoint(cp) => Some(*cp),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ready_resolves_session_exactly_once() {
        let mut m = machine();
        assert_eq!(m.apply(TrackerInput::ProviderReady), vec![Effect::ResolveSession]);
        assert_eq!(m.state(), TrackerState::Resolving);
        assert!(m.apply(TrackerInput::ProviderReady).is_empty());
    }

    #[test]
    fn resume_above_floor_seeks_to_saved_position() {
        let mut m = machine();
        m.apply(TrackerInput::ProviderReady);
        let effects = m.apply(TrackerInput::SessionResolved(Some(ResumedSession {
            watch_time_seconds: 40,
            last_position_seconds: 15,
        })));
        assert_eq!(effects, vec![Effect::Seek { position_seconds: 15 }]);
        assert_eq!(m.watch_time_seconds(), 40);
    }

    #[test]
    fn resume_below_floor_does_not_seek() {
        let mut m = machine();
        m.apply(TrackerInput::ProviderReady);
        let effects = m.apply(TrackerInput::SessionResolved(Some(ResumedSession {
            watch_time_seconds: 4,
            last_position_seconds: 5,
        })));
        assert!(effects.is_empty());
    }

    #[test]
    fn resume_is_disabled_by_policy() {
        let mut m = TrackerMachine::new(TrackerPolicy {
            auto_resume: false,
            ..TrackerPolicy::default()
        });
        m.apply(TrackerInput::ProviderReady);
        let effects = m.apply(TrackerInput::SessionResolved(Some(ResumedSession {
            watch_time_seconds: 40,
            last_position_seconds: 300,
        })));
        assert!(effects.is_empty());
        assert_eq!(m.watch_time_seconds(), 40);
    }

    #[test]
    fn fresh_session_starts_zeroed() {
        let m = resolved_machine();
        assert_eq!(m.state(), TrackerState::Ready);
        assert_eq!(m.watch_time_seconds(), 0);
    }

    #[test]
    fn resolution_failure_returns_to_uninitialized() {
        let mut m = machine();
        m.apply(TrackerInput::ProviderReady);
        m.apply(TrackerInput::ResolutionFailed);
        assert_eq!(m.state(), TrackerState::Uninitialized);
    }

    #[test]
    fn playing_acquires_the_ticker_once() {
        let mut m = resolved_machine();
        assert_eq!(m.apply(TrackerInput::Playing), vec![Effect::StartTicker]);
        assert!(m.apply(TrackerInput::Playing).is_empty());
        assert_eq!(m.state(), TrackerState::Tracking);
    }

    #[test]
    fn ticks_accumulate_watch_time_monotonically() {
        let mut m = resolved_machine();
        m.apply(TrackerInput::Playing);
        let mut previous = m.watch_time_seconds();
        for i in 0..5 {
            m.apply(TrackerInput::Tick(sample(f64::from(i), 600.0)));
            assert!(m.watch_time_seconds() > previous);
            previous = m.watch_time_seconds();
        }
        assert_eq!(previous, 5);
    }

    #[test]
    fn checkpoint_fires_after_interval_of_position_advance() {
        let mut m = resolved_machine();
        m.apply(TrackerInput::Playing);

        let effects = m.apply(TrackerInput::Tick(sample(9.0, 600.0)));
        assert!(checkpoints(&effects).is_empty());

        let effects = m.apply(TrackerInput::Tick(sample(10.0, 600.0)));
        let cps = checkpoints(&effects);
        assert_eq!(cps.len(), 1);
        assert_eq!(cps[0].position_seconds, 10);
        assert_eq!(cps[0].completion_percentage, 2);
        assert!(!cps[0].completed);

        // The next checkpoint waits for another full interval.
        let effects = m.apply(TrackerInput::Tick(sample(15.0, 600.0)));
        assert!(checkpoints(&effects).is_empty());
        let effects = m.apply(TrackerInput::Tick(sample(20.0, 600.0)));
        assert_eq!(checkpoints(&effects).len(), 1);
    }

    #[test]
    fn threshold_completion_at_80_percent() {
        let mut m = resolved_machine();
        m.apply(TrackerInput::Playing);

        let effects = m.apply(TrackerInput::Tick(sample(79.0, 100.0)));
        for cp in checkpoints(&effects) {
            assert!(!cp.completed);
        }
        assert_eq!(m.state(), TrackerState::Tracking);

        let effects = m.apply(TrackerInput::Tick(sample(80.0, 100.0)));
        let cps = checkpoints(&effects);
        assert_eq!(cps.len(), 1);
        assert!(cps[0].completed);
        assert_eq!(cps[0].completion_percentage, 80);
        assert!(effects.contains(&Effect::NotifyComplete));
        assert!(effects.contains(&Effect::StopTicker));
        assert_eq!(m.state(), TrackerState::Finalized);
    }

    #[test]
    fn zero_duration_never_completes_nor_divides() {
        let mut m = resolved_machine();
        m.apply(TrackerInput::Playing);
        let effects = m.apply(TrackerInput::Tick(sample(500.0, 0.0)));
        let cps = checkpoints(&effects);
        // Position advanced past the interval, so a checkpoint fires, but
        // with zero percentage and no completion.
        assert_eq!(cps.len(), 1);
        assert_eq!(cps[0].completion_percentage, 0);
        assert!(!cps[0].completed);
        assert_eq!(cps[0].duration_seconds, None);
        assert_eq!(m.state(), TrackerState::Tracking);
    }

    #[test]
    fn pause_stops_ticker_and_checkpoints_without_completing() {
        let mut m = resolved_machine();
        m.apply(TrackerInput::Playing);
        let effects = m.apply(TrackerInput::Paused(sample(42.0, 600.0)));
        assert_eq!(effects[0], Effect::StopTicker);
        let cps = checkpoints(&effects);
        assert_eq!(cps.len(), 1);
        assert!(!cps[0].completed);
        assert_eq!(cps[0].position_seconds, 42);
        assert_eq!(m.state(), TrackerState::Paused);
    }

    #[test]
    fn natural_end_completes_and_notifies_once() {
        let mut m = resolved_machine();
        m.apply(TrackerInput::Playing);
        let effects = m.apply(TrackerInput::Ended(sample(600.0, 600.0)));
        let cps = checkpoints(&effects);
        assert_eq!(cps.len(), 1);
        assert!(cps[0].completed);
        assert_eq!(cps[0].completion_percentage, 100);
        assert!(effects.contains(&Effect::NotifyComplete));
        assert_eq!(m.state(), TrackerState::Finalized);
    }

    #[test]
    fn end_while_paused_still_completes() {
        let mut m = resolved_machine();
        m.apply(TrackerInput::Playing);
        m.apply(TrackerInput::Paused(sample(550.0, 600.0)));
        let effects = m.apply(TrackerInput::Ended(sample(600.0, 600.0)));
        assert!(!effects.contains(&Effect::StopTicker));
        assert!(effects.contains(&Effect::NotifyComplete));
        assert_eq!(m.state(), TrackerState::Finalized);
    }

    #[test]
    fn finalized_absorbs_all_further_input() {
        let mut m = resolved_machine();
        m.apply(TrackerInput::Playing);
        m.apply(TrackerInput::Tick(sample(80.0, 100.0)));
        assert_eq!(m.state(), TrackerState::Finalized);

        assert!(m.apply(TrackerInput::Playing).is_empty());
        assert!(m.apply(TrackerInput::Tick(sample(90.0, 100.0))).is_empty());
        assert!(m.apply(TrackerInput::Paused(sample(90.0, 100.0))).is_empty());
        assert!(m.apply(TrackerInput::Ended(sample(100.0, 100.0))).is_empty());
    }

    #[test]
    fn rapid_pause_play_pairs_do_not_re_resolve() {
        let mut m = resolved_machine();
        for _ in 0..3 {
            let effects = m.apply(TrackerInput::Playing);
            assert!(!effects.contains(&Effect::ResolveSession));
            let effects = m.apply(TrackerInput::Paused(sample(3.0, 600.0)));
            assert!(!effects.contains(&Effect::ResolveSession));
        }
    }
}
