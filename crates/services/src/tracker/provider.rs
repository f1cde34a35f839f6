use academy_core::tracker::PlaybackSample;

/// Discrete lifecycle events reported by the embedded video widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The widget finished loading and can be controlled.
    Ready,
    /// Playback started or resumed.
    Playing,
    /// Playback paused (including seek-triggered pauses).
    Paused,
    /// Playback reached the end of the video.
    Ended,
}

/// Imperative surface of the embedded video widget.
///
/// The tracker polls `sample` once per second while playing and commands
/// `seek` when resuming a saved position. Implementations wrap whatever
/// player the view layer embeds; tests inject a scripted fake.
pub trait VideoProvider: Send + Sync {
    /// Current position and duration, or `None` while the widget cannot
    /// report them (duration may still be zero when unreported).
    fn sample(&self) -> Option<PlaybackSample>;

    /// Jump playback to the given offset.
    fn seek(&self, position_seconds: u32);
}
