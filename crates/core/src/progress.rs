use std::collections::HashMap;

use crate::model::{VideoId, WatchSession};

/// Percentage of a video watched, rounded to the nearest integer.
///
/// Returns 0 when the duration is unknown, zero, or not a finite number, so
/// callers never divide by zero on an unreported duration.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn completion_percentage(position_seconds: f64, duration_seconds: f64) -> u8 {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 || position_seconds <= 0.0 {
        return 0;
    }
    let ratio = (position_seconds / duration_seconds * 100.0).round();
    if ratio >= 100.0 { 100 } else { ratio as u8 }
}

/// Progress for a single video, defaulting every field to its
/// zero-equivalent when the learner has no session for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoProgress {
    pub completed: bool,
    pub percentage: u8,
    pub watch_time_seconds: u32,
    pub last_position_seconds: u32,
    pub duration_seconds: Option<u32>,
}

/// Overall progress across a requested set of videos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed_videos: usize,
    pub total_videos: usize,
    pub completion_percentage: u8,
    pub total_watch_time_minutes: u32,
}

/// Aggregated view over one learner's sessions for a set of videos.
///
/// Holds the most recently created session per requested video id; videos
/// never attempted still count toward the total with zero progress.
#[derive(Debug, Clone, Default)]
pub struct LearnerProgress {
    video_ids: Vec<VideoId>,
    latest: HashMap<VideoId, WatchSession>,
}

impl LearnerProgress {
    /// An aggregation with no sessions, e.g. for an unauthenticated viewer.
    #[must_use]
    pub fn empty(video_ids: Vec<VideoId>) -> Self {
        Self {
            video_ids,
            latest: HashMap::new(),
        }
    }

    /// Build the aggregation from raw session rows.
    ///
    /// Sessions for ids outside the requested set are ignored. When a video
    /// has several sessions the one with the latest `created_at` wins.
    #[must_use]
    pub fn from_sessions(video_ids: Vec<VideoId>, sessions: Vec<WatchSession>) -> Self {
        let mut latest: HashMap<VideoId, WatchSession> = HashMap::new();
        for session in sessions {
            if !video_ids.contains(session.video_id()) {
                continue;
            }
            match latest.get(session.video_id()) {
                Some(existing) if existing.created_at() >= session.created_at() => {}
                _ => {
                    latest.insert(session.video_id().clone(), session);
                }
            }
        }

        Self { video_ids, latest }
    }

    /// The requested video id set.
    #[must_use]
    pub fn video_ids(&self) -> &[VideoId] {
        &self.video_ids
    }

    /// Progress for a single video, zeroed when no session exists.
    #[must_use]
    pub fn video(&self, video_id: &VideoId) -> VideoProgress {
        self.latest
            .get(video_id)
            .map_or_else(VideoProgress::default, |session| VideoProgress {
                completed: session.completed(),
                percentage: session.completion_percentage(),
                watch_time_seconds: session.watch_time_seconds(),
                last_position_seconds: session.last_position_seconds(),
                duration_seconds: session.video_duration_seconds(),
            })
    }

    /// Overall progress across the requested id set.
    ///
    /// The denominator is the size of the requested set, not the number of
    /// sessions found.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn total(&self) -> ProgressSnapshot {
        let total_videos = self.video_ids.len();
        let completed_videos = self
            .video_ids
            .iter()
            .filter(|id| self.latest.get(*id).is_some_and(WatchSession::completed))
            .count();

        let completion_percentage = if total_videos == 0 {
            0
        } else {
            (completed_videos as f64 / total_videos as f64 * 100.0).round() as u8
        };

        let total_watch_seconds: u64 = self
            .video_ids
            .iter()
            .filter_map(|id| self.latest.get(id))
            .map(|session| u64::from(session.watch_time_seconds()))
            .sum();
        let total_watch_time_minutes = (total_watch_seconds as f64 / 60.0).round() as u32;

        ProgressSnapshot {
            completed_videos,
            total_videos,
            completion_percentage,
            total_watch_time_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LearnerId, SessionId};
    use crate::time::fixed_now;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn vid(id: &str) -> VideoId {
        VideoId::new(id).unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn build_session(
        video: &str,
        watch_time: u32,
        position: u32,
        percentage: u8,
        completed: bool,
        created_at: DateTime<Utc>,
    ) -> WatchSession {
        WatchSession::from_persisted(
            SessionId::new(Uuid::new_v4()),
            LearnerId::new(Uuid::new_v4()),
            vid(video),
            created_at,
            None,
            watch_time,
            position,
            Some(600),
            percentage,
            completed,
            created_at,
        )
        .unwrap()
    }

    #[test]
    fn percentage_rounds_to_nearest_integer() {
        assert_eq!(completion_percentage(80.0, 100.0), 80);
        assert_eq!(completion_percentage(79.0, 100.0), 79);
        assert_eq!(completion_percentage(1.0, 3.0), 33);
        assert_eq!(completion_percentage(2.0, 3.0), 67);
    }

    #[test]
    fn percentage_is_zero_without_duration() {
        assert_eq!(completion_percentage(42.0, 0.0), 0);
        assert_eq!(completion_percentage(42.0, -1.0), 0);
        assert_eq!(completion_percentage(42.0, f64::NAN), 0);
    }

    #[test]
    fn percentage_is_capped_at_100() {
        assert_eq!(completion_percentage(120.0, 100.0), 100);
    }

    #[test]
    fn unattempted_video_reports_zero_progress() {
        let progress = LearnerProgress::empty(vec![vid("a")]);
        assert_eq!(progress.video(&vid("a")), VideoProgress::default());
    }

    #[test]
    fn denominator_is_the_requested_set() {
        let now = fixed_now();
        let sessions = vec![build_session("a", 300, 480, 96, true, now)];
        let progress =
            LearnerProgress::from_sessions(vec![vid("a"), vid("b"), vid("c")], sessions);

        let total = progress.total();
        assert_eq!(total.completed_videos, 1);
        assert_eq!(total.total_videos, 3);
        assert_eq!(total.completion_percentage, 33);
        assert_eq!(total.total_watch_time_minutes, 5);
    }

    #[test]
    fn most_recent_session_wins_per_video() {
        let now = fixed_now();
        let older = build_session("a", 100, 50, 10, false, now - chrono::Duration::hours(2));
        let newer = build_session("a", 400, 500, 90, true, now);
        let progress =
            LearnerProgress::from_sessions(vec![vid("a")], vec![older, newer]);

        let video = progress.video(&vid("a"));
        assert!(video.completed);
        assert_eq!(video.percentage, 90);
        assert_eq!(video.watch_time_seconds, 400);
    }

    #[test]
    fn sessions_outside_the_requested_set_are_ignored() {
        let now = fixed_now();
        let sessions = vec![build_session("other", 100, 50, 10, true, now)];
        let progress = LearnerProgress::from_sessions(vec![vid("a")], sessions);

        assert_eq!(progress.total().completed_videos, 0);
        assert_eq!(progress.total().total_watch_time_minutes, 0);
    }

    #[test]
    fn empty_id_set_reports_zero_percentage() {
        let progress = LearnerProgress::empty(Vec::new());
        assert_eq!(progress.total().completion_percentage, 0);
    }
}
