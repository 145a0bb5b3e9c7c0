//! Rollups over session history for the learning report.
//!
//! History is expected most-recent-first, the order the session history
//! repository returns it in.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{Operation, Session};

/// Sessions in each trend window.
pub const TREND_WINDOW: usize = 5;
/// Accuracy points the recent window must differ by to count as a trend.
pub const TREND_THRESHOLD: f64 = 5.0;

/// Direction of recent accuracy compared with the window before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        }
    }
}

/// Summary shown on the report screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearningReport {
    pub total_practice_time: Duration,
    pub most_practiced_operation: Operation,
    pub trend: Trend,
    pub streak_days: u32,
}

impl LearningReport {
    /// Report for a learner with no sessions yet.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_practice_time: Duration::zero(),
            most_practiced_operation: Operation::Addition,
            trend: Trend::Stable,
            streak_days: 0,
        }
    }

    /// Aggregate `sessions` (most recent first) as of `now`.
    ///
    /// Calendar days for the streak are taken in `now`'s time zone.
    #[must_use]
    pub fn from_history<Tz: TimeZone>(sessions: &[Session], now: &DateTime<Tz>) -> Self {
        if sessions.is_empty() {
            return Self::empty();
        }
        Self {
            total_practice_time: total_practice_time(sessions),
            most_practiced_operation: most_practiced_operation(sessions),
            trend: trend(sessions),
            streak_days: streak_days(sessions, now),
        }
    }
}

/// Sum of session lengths; sessions without an end time count as zero.
#[must_use]
pub fn total_practice_time(sessions: &[Session]) -> Duration {
    sessions
        .iter()
        .filter_map(Session::duration)
        .fold(Duration::zero(), |acc, d| acc + d)
}

/// Most frequent primary operation; ties go to the first one encountered.
#[must_use]
pub fn most_practiced_operation(sessions: &[Session]) -> Operation {
    let mut counts: Vec<(Operation, usize)> = Vec::new();
    for session in sessions {
        let op = session.primary_operation();
        match counts.iter_mut().find(|(seen, _)| *seen == op) {
            Some((_, n)) => *n += 1,
            None => counts.push((op, 1)),
        }
    }

    let mut best: Option<(Operation, usize)> = None;
    for (op, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((op, n));
        }
    }
    best.map_or(Operation::Addition, |(op, _)| op)
}

/// Compare the latest window's mean accuracy with the window before it.
///
/// A missing or empty window contributes a mean of 0.
#[must_use]
pub fn trend(sessions: &[Session]) -> Trend {
    let recent_end = sessions.len().min(TREND_WINDOW);
    let older_end = sessions.len().min(TREND_WINDOW * 2);

    let recent = mean_accuracy(&sessions[..recent_end]);
    let older = mean_accuracy(&sessions[recent_end..older_end]);

    if recent > older + TREND_THRESHOLD {
        Trend::Improving
    } else if recent < older - TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_accuracy(window: &[Session]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(Session::accuracy).sum::<f64>() / window.len() as f64
}

/// Consecutive days, ending today, on which at least one session started.
///
/// Returns 0 when there is no session today.
#[must_use]
pub fn streak_days<Tz: TimeZone>(sessions: &[Session], now: &DateTime<Tz>) -> u32 {
    let tz = now.timezone();
    let active: HashSet<NaiveDate> = sessions
        .iter()
        .map(|s| s.start_time().with_timezone(&tz).date_naive())
        .collect();

    let mut day = now.date_naive();
    let mut streak = 0_u32;
    while active.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerRecord, Difficulty, Problem, ProblemId, SessionId};
    use crate::time::fixed_now;
    use chrono::{FixedOffset, Utc};

    fn session_at(
        start: DateTime<Utc>,
        minutes: Option<i64>,
        operation: Operation,
        correct_of_ten: u32,
    ) -> Session {
        let problems: Vec<Problem> = (0..10)
            .map(|i| {
                Problem::new(
                    ProblemId::new(format!("q_{i}")),
                    Operation::Addition,
                    Difficulty::Beginner,
                    i,
                    1,
                    start,
                )
                .unwrap()
            })
            .collect();
        let answers: Vec<AnswerRecord> = problems
            .iter()
            .zip(0_u32..)
            .map(|(p, i)| {
                let value = if i < correct_of_ten {
                    i64::from(p.correct_answer())
                } else {
                    -1
                };
                AnswerRecord::new(p, value, 1_000, start)
            })
            .collect();

        let record = serde_json::json!({
            "id": SessionId::new(uuid::Uuid::nil()),
            "startTime": start,
            "endTime": minutes.map(|m| start + Duration::minutes(m)),
            "difficulty": 1,
            "operations": [operation],
            "problems": problems,
            "answers": answers,
        });
        serde_json::from_value(record).unwrap()
    }

    fn on(days_ago: i64) -> DateTime<Utc> {
        fixed_now() - Duration::days(days_ago)
    }

    #[test]
    fn empty_history_gives_defaults() {
        let report = LearningReport::from_history(&[], &fixed_now());
        assert_eq!(report, LearningReport::empty());
    }

    #[test]
    fn practice_time_skips_sessions_without_end() {
        let sessions = vec![
            session_at(on(0), Some(5), Operation::Addition, 10),
            session_at(on(1), None, Operation::Addition, 10),
            session_at(on(2), Some(7), Operation::Addition, 10),
        ];
        assert_eq!(total_practice_time(&sessions), Duration::minutes(12));
    }

    #[test]
    fn most_practiced_breaks_ties_by_first_seen() {
        let sessions = vec![
            session_at(on(0), Some(1), Operation::Division, 10),
            session_at(on(0), Some(1), Operation::Subtraction, 10),
            session_at(on(0), Some(1), Operation::Subtraction, 10),
            session_at(on(0), Some(1), Operation::Division, 10),
            session_at(on(0), Some(1), Operation::Addition, 10),
        ];
        assert_eq!(most_practiced_operation(&sessions), Operation::Division);

        let mut more = sessions.clone();
        more.push(session_at(on(0), Some(1), Operation::Subtraction, 10));
        assert_eq!(most_practiced_operation(&more), Operation::Subtraction);
    }

    #[test]
    fn trend_compares_two_windows() {
        let mut sessions: Vec<Session> = (0..5)
            .map(|d| session_at(on(d), Some(1), Operation::Addition, 9))
            .collect();
        sessions.extend((5..10).map(|d| session_at(on(d), Some(1), Operation::Addition, 7)));
        assert_eq!(trend(&sessions), Trend::Improving);

        sessions.reverse();
        assert_eq!(trend(&sessions), Trend::Declining);

        let flat: Vec<Session> = (0..10)
            .map(|d| session_at(on(d), Some(1), Operation::Addition, 8))
            .collect();
        assert_eq!(trend(&flat), Trend::Stable);
    }

    #[test]
    fn missing_older_window_counts_as_zero() {
        let few: Vec<Session> = (0..3)
            .map(|d| session_at(on(d), Some(1), Operation::Addition, 5))
            .collect();
        assert_eq!(trend(&few), Trend::Improving);

        let all_wrong = vec![session_at(on(0), Some(1), Operation::Addition, 0)];
        assert_eq!(trend(&all_wrong), Trend::Stable);
    }

    #[test]
    fn partly_filled_older_window_averages_what_it_has() {
        // 5 recent at 60%, 2 older at 80% and 40%. The older mean is 60, not
        // the 24 a full window of 5 would give, so the trend is stable.
        let mut sessions: Vec<Session> = (0..5)
            .map(|d| session_at(on(d), Some(1), Operation::Addition, 6))
            .collect();
        sessions.push(session_at(on(5), Some(1), Operation::Addition, 8));
        sessions.push(session_at(on(6), Some(1), Operation::Addition, 4));
        assert_eq!(trend(&sessions), Trend::Stable);

        // 2 older at 90% beat a recent 60% by more than the threshold.
        sessions[5] = session_at(on(5), Some(1), Operation::Addition, 9);
        sessions[6] = session_at(on(6), Some(1), Operation::Addition, 9);
        assert_eq!(trend(&sessions), Trend::Declining);
    }

    #[test]
    fn streak_counts_today_and_yesterday() {
        let sessions = vec![
            session_at(on(0), Some(1), Operation::Addition, 10),
            session_at(on(1), Some(1), Operation::Addition, 10),
            session_at(on(3), Some(1), Operation::Addition, 10),
        ];
        assert_eq!(streak_days(&sessions, &fixed_now()), 2);
    }

    #[test]
    fn streak_is_zero_without_a_session_today() {
        let sessions = vec![
            session_at(on(1), Some(1), Operation::Addition, 10),
            session_at(on(2), Some(1), Operation::Addition, 10),
        ];
        assert_eq!(streak_days(&sessions, &fixed_now()), 0);
    }

    #[test]
    fn several_sessions_on_one_day_count_once() {
        let sessions = vec![
            session_at(on(0), Some(1), Operation::Addition, 10),
            session_at(on(0) - Duration::hours(1), Some(1), Operation::Addition, 10),
        ];
        assert_eq!(streak_days(&sessions, &fixed_now()), 1);
    }

    #[test]
    fn streak_uses_the_learners_calendar_day() {
        // fixed_now is 22:13 UTC, which is already Nov 15 at UTC+3.
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        let sessions = vec![session_at(on(0), Some(1), Operation::Addition, 10)];
        let local_now = fixed_now().with_timezone(&plus_three);
        assert_eq!(streak_days(&sessions, &local_now), 1);
        let local_tomorrow = local_now + Duration::days(1);
        assert_eq!(streak_days(&sessions, &local_tomorrow), 0);
    }
}
