//! Clock-driven helpers. Neither type reads the system clock: callers pass
//! `now` in, which keeps both deterministic under test.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::engine::study::StudyStore;
use crate::storage::kv::KeyValueStore;

/// One study-time tick per minute of open session.
pub const STUDY_TICK_SECONDS: i64 = 60;

/// Length of a timed quiz.
pub const TIMED_QUIZ_SECONDS: i64 = 600;

/// Adds one minute of study time per whole interval while running.
#[derive(Debug, Clone)]
pub struct StudyTimer {
    interval: Duration,
    next_tick: Option<DateTime<Utc>>,
}

impl Default for StudyTimer {
    fn default() -> Self {
        Self::new(Duration::seconds(STUDY_TICK_SECONDS))
    }
}

impl StudyTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::seconds(1)),
            next_tick: None,
        }
    }

    /// Starting an already running timer keeps its schedule.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.next_tick.is_none() {
            self.next_tick = Some(now + self.interval);
        }
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Fire every tick that came due by `now`. Returns how many fired.
    pub fn poll<S: KeyValueStore>(
        &mut self,
        now: DateTime<Utc>,
        today: NaiveDate,
        study: &mut StudyStore<S>,
    ) -> u32 {
        let Some(mut due) = self.next_tick else {
            return 0;
        };
        let mut fired = 0;
        while due <= now {
            study.tick_study_time(today);
            fired += 1;
            due = due + self.interval;
        }
        self.next_tick = Some(due);
        fired
    }
}

/// Deadline of a timed quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    deadline: DateTime<Utc>,
}

impl Countdown {
    pub fn starting_at(now: DateTime<Utc>, seconds: i64) -> Self {
        Self {
            deadline: now + Duration::seconds(seconds),
        }
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Whole seconds left, rounded up, never negative.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        let ms = (self.deadline - now).num_milliseconds();
        if ms <= 0 { 0 } else { (ms + 999) / 1000 }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }
}

/// `mm:ss` rendering used by the quiz runner.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn ticks_once_per_whole_minute() {
        let mut study = StudyStore::open(MemoryStore::new(), 3);
        let mut timer = StudyTimer::default();
        timer.start(at(0));

        assert_eq!(timer.poll(at(59), today(), &mut study), 0);
        assert_eq!(timer.poll(at(60), today(), &mut study), 1);
        assert_eq!(timer.poll(at(119), today(), &mut study), 0);
        assert_eq!(timer.poll(at(300), today(), &mut study), 4);
        assert_eq!(study.state().study_stats.study_time, 5);
        assert_eq!(study.state().study_stats.study_streak, 1);
    }

    #[test]
    fn stopped_timer_never_ticks() {
        let mut study = StudyStore::open(MemoryStore::new(), 3);
        let mut timer = StudyTimer::default();
        assert_eq!(timer.poll(at(600), today(), &mut study), 0);

        timer.start(at(0));
        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(timer.poll(at(600), today(), &mut study), 0);
        assert_eq!(study.state().study_stats.study_time, 0);
    }

    #[test]
    fn restarting_keeps_the_schedule() {
        let mut study = StudyStore::open(MemoryStore::new(), 3);
        let mut timer = StudyTimer::default();
        timer.start(at(0));
        timer.start(at(50));
        assert_eq!(timer.poll(at(60), today(), &mut study), 1);
    }

    #[test]
    fn countdown_rounds_up_and_expires_at_the_deadline() {
        let countdown = Countdown::starting_at(at(0), TIMED_QUIZ_SECONDS);
        assert_eq!(countdown.remaining_secs(at(0)), 600);
        assert_eq!(
            countdown.remaining_secs(at(0) + Duration::milliseconds(1500)),
            599
        );
        assert!(!countdown.is_expired(at(599)));
        assert!(countdown.is_expired(at(600)));
        assert_eq!(countdown.remaining_secs(at(700)), 0);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(61), "1:01");
        assert_eq!(format_clock(-5), "0:00");
    }
}
