use std::collections::HashMap;

use chrono::NaiveDate;
use log::{debug, warn};

use crate::model::{MAX_MASTERY, QuizResult, QuizSummary, StudyState, Theme};
use crate::storage::kv::KeyValueStore;
use crate::storage::repo;

// ── Transitions ──────────────────────────────────────────────────────────

impl StudyState {
    /// Mastery of a word; words never touched are at level 0.
    pub fn mastery_level(&self, word: &str) -> u8 {
        self.mastered_words.get(word).copied().unwrap_or(0)
    }

    pub fn is_bookmarked(&self, word: &str) -> bool {
        self.bookmarked_words.contains(word)
    }

    /// Returns whether the word is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, word: &str) -> bool {
        if self.bookmarked_words.remove(word) {
            false
        } else {
            self.bookmarked_words.insert(word.to_string());
            true
        }
    }

    pub fn set_mastery(&mut self, word: &str, level: i64) -> u8 {
        let level = level.clamp(0, MAX_MASTERY as i64) as u8;
        self.mastered_words.insert(word.to_string(), level);
        level
    }

    /// Quiz-driven path: one level up when correct, one down when not.
    pub fn adjust_mastery_by_result(&mut self, word: &str, is_correct: bool) -> u8 {
        let current = self.mastery_level(word);
        let next = if is_correct {
            (current + 1).min(MAX_MASTERY)
        } else {
            current.saturating_sub(1)
        };
        self.mastered_words.insert(word.to_string(), next);
        next
    }

    /// Manual "level up" path. Never decreases.
    pub fn increase_mastery(&mut self, word: &str) -> u8 {
        let current = self.mastery_level(word);
        if current >= MAX_MASTERY {
            return current;
        }
        self.mastered_words.insert(word.to_string(), current + 1);
        current + 1
    }

    /// Saturates at the ends of the vocabulary instead of wrapping.
    pub fn go_to_card(&mut self, index: i64, vocabulary_len: usize) -> usize {
        self.current_card_index = if vocabulary_len == 0 {
            0
        } else {
            index.clamp(0, vocabulary_len as i64 - 1) as usize
        };
        self.current_card_index
    }

    pub fn next_card(&mut self, vocabulary_len: usize) -> usize {
        if vocabulary_len > 0 {
            self.current_card_index = (self.current_card_index + 1) % vocabulary_len;
        }
        self.current_card_index
    }

    pub fn prev_card(&mut self, vocabulary_len: usize) -> usize {
        if vocabulary_len > 0 {
            self.current_card_index =
                (self.current_card_index % vocabulary_len + vocabulary_len - 1) % vocabulary_len;
        }
        self.current_card_index
    }

    /// Returns true when the word had not been studied before.
    pub fn record_card_studied(&mut self, word: &str) -> bool {
        self.study_stats.cards_studied.insert(word.to_string())
    }

    pub fn record_flip(&mut self) {
        self.study_stats.total_flips += 1;
    }

    pub fn record_quiz_result(&mut self, result: QuizResult, today: NaiveDate) {
        self.study_stats.study_time += result.time_spent / 60;
        self.study_stats.quiz_scores.push(result);
        self.mark_active(today);
    }

    pub fn tick_study_time(&mut self, today: NaiveDate) {
        self.study_stats.study_time += 1;
        self.mark_active(today);
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Streak rule: +1 for the day after the last active day, reset to 1 after
    /// a longer gap, unchanged within the same day. A clock that moved
    /// backwards leaves everything as it was.
    fn mark_active(&mut self, today: NaiveDate) {
        let stats = &mut self.study_stats;
        match stats.last_study_date {
            None => stats.study_streak = 1,
            Some(last) => match (today - last).num_days() {
                1 => stats.study_streak += 1,
                gap if gap > 1 => stats.study_streak = 1,
                0 => stats.study_streak = stats.study_streak.max(1),
                _ => return,
            },
        }
        stats.last_study_date = Some(today);
    }
}

// ── Owning container ─────────────────────────────────────────────────────

/// Owns the learner's state and writes it through to storage after every
/// mutation. Storage failures are logged and otherwise ignored: the in-memory
/// state stays authoritative for the rest of the session.
pub struct StudyStore<S: KeyValueStore> {
    state: StudyState,
    vocabulary_len: usize,
    summaries: HashMap<String, QuizSummary>,
    store: S,
}

impl<S: KeyValueStore> StudyStore<S> {
    /// Restore the state from `store` (or start fresh) for a vocabulary of
    /// `vocabulary_len` words.
    pub fn open(store: S, vocabulary_len: usize) -> Self {
        let mut state = repo::load_state(&store);
        let index = state.current_card_index as i64;
        state.go_to_card(index, vocabulary_len);
        Self {
            state,
            vocabulary_len,
            summaries: HashMap::new(),
            store,
        }
    }

    pub fn state(&self) -> &StudyState {
        &self.state
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary_len
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) {
        if let Err(e) = repo::save_state(&mut self.store, &self.state) {
            warn!("could not save study record, keeping it in memory: {e}");
        }
    }

    pub fn toggle_bookmark(&mut self, word: &str) -> bool {
        let bookmarked = self.state.toggle_bookmark(word);
        debug!("bookmark {word}: {bookmarked}");
        self.persist();
        bookmarked
    }

    pub fn set_mastery(&mut self, word: &str, level: i64) -> u8 {
        let level = self.state.set_mastery(word, level);
        debug!("mastery {word} set to {level}");
        self.persist();
        level
    }

    pub fn adjust_mastery_by_result(&mut self, word: &str, is_correct: bool) -> u8 {
        let level = self.state.adjust_mastery_by_result(word, is_correct);
        debug!("mastery {word} -> {level} (correct: {is_correct})");
        self.persist();
        level
    }

    pub fn increase_mastery(&mut self, word: &str) -> u8 {
        let level = self.state.increase_mastery(word);
        self.persist();
        level
    }

    pub fn go_to_card(&mut self, index: i64) -> usize {
        let index = self.state.go_to_card(index, self.vocabulary_len);
        self.persist();
        index
    }

    pub fn next_card(&mut self) -> usize {
        let index = self.state.next_card(self.vocabulary_len);
        self.persist();
        index
    }

    pub fn prev_card(&mut self) -> usize {
        let index = self.state.prev_card(self.vocabulary_len);
        self.persist();
        index
    }

    pub fn record_card_studied(&mut self, word: &str) -> bool {
        let fresh = self.state.record_card_studied(word);
        if fresh {
            self.persist();
        }
        fresh
    }

    pub fn record_flip(&mut self) {
        self.state.record_flip();
        self.persist();
    }

    pub fn record_quiz_result(&mut self, result: QuizResult, today: NaiveDate) {
        self.state.record_quiz_result(result, today);
        self.persist();
    }

    pub fn tick_study_time(&mut self, today: NaiveDate) {
        self.state.tick_study_time(today);
        debug!(
            "study time {} min, streak {}",
            self.state.study_stats.study_time, self.state.study_stats.study_streak
        );
        self.persist();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.state.toggle_theme();
        self.persist();
        theme
    }

    // ── Per-quiz summaries ───────────────────────────────────────────────

    pub fn quiz_summary(&self, quiz_id: &str) -> QuizSummary {
        self.summaries
            .get(quiz_id)
            .copied()
            .unwrap_or_else(|| repo::load_quiz_summary(&self.store, quiz_id))
    }

    /// Fold one more completion into the quiz's summary and persist it.
    pub fn record_quiz_summary(&mut self, quiz_id: &str, percentage: u32) -> QuizSummary {
        let summary = self.quiz_summary(quiz_id).with_attempt(percentage);
        self.summaries.insert(quiz_id.to_string(), summary);
        if let Err(e) = repo::save_quiz_summary(&mut self.store, quiz_id, &summary) {
            warn!("could not save summary for quiz {quiz_id}: {e}");
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::SqliteStore;
    use crate::storage::kv::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn result(time_spent: u64) -> QuizResult {
        QuizResult {
            id: "quiz_1".into(),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            quiz_id: "hs-essentials".into(),
            score: 3,
            total: 4,
            accuracy: 75,
            time_spent,
            answers: Vec::new(),
        }
    }

    #[test]
    fn toggling_a_bookmark_twice_restores_membership() {
        let mut state = StudyState::default();
        state.toggle_bookmark("lucid");
        let before = state.bookmarked_words.clone();

        assert!(state.toggle_bookmark("abate"));
        assert!(!state.toggle_bookmark("abate"));
        assert_eq!(state.bookmarked_words, before);

        assert!(!state.toggle_bookmark("lucid"));
        assert!(state.toggle_bookmark("lucid"));
        assert_eq!(state.bookmarked_words, before);
    }

    #[test]
    fn mastery_stays_within_bounds() {
        let mut state = StudyState::default();
        for _ in 0..12 {
            assert!(state.increase_mastery("abate") <= MAX_MASTERY);
        }
        assert_eq!(state.mastery_level("abate"), 5);

        for _ in 0..12 {
            state.adjust_mastery_by_result("abate", false);
        }
        assert_eq!(state.mastery_level("abate"), 0);

        assert_eq!(state.set_mastery("zeal", 99), 5);
        assert_eq!(state.set_mastery("zeal", -3), 0);
    }

    #[test]
    fn quiz_adjustment_moves_one_level_each_way() {
        let mut state = StudyState::default();
        assert_eq!(state.adjust_mastery_by_result("candid", true), 1);
        assert_eq!(state.adjust_mastery_by_result("candid", true), 2);
        assert_eq!(state.adjust_mastery_by_result("candid", false), 1);
        state.set_mastery("candid", 5);
        assert_eq!(state.adjust_mastery_by_result("candid", true), 5);
    }

    #[test]
    fn go_to_card_saturates_at_the_boundaries() {
        let mut state = StudyState::default();
        assert_eq!(state.go_to_card(-7, 5), 0);
        assert_eq!(state.go_to_card(50, 5), 4);
        assert_eq!(state.go_to_card(2, 5), 2);
        assert_eq!(state.go_to_card(3, 0), 0);
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let mut state = StudyState::default();
        assert_eq!(state.prev_card(5), 4);
        assert_eq!(state.next_card(5), 0);
        state.go_to_card(4, 5);
        assert_eq!(state.next_card(5), 0);
        assert_eq!(state.next_card(0), 0);
    }

    #[test]
    fn studied_cards_are_a_set() {
        let mut state = StudyState::default();
        assert!(state.record_card_studied("abate"));
        assert!(!state.record_card_studied("abate"));
        assert_eq!(state.study_stats.cards_studied.len(), 1);
    }

    #[test]
    fn streak_increments_after_exactly_one_day() {
        let mut state = StudyState::default();
        state.study_stats.last_study_date = Some(day(2024, 5, 1));
        state.study_stats.study_streak = 4;

        state.tick_study_time(day(2024, 5, 2));
        assert_eq!(state.study_stats.study_streak, 5);
        assert_eq!(state.study_stats.last_study_date, Some(day(2024, 5, 2)));
        assert_eq!(state.study_stats.study_time, 1);
    }

    #[test]
    fn streak_resets_after_a_gap() {
        let mut state = StudyState::default();
        state.study_stats.last_study_date = Some(day(2024, 5, 1));
        state.study_stats.study_streak = 4;

        state.tick_study_time(day(2024, 5, 4));
        assert_eq!(state.study_stats.study_streak, 1);
    }

    #[test]
    fn streak_is_unchanged_within_a_day() {
        let mut state = StudyState::default();
        let today = day(2024, 5, 1);
        state.tick_study_time(today);
        assert_eq!(state.study_stats.study_streak, 1);
        for _ in 0..30 {
            state.tick_study_time(today);
        }
        assert_eq!(state.study_stats.study_streak, 1);
        assert_eq!(state.study_stats.study_time, 31);
    }

    #[test]
    fn streak_ignores_a_clock_moving_backwards() {
        let mut state = StudyState::default();
        state.study_stats.last_study_date = Some(day(2024, 5, 10));
        state.study_stats.study_streak = 3;

        state.tick_study_time(day(2024, 5, 8));
        assert_eq!(state.study_stats.study_streak, 3);
        assert_eq!(state.study_stats.last_study_date, Some(day(2024, 5, 10)));
    }

    #[test]
    fn quiz_result_adds_whole_minutes_and_marks_the_day() {
        let mut state = StudyState::default();
        state.record_quiz_result(result(179), day(2024, 5, 1));

        assert_eq!(state.study_stats.quiz_scores.len(), 1);
        assert_eq!(state.study_stats.study_time, 2);
        assert_eq!(state.study_stats.last_study_date, Some(day(2024, 5, 1)));
    }

    #[test]
    fn every_mutation_is_written_through() {
        let mut study = StudyStore::open(SqliteStore::in_memory().unwrap(), 5);
        study.toggle_bookmark("abate");
        study.increase_mastery("abate");
        study.next_card();
        study.tick_study_time(day(2024, 5, 1));

        let reopened = StudyStore::open(study.into_store(), 5);
        let state = reopened.state();
        assert!(state.is_bookmarked("abate"));
        assert_eq!(state.mastery_level("abate"), 1);
        assert_eq!(state.current_card_index, 1);
        assert_eq!(state.study_stats.study_time, 1);
    }

    #[test]
    fn write_failures_keep_the_in_memory_state() {
        let mut study = StudyStore::open(MemoryStore::failing(), 5);
        assert!(study.toggle_bookmark("abate"));
        study.set_mastery("abate", 3);

        assert!(study.state().is_bookmarked("abate"));
        assert_eq!(study.state().mastery_level("abate"), 3);
        assert!(study.store().is_empty());

        let summary = study.record_quiz_summary("q", 80);
        assert_eq!(summary.attempts, 1);
        assert_eq!(study.quiz_summary("q"), summary);
    }

    #[test]
    fn restored_index_is_clamped_to_the_vocabulary() {
        let mut store = MemoryStore::new();
        let state = StudyState {
            current_card_index: 40,
            ..StudyState::default()
        };
        repo::save_state(&mut store, &state).unwrap();

        let study = StudyStore::open(store, 10);
        assert_eq!(study.state().current_card_index, 9);
    }

    #[test]
    fn summaries_accumulate_best_and_average() {
        let mut study = StudyStore::open(SqliteStore::in_memory().unwrap(), 5);
        assert_eq!(study.quiz_summary("hs-essentials"), QuizSummary::default());

        let first = study.record_quiz_summary("hs-essentials", 72);
        assert_eq!((first.attempts, first.best, first.average), (1, 72, 72));

        let second = study.record_quiz_summary("hs-essentials", 50);
        assert_eq!((second.attempts, second.best, second.average), (2, 72, 61));

        let reopened = StudyStore::open(study.into_store(), 5);
        assert_eq!(reopened.quiz_summary("hs-essentials"), second);
    }

    #[test]
    fn a_week_of_daily_ticks_builds_a_streak() {
        let mut state = StudyState::default();
        let start = day(2024, 5, 1);
        for offset in 0..7 {
            state.tick_study_time(start + Duration::days(offset));
        }
        assert_eq!(state.study_stats.study_streak, 7);
    }
}
