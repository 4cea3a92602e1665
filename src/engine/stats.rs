//! Dashboard and progress metrics derived on demand from a [`StudyState`].
//!
//! Nothing here is cached or persisted. Every ratio is defined as 0 when its
//! denominator is 0.

use serde::Serialize;

use crate::model::{MAX_MASTERY, QuizSummary, StudyState, VocabularyEntry};

/// `num / den` rounded half up; 0 when `den` is 0.
pub fn div_round(num: u64, den: u64) -> u64 {
    if den == 0 {
        return 0;
    }
    (2 * num + den) / (2 * den)
}

/// Rounded percentage of `part` in `whole`.
pub fn percentage(part: usize, whole: usize) -> u32 {
    div_round(100 * part as u64, whole as u64) as u32
}

/// Words at the top mastery level, alphabetically.
pub fn mastered_words(state: &StudyState) -> Vec<&str> {
    state
        .mastered_words
        .iter()
        .filter(|&(_, &level)| level >= MAX_MASTERY)
        .map(|(word, _)| word.as_str())
        .collect()
}

pub fn mastered_count(state: &StudyState) -> usize {
    state
        .mastered_words
        .values()
        .filter(|&&level| level >= MAX_MASTERY)
        .count()
}

pub fn mastered_percentage(state: &StudyState, total_words: usize) -> u32 {
    percentage(mastered_count(state), total_words)
}

pub fn bookmarked_percentage(state: &StudyState, total_words: usize) -> u32 {
    percentage(state.bookmarked_words.len(), total_words)
}

pub fn average_quiz_accuracy(state: &StudyState) -> u32 {
    let scores = &state.study_stats.quiz_scores;
    let sum: u64 = scores.iter().map(|r| r.accuracy as u64).sum();
    div_round(sum, scores.len() as u64) as u32
}

/// Count of vocabulary words at each mastery level 0..=5.
pub fn mastery_distribution(state: &StudyState, vocabulary: &[VocabularyEntry]) -> [usize; 6] {
    let mut buckets = [0usize; 6];
    for entry in vocabulary {
        let level = state.mastery_level(&entry.word).min(MAX_MASTERY);
        buckets[level as usize] += 1;
    }
    buckets
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Achievement {
    NoviceLearner,
    DedicatedStudent,
    WordMaster,
    OnFire,
}

impl Achievement {
    /// Display order.
    pub const ALL: [Achievement; 4] = [
        Achievement::NoviceLearner,
        Achievement::DedicatedStudent,
        Achievement::WordMaster,
        Achievement::OnFire,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Achievement::NoviceLearner => "Novice Learner",
            Achievement::DedicatedStudent => "Dedicated Student",
            Achievement::WordMaster => "Word Master",
            Achievement::OnFire => "On Fire!",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::NoviceLearner => "Studied 10+ words",
            Achievement::DedicatedStudent => "Studied 40+ words",
            Achievement::WordMaster => "Mastered 5+ words",
            Achievement::OnFire => "3-day study streak",
        }
    }

    pub fn is_earned(self, state: &StudyState) -> bool {
        let studied = state.study_stats.cards_studied.len();
        match self {
            Achievement::NoviceLearner => studied >= 10,
            Achievement::DedicatedStudent => studied >= 40,
            Achievement::WordMaster => mastered_count(state) >= 5,
            Achievement::OnFire => state.study_stats.study_streak >= 3,
        }
    }
}

/// Every achievement the state qualifies for, in display order.
pub fn achievements(state: &StudyState) -> Vec<Achievement> {
    Achievement::ALL
        .into_iter()
        .filter(|a| a.is_earned(state))
        .collect()
}

impl QuizSummary {
    /// Summary after one more completion scoring `percentage`.
    pub fn with_attempt(self, percentage: u32) -> QuizSummary {
        let attempts = self.attempts + 1;
        let total = self.average as u64 * self.attempts as u64 + percentage as u64;
        QuizSummary {
            attempts,
            best: self.best.max(percentage),
            average: div_round(total, attempts as u64) as u32,
        }
    }
}

/// Everything the dashboard and progress screens show at a glance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_words: usize,
    pub mastered_count: usize,
    pub mastered_percentage: u32,
    pub bookmarked_count: usize,
    pub bookmarked_percentage: u32,
    pub cards_studied: usize,
    pub total_flips: u64,
    pub study_time_minutes: u64,
    pub study_streak: u32,
    pub quizzes_taken: usize,
    pub average_quiz_accuracy: u32,
    pub mastery_distribution: [usize; 6],
    pub achievements: Vec<Achievement>,
}

pub fn dashboard(state: &StudyState, vocabulary: &[VocabularyEntry]) -> Dashboard {
    let total_words = vocabulary.len();
    let stats = &state.study_stats;
    Dashboard {
        total_words,
        mastered_count: mastered_count(state),
        mastered_percentage: mastered_percentage(state, total_words),
        bookmarked_count: state.bookmarked_words.len(),
        bookmarked_percentage: bookmarked_percentage(state, total_words),
        cards_studied: stats.cards_studied.len(),
        total_flips: stats.total_flips,
        study_time_minutes: stats.study_time,
        study_streak: stats.study_streak,
        quizzes_taken: stats.quiz_scores.len(),
        average_quiz_accuracy: average_quiz_accuracy(state),
        mastery_distribution: mastery_distribution(state, vocabulary),
        achievements: achievements(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuizResult};
    use chrono::Utc;

    fn vocab(n: usize) -> Vec<VocabularyEntry> {
        (0..n)
            .map(|i| VocabularyEntry {
                word: format!("word{i}"),
                part_of_speech: "noun".into(),
                difficulty: Difficulty::HighSchool,
                definition: format!("definition {i}"),
                example: String::new(),
                synonyms: Vec::new(),
                antonyms: Vec::new(),
            })
            .collect()
    }

    fn scored(accuracy: u32) -> QuizResult {
        QuizResult {
            id: format!("r{accuracy}"),
            date: Utc::now(),
            quiz_id: "q".into(),
            score: 0,
            total: 1,
            accuracy,
            time_spent: 0,
            answers: Vec::new(),
        }
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(div_round(122, 2), 61);
        assert_eq!(div_round(5, 2), 3);
    }

    #[test]
    fn empty_inputs_never_divide_by_zero() {
        let mut state = StudyState::default();
        state.bookmarked_words.insert("x".into());
        state.mastered_words.insert("x".into(), 5);

        assert_eq!(average_quiz_accuracy(&state), 0);
        assert_eq!(mastered_percentage(&state, 0), 0);
        assert_eq!(bookmarked_percentage(&state, 0), 0);

        let board = dashboard(&state, &[]);
        assert_eq!(board.mastery_distribution, [0; 6]);
        assert_eq!(board.total_words, 0);
    }

    #[test]
    fn percentages_over_the_vocabulary() {
        let words = vocab(8);
        let mut state = StudyState::default();
        state.mastered_words.insert("word0".into(), 5);
        state.mastered_words.insert("word1".into(), 4);
        state.bookmarked_words.insert("word2".into());
        state.bookmarked_words.insert("word3".into());
        state.bookmarked_words.insert("word4".into());

        assert_eq!(mastered_count(&state), 1);
        assert_eq!(mastered_percentage(&state, words.len()), 13);
        assert_eq!(bookmarked_percentage(&state, words.len()), 38);
    }

    #[test]
    fn average_accuracy_is_rounded_mean() {
        let mut state = StudyState::default();
        state.study_stats.quiz_scores = vec![scored(67), scored(100), scored(50)];
        assert_eq!(average_quiz_accuracy(&state), 72);
    }

    #[test]
    fn distribution_counts_every_word_once() {
        let words = vocab(10);
        let mut state = StudyState::default();
        state.mastered_words.insert("word0".into(), 5);
        state.mastered_words.insert("word1".into(), 5);
        state.mastered_words.insert("word2".into(), 3);
        state.mastered_words.insert("not-in-vocabulary".into(), 2);

        let dist = mastery_distribution(&state, &words);
        assert_eq!(dist, [7, 0, 0, 1, 0, 2]);
        assert_eq!(dist.iter().sum::<usize>(), words.len());
    }

    #[test]
    fn achievements_are_independent_thresholds() {
        let mut state = StudyState::default();
        assert!(achievements(&state).is_empty());

        for i in 0..40 {
            state.study_stats.cards_studied.insert(format!("word{i}"));
        }
        state.study_stats.study_streak = 3;
        assert_eq!(
            achievements(&state),
            vec![
                Achievement::NoviceLearner,
                Achievement::DedicatedStudent,
                Achievement::OnFire
            ]
        );

        for i in 0..5 {
            state.mastered_words.insert(format!("word{i}"), 5);
        }
        assert_eq!(achievements(&state), Achievement::ALL.to_vec());
    }

    #[test]
    fn summary_tracks_best_and_running_average() {
        let first = QuizSummary::default().with_attempt(72);
        assert_eq!(
            first,
            QuizSummary {
                attempts: 1,
                best: 72,
                average: 72
            }
        );
        let second = first.with_attempt(50);
        assert_eq!(
            second,
            QuizSummary {
                attempts: 2,
                best: 72,
                average: 61
            }
        );
    }
}
