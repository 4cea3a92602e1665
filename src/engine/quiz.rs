//! Quiz runner: the `Idle → Configuring → InProgress → Completed` state
//! machine, scoring and finalization into the study record.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use rand::Rng;
use rand::distr::Alphanumeric;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::engine::stats::{div_round, percentage};
use crate::engine::study::StudyStore;
use crate::engine::timer::{Countdown, TIMED_QUIZ_SECONDS};
use crate::error::AppError;
use crate::model::{
    AnsweredQuestion, QuizDefinition, QuizMode, QuizQuestion, QuizResult, QuizSummary,
};
use crate::storage::kv::KeyValueStore;

/// Percentage at which a mastery-mode result is highlighted.
pub const MASTERY_THRESHOLD: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PerformanceBand {
    Outstanding,
    Great,
    Good,
    KeepPracticing,
}

impl PerformanceBand {
    pub fn for_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => PerformanceBand::Outstanding,
            70..=89 => PerformanceBand::Great,
            50..=69 => PerformanceBand::Good,
            _ => PerformanceBand::KeepPracticing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceBand::Outstanding => "Outstanding!",
            PerformanceBand::Great => "Great Job!",
            PerformanceBand::Good => "Good Effort!",
            PerformanceBand::KeepPracticing => "Keep Practicing!",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            PerformanceBand::Outstanding => "green",
            PerformanceBand::Great => "blue",
            PerformanceBand::Good => "cyan",
            PerformanceBand::KeepPracticing => "yellow",
        }
    }
}

/// Which answers a results review shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnswerFilter {
    #[default]
    All,
    Correct,
    Incorrect,
}

impl FromStr for AnswerFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(AnswerFilter::All),
            "correct" => Ok(AnswerFilter::Correct),
            "incorrect" => Ok(AnswerFilter::Incorrect),
            other => Err(format!("unknown answer filter '{other}' (all, correct, incorrect)")),
        }
    }
}

impl AnswerFilter {
    pub fn matches(self, answer: &AnsweredQuestion) -> bool {
        match self {
            AnswerFilter::All => true,
            AnswerFilter::Correct => answer.is_correct,
            AnswerFilter::Incorrect => !answer.is_correct,
        }
    }
}

/// Shuffled copy of the questions, each with its options shuffled too.
pub fn shuffle_questions<R: Rng + ?Sized>(
    questions: &[QuizQuestion],
    rng: &mut R,
) -> Vec<QuizQuestion> {
    let mut shuffled = questions.to_vec();
    shuffled.shuffle(rng);
    for question in &mut shuffled {
        question.options.shuffle(rng);
    }
    shuffled
}

/// `quiz_<millis>_<9 random lowercase alphanumerics>`.
fn result_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("quiz_{}_{suffix}", now.timestamp_millis())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub answer: String,
    pub is_correct: bool,
}

/// One attempt in progress. Never persisted.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: QuizDefinition,
    mode: QuizMode,
    questions: Vec<QuizQuestion>,
    current: usize,
    score: u32,
    selection: Option<Selection>,
    answers: Vec<AnsweredQuestion>,
    started_at: DateTime<Utc>,
    last_mark: DateTime<Utc>,
    countdown: Option<Countdown>,
}

impl QuizSession {
    fn new<R: Rng + ?Sized>(
        quiz: QuizDefinition,
        mode: QuizMode,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        if quiz.questions.is_empty() {
            return Err(AppError::EmptyQuiz(quiz.id));
        }
        let questions = shuffle_questions(&quiz.questions, rng);
        let countdown =
            (mode == QuizMode::Timed).then(|| Countdown::starting_at(now, TIMED_QUIZ_SECONDS));
        Ok(Self {
            quiz,
            mode,
            questions,
            current: 0,
            score: 0,
            selection: None,
            answers: Vec::new(),
            started_at: now,
            last_mark: now,
            countdown,
        })
    }

    pub fn quiz(&self) -> &QuizDefinition {
        &self.quiz
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &QuizQuestion {
        &self.questions[self.current]
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn answers(&self) -> &[AnsweredQuestion] {
        &self.answers
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds left on a timed quiz; `None` in untimed modes.
    pub fn time_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.countdown.map(|c| c.remaining_secs(now))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.countdown.is_some_and(|c| c.is_expired(now))
    }

    /// Percent of the quiz reached, counting the current question.
    pub fn progress(&self) -> u32 {
        percentage(self.current + 1, self.questions.len())
    }
}

/// A finished attempt, as shown on the results screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutcome {
    pub result: QuizResult,
    pub percentage: u32,
    pub band: PerformanceBand,
    pub mode: QuizMode,
    pub mastery_worthy: bool,
    pub timed_out: bool,
    /// Questions never reached before the countdown ran out.
    pub unanswered: usize,
    pub summary: QuizSummary,
}

impl QuizOutcome {
    pub fn answers(&self, filter: AnswerFilter) -> Vec<&AnsweredQuestion> {
        self.result
            .answers
            .iter()
            .filter(|a| filter.matches(a))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    Configuring,
    InProgress,
    Completed,
}

/// What `advance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing selected yet, or the quiz already finished.
    Ignored,
    /// Moved on to the question at this index.
    Next(usize),
    Completed,
}

#[derive(Debug, Clone, Default)]
enum Phase {
    #[default]
    Idle,
    Configuring {
        quiz: QuizDefinition,
        mode: QuizMode,
    },
    InProgress(Box<QuizSession>),
    Completed {
        quiz: QuizDefinition,
        outcome: Box<QuizOutcome>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct QuizRunner {
    phase: Phase,
}

impl QuizRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> QuizPhase {
        match self.phase {
            Phase::Idle => QuizPhase::Idle,
            Phase::Configuring { .. } => QuizPhase::Configuring,
            Phase::InProgress(_) => QuizPhase::InProgress,
            Phase::Completed { .. } => QuizPhase::Completed,
        }
    }

    /// Pick a quiz. Any session in progress is discarded along with its
    /// countdown.
    pub fn select_quiz(&mut self, quiz: QuizDefinition) {
        self.phase = Phase::Configuring {
            quiz,
            mode: QuizMode::Normal,
        };
    }

    pub fn set_mode(&mut self, mode: QuizMode) -> Result<(), AppError> {
        match &mut self.phase {
            Phase::Configuring { mode: current, .. } => {
                *current = mode;
                Ok(())
            }
            _ => Err(AppError::InvalidTransition("mode can only be chosen before starting")),
        }
    }

    pub fn start<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<&QuizSession, AppError> {
        let Phase::Configuring { quiz, mode } = &self.phase else {
            return Err(AppError::InvalidTransition("select a quiz before starting"));
        };
        let session = QuizSession::new(quiz.clone(), *mode, rng, now)?;
        self.phase = Phase::InProgress(Box::new(session));
        self.session()
            .ok_or(AppError::InvalidTransition("quiz did not start"))
    }

    pub fn session(&self) -> Option<&QuizSession> {
        match &self.phase {
            Phase::InProgress(session) => Some(session),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&QuizOutcome> {
        match &self.phase {
            Phase::Completed { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// Record the answer to the current question. The first selection is
    /// final: later calls return `None` until `advance`. Answers arriving
    /// after a timed quiz's deadline are refused.
    pub fn select_answer(&mut self, option: &str, now: DateTime<Utc>) -> Option<bool> {
        let Phase::InProgress(session) = &mut self.phase else {
            return None;
        };
        if session.selection.is_some() || session.is_expired(now) {
            return None;
        }
        let is_correct = option == session.current_question().correct_answer;
        session.selection = Some(Selection {
            answer: option.to_string(),
            is_correct,
        });
        Some(is_correct)
    }

    /// Commit the current selection and move on. Mastery of the question's
    /// word is adjusted right away.
    pub fn advance<S: KeyValueStore>(
        &mut self,
        study: &mut StudyStore<S>,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Advance, AppError> {
        let session = match &mut self.phase {
            Phase::InProgress(session) => &mut **session,
            Phase::Completed { .. } => return Ok(Advance::Ignored),
            _ => return Err(AppError::InvalidTransition("no quiz in progress")),
        };

        if session.is_expired(now) {
            self.finish(study, now, today, true);
            return Ok(Advance::Completed);
        }
        let Some(selection) = session.selection.take() else {
            return Ok(Advance::Ignored);
        };

        let question = &session.questions[session.current];
        let elapsed = (now - session.last_mark).num_milliseconds().max(0) as u64;
        session.last_mark = now;
        if selection.is_correct {
            session.score += 1;
        }
        if let Some(word) = &question.word {
            study.adjust_mastery_by_result(word, selection.is_correct);
        }
        session.answers.push(AnsweredQuestion {
            question: question.question.clone(),
            word: question.word.clone(),
            selected_answer: selection.answer,
            correct_answer: question.correct_answer.clone(),
            is_correct: selection.is_correct,
            time_spent_ms: elapsed,
        });

        if session.current + 1 < session.questions.len() {
            session.current += 1;
            Ok(Advance::Next(session.current))
        } else {
            self.finish(study, now, today, false);
            Ok(Advance::Completed)
        }
    }

    /// Force completion once a timed quiz runs out. Returns true if it did.
    pub fn poll_deadline<S: KeyValueStore>(
        &mut self,
        study: &mut StudyStore<S>,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> bool {
        let expired = matches!(&self.phase, Phase::InProgress(session) if session.is_expired(now));
        if expired {
            self.finish(study, now, today, true);
        }
        expired
    }

    /// Fresh shuffle of the finished quiz in the same mode. Earlier results
    /// stay in the history.
    pub fn retake<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<&QuizSession, AppError> {
        let Phase::Completed { quiz, outcome } = &self.phase else {
            return Err(AppError::InvalidTransition("only a finished quiz can be retaken"));
        };
        self.phase = Phase::Configuring {
            quiz: quiz.clone(),
            mode: outcome.mode,
        };
        self.start(rng, now)
    }

    /// Leave the current quiz without recording anything.
    pub fn back_to_selection(&mut self) {
        self.phase = Phase::Idle;
    }

    fn finish<S: KeyValueStore>(
        &mut self,
        study: &mut StudyStore<S>,
        now: DateTime<Utc>,
        today: NaiveDate,
        timed_out: bool,
    ) {
        let Phase::InProgress(session) = std::mem::take(&mut self.phase) else {
            return;
        };
        let QuizSession {
            quiz,
            mode,
            questions,
            score,
            answers,
            started_at,
            ..
        } = *session;

        // A timed-out attempt is scored over the questions actually answered.
        let answered = answers.len();
        let total = if timed_out && answered > 0 {
            answered
        } else {
            questions.len()
        };
        let percentage = percentage(score as usize, total);
        let elapsed_ms = (now - started_at).num_milliseconds().max(0) as u64;

        let result = QuizResult {
            id: result_id(now),
            date: now,
            quiz_id: quiz.id.clone(),
            score,
            total: total as u32,
            accuracy: percentage,
            time_spent: div_round(elapsed_ms, 1000),
            answers,
        };
        study.record_quiz_result(result.clone(), today);
        let summary = study.record_quiz_summary(&quiz.id, percentage);
        info!(
            "quiz {} completed: {}/{} ({}%){}",
            quiz.id,
            score,
            total,
            percentage,
            if timed_out { ", timed out" } else { "" }
        );

        let outcome = QuizOutcome {
            result,
            percentage,
            band: PerformanceBand::for_percentage(percentage),
            mode,
            mastery_worthy: mode == QuizMode::Mastery && percentage >= MASTERY_THRESHOLD,
            timed_out,
            unanswered: questions.len() - answered,
            summary,
        };
        self.phase = Phase::Completed {
            quiz,
            outcome: Box::new(outcome),
        };
    }
}
