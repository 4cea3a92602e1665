pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod storage;

use std::path::Path;

use chrono::{Local, NaiveDate};
use rand::Rng;

use engine::export::ExportKind;
use engine::flashcards::FlashcardNavigator;
use engine::generate::{self, PoolFilter};
use engine::stats::{self, Dashboard};
use engine::study::StudyStore;
use engine::words::{self, WordQuery, WordRow};
use error::AppError;
use model::{QuizDefinition, QuizListing, StudyState, Theme, VocabularyEntry};
use storage::SqliteStore;

/// Main entry point for the vocab-master library.
///
/// Owns the read-only datasets and the learner's study record, which is
/// written through to SQLite after every change. Used by both binaries.
pub struct VocabMaster {
    vocabulary: Vec<VocabularyEntry>,
    quizzes: Vec<QuizDefinition>,
    study: StudyStore<SqliteStore>,
}

impl VocabMaster {
    /// Open (or create) a database at the given path and restore the study record.
    pub fn open(
        db_path: &Path,
        vocabulary: Vec<VocabularyEntry>,
        quizzes: Vec<QuizDefinition>,
    ) -> Result<Self, AppError> {
        let store = SqliteStore::open(db_path)?;
        Ok(Self::with_store(store, vocabulary, quizzes))
    }

    /// Open an in-memory database (useful for testing).
    pub fn in_memory(
        vocabulary: Vec<VocabularyEntry>,
        quizzes: Vec<QuizDefinition>,
    ) -> Result<Self, AppError> {
        let store = SqliteStore::in_memory()?;
        Ok(Self::with_store(store, vocabulary, quizzes))
    }

    fn with_store(
        store: SqliteStore,
        vocabulary: Vec<VocabularyEntry>,
        quizzes: Vec<QuizDefinition>,
    ) -> Self {
        let study = StudyStore::open(store, vocabulary.len());
        Self {
            vocabulary,
            quizzes,
            study,
        }
    }

    /// The learner's local calendar day, used for streaks.
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn vocabulary(&self) -> &[VocabularyEntry] {
        &self.vocabulary
    }

    pub fn quizzes(&self) -> &[QuizDefinition] {
        &self.quizzes
    }

    pub fn state(&self) -> &StudyState {
        self.study.state()
    }

    pub fn study_mut(&mut self) -> &mut StudyStore<SqliteStore> {
        &mut self.study
    }

    pub fn entry(&self, word: &str) -> Result<&VocabularyEntry, AppError> {
        self.vocabulary
            .iter()
            .find(|e| e.word == word)
            .ok_or_else(|| AppError::UnknownWord(word.to_string()))
    }

    // ── Words ────────────────────────────────────────────────────────────

    pub fn toggle_bookmark(&mut self, word: &str) -> Result<bool, AppError> {
        self.entry(word)?;
        Ok(self.study.toggle_bookmark(word))
    }

    pub fn set_mastery(&mut self, word: &str, level: i64) -> Result<u8, AppError> {
        self.entry(word)?;
        Ok(self.study.set_mastery(word, level))
    }

    pub fn increase_mastery(&mut self, word: &str) -> Result<u8, AppError> {
        self.entry(word)?;
        Ok(self.study.increase_mastery(word))
    }

    pub fn words(&self, query: &WordQuery) -> Vec<WordRow<'_>> {
        words::filter_words(&self.vocabulary, self.study.state(), query)
            .into_iter()
            .map(|entry| WordRow::new(entry, self.study.state()))
            .collect()
    }

    pub fn word_of_the_day<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&VocabularyEntry> {
        words::word_of_the_day(&self.vocabulary, rng)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.study.toggle_theme()
    }

    // ── Flashcards ───────────────────────────────────────────────────────

    pub fn current_card(&self) -> Option<&VocabularyEntry> {
        FlashcardNavigator::new(&self.vocabulary).current(&self.study)
    }

    pub fn next_card(&mut self) -> Option<&VocabularyEntry> {
        FlashcardNavigator::new(&self.vocabulary).next(&mut self.study)
    }

    pub fn prev_card(&mut self) -> Option<&VocabularyEntry> {
        FlashcardNavigator::new(&self.vocabulary).prev(&mut self.study)
    }

    pub fn go_to_card(&mut self, index: i64) -> Option<&VocabularyEntry> {
        FlashcardNavigator::new(&self.vocabulary).go_to(&mut self.study, index)
    }

    /// Reveal the back of the current card.
    pub fn flip_card(&mut self) -> Option<&VocabularyEntry> {
        let mut deck = FlashcardNavigator::new(&self.vocabulary);
        deck.flip(&mut self.study);
        deck.current(&self.study)
    }

    // ── Progress ─────────────────────────────────────────────────────────

    pub fn dashboard(&self) -> Dashboard {
        stats::dashboard(self.study.state(), &self.vocabulary)
    }

    pub fn export(&self, kind: ExportKind) -> String {
        kind.render(self.study.state())
    }

    // ── Quizzes ──────────────────────────────────────────────────────────

    pub fn quiz(&self, id: &str) -> Result<&QuizDefinition, AppError> {
        self.quizzes
            .iter()
            .find(|q| q.id == id)
            .ok_or_else(|| AppError::UnknownQuiz(id.to_string()))
    }

    /// The catalog with each quiz's attempts, best and average.
    pub fn quiz_listings(&self) -> Vec<QuizListing> {
        self.quizzes
            .iter()
            .map(|quiz| QuizListing {
                id: quiz.id.clone(),
                title: quiz.title.clone(),
                description: quiz.description.clone(),
                difficulty: quiz.difficulty.clone(),
                questions: quiz.questions.len(),
                summary: self.study.quiz_summary(&quiz.id),
            })
            .collect()
    }

    pub fn generate_quiz<R: Rng + ?Sized>(
        &self,
        filter: &PoolFilter,
        question_count: usize,
        rng: &mut R,
    ) -> Result<QuizDefinition, AppError> {
        generate::build_vocabulary_quiz(
            &self.vocabulary,
            self.study.state(),
            filter,
            question_count,
            rng,
        )
    }
}
