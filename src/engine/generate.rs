//! Vocabulary-driven quizzes: pool filtering and distractor generation.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::error::AppError;
use crate::model::{
    Difficulty, MAX_MASTERY, QuizDefinition, QuizQuestion, StudyState, VocabularyEntry,
};

/// Smallest pool a multiple-choice question can be built from.
pub const MIN_POOL_SIZE: usize = 4;

pub const DISTRACTORS_PER_QUESTION: usize = 3;

pub const GENERATED_QUIZ_ID: &str = "vocabulary-practice";

/// Options for `correct`: up to three distinct other definitions from the
/// pool plus the correct one, shuffled.
pub fn build_options<R: Rng + ?Sized>(
    correct: &str,
    pool: &[&VocabularyEntry],
    rng: &mut R,
) -> Result<Vec<String>, AppError> {
    if pool.len() < MIN_POOL_SIZE {
        return Err(AppError::InsufficientPool {
            needed: MIN_POOL_SIZE,
            available: pool.len(),
        });
    }

    let mut candidates: Vec<&str> = Vec::new();
    for entry in pool {
        let definition = entry.definition.as_str();
        if definition != correct && !candidates.contains(&definition) {
            candidates.push(definition);
        }
    }

    let mut options: Vec<String> = candidates
        .choose_multiple(rng, DISTRACTORS_PER_QUESTION)
        .map(|d| d.to_string())
        .collect();
    options.push(correct.to_string());
    options.shuffle(rng);
    Ok(options)
}

/// Which vocabulary entries a generated quiz draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolFilter {
    pub difficulty: Option<Difficulty>,
    pub bookmarked_only: bool,
    pub unmastered_only: bool,
}

impl PoolFilter {
    pub fn matches(&self, entry: &VocabularyEntry, state: &StudyState) -> bool {
        if let Some(difficulty) = &self.difficulty
            && entry.difficulty != *difficulty
        {
            return false;
        }
        if self.bookmarked_only && !state.is_bookmarked(&entry.word) {
            return false;
        }
        !(self.unmastered_only && state.mastery_level(&entry.word) >= MAX_MASTERY)
    }

    pub fn pool<'v>(
        &self,
        vocabulary: &'v [VocabularyEntry],
        state: &StudyState,
    ) -> Vec<&'v VocabularyEntry> {
        vocabulary
            .iter()
            .filter(|entry| self.matches(entry, state))
            .collect()
    }

    fn describe(&self) -> String {
        let mut parts = vec![match &self.difficulty {
            Some(d) => format!("{d} words"),
            None => "all words".to_string(),
        }];
        if self.bookmarked_only {
            parts.push("bookmarked".into());
        }
        if self.unmastered_only {
            parts.push("not yet mastered".into());
        }
        parts.join(", ")
    }
}

/// Build a definition-matching quiz of up to `question_count` questions from
/// the filtered pool.
pub fn build_vocabulary_quiz<R: Rng + ?Sized>(
    vocabulary: &[VocabularyEntry],
    state: &StudyState,
    filter: &PoolFilter,
    question_count: usize,
    rng: &mut R,
) -> Result<QuizDefinition, AppError> {
    let pool = filter.pool(vocabulary, state);
    if pool.len() < MIN_POOL_SIZE {
        return Err(AppError::InsufficientPool {
            needed: MIN_POOL_SIZE,
            available: pool.len(),
        });
    }

    let count = question_count.clamp(1, pool.len());
    let targets: Vec<&VocabularyEntry> = pool.choose_multiple(rng, count).copied().collect();

    let mut questions = Vec::with_capacity(targets.len());
    for entry in targets {
        questions.push(QuizQuestion {
            question: format!("What does \"{}\" mean?", entry.word),
            word: Some(entry.word.clone()),
            part_of_speech: (!entry.part_of_speech.is_empty())
                .then(|| entry.part_of_speech.clone()),
            options: build_options(&entry.definition, &pool, rng)?,
            correct_answer: entry.definition.clone(),
            question_type: Some("definition".into()),
        });
    }

    Ok(QuizDefinition {
        id: GENERATED_QUIZ_ID.to_string(),
        title: "Vocabulary Practice".to_string(),
        description: format!("{} questions from {}", questions.len(), filter.describe()),
        difficulty: filter
            .difficulty
            .clone()
            .unwrap_or_else(|| Difficulty::Other("MIXED".into())),
        questions,
    })
}
