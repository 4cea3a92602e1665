//! Loading of the read-only datasets: the vocabulary and the quiz catalog.

use std::collections::HashSet;
use std::path::Path;

use log::warn;

use crate::error::AppError;
use crate::model::{QuizCatalog, QuizDefinition, VocabularyEntry};

pub fn load_vocabulary(path: &Path) -> Result<Vec<VocabularyEntry>, AppError> {
    let text = std::fs::read_to_string(path)?;
    parse_vocabulary(&text)
}

/// Parse a JSON array of entries. Words are unique keys, so a repeated word
/// keeps its first entry.
pub fn parse_vocabulary(text: &str) -> Result<Vec<VocabularyEntry>, AppError> {
    let entries: Vec<VocabularyEntry> = serde_json::from_str(text)?;
    let mut seen = HashSet::new();
    Ok(entries
        .into_iter()
        .filter(|entry| {
            let fresh = seen.insert(entry.word.clone());
            if !fresh {
                warn!("skipping duplicate vocabulary entry: {}", entry.word);
            }
            fresh
        })
        .collect())
}

pub fn load_quizzes(path: &Path) -> Result<Vec<QuizDefinition>, AppError> {
    let text = std::fs::read_to_string(path)?;
    parse_quizzes(&text)
}

pub fn parse_quizzes(text: &str) -> Result<Vec<QuizDefinition>, AppError> {
    let catalog: QuizCatalog = serde_json::from_str(text)?;
    for quiz in &catalog.quizzes {
        for q in &quiz.questions {
            if !q.options.contains(&q.correct_answer) {
                warn!(
                    "quiz {}: correct answer of {:?} is not among its options",
                    quiz.id, q.question
                );
            }
        }
    }
    Ok(catalog.quizzes)
}
