//! Word list browsing: search, filters and the word of the day.

use std::str::FromStr;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::{Difficulty, MAX_MASTERY, StudyState, VocabularyEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WordStatus {
    #[default]
    All,
    Bookmarked,
    Mastered,
    Unmastered,
}

impl FromStr for WordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(WordStatus::All),
            "bookmarked" => Ok(WordStatus::Bookmarked),
            "mastered" => Ok(WordStatus::Mastered),
            "unmastered" => Ok(WordStatus::Unmastered),
            other => Err(format!(
                "unknown status '{other}' (all, bookmarked, mastered, unmastered)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WordQuery {
    pub search: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub status: WordStatus,
}

/// Lowercase with accents stripped, so "Naïve" matches "naive".
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn status_matches(status: WordStatus, entry: &VocabularyEntry, state: &StudyState) -> bool {
    let level = state.mastery_level(&entry.word);
    match status {
        WordStatus::All => true,
        WordStatus::Bookmarked => state.is_bookmarked(&entry.word),
        WordStatus::Mastered => level >= MAX_MASTERY,
        WordStatus::Unmastered => level < MAX_MASTERY,
    }
}

/// Entries matching every part of the query, in vocabulary order. The search
/// text is matched against both the word and its definition.
pub fn filter_words<'v>(
    vocabulary: &'v [VocabularyEntry],
    state: &StudyState,
    query: &WordQuery,
) -> Vec<&'v VocabularyEntry> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(fold);

    vocabulary
        .iter()
        .filter(|entry| {
            query
                .difficulty
                .as_ref()
                .is_none_or(|d| entry.difficulty == *d)
        })
        .filter(|entry| status_matches(query.status, entry, state))
        .filter(|entry| {
            needle.as_deref().is_none_or(|needle| {
                fold(&entry.word).contains(needle) || fold(&entry.definition).contains(needle)
            })
        })
        .collect()
}

pub fn word_of_the_day<'v, R: Rng + ?Sized>(
    vocabulary: &'v [VocabularyEntry],
    rng: &mut R,
) -> Option<&'v VocabularyEntry> {
    vocabulary.choose(rng)
}

/// A vocabulary entry with the learner's progress on it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRow<'v> {
    #[serde(flatten)]
    pub entry: &'v VocabularyEntry,
    pub bookmarked: bool,
    pub mastery: u8,
}

impl<'v> WordRow<'v> {
    pub fn new(entry: &'v VocabularyEntry, state: &StudyState) -> Self {
        Self {
            entry,
            bookmarked: state.is_bookmarked(&entry.word),
            mastery: state.mastery_level(&entry.word),
        }
    }
}
