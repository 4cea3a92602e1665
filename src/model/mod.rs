use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Highest mastery level a word can reach. Level 5 counts as "mastered".
pub const MAX_MASTERY: u8 = 5;

/// Difficulty tag of a vocabulary entry or quiz. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "HS")]
    HighSchool,
    #[serde(rename = "COL")]
    College,
    #[serde(rename = "ADV")]
    Advanced,
    #[serde(untagged)]
    Other(String),
}

impl Difficulty {
    pub fn code(&self) -> &str {
        match self {
            Difficulty::HighSchool => "HS",
            Difficulty::College => "COL",
            Difficulty::Advanced => "ADV",
            Difficulty::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Difficulty {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "HS" => Difficulty::HighSchool,
            "COL" => Difficulty::College,
            "ADV" => Difficulty::Advanced,
            _ => Difficulty::Other(s.trim().to_string()),
        })
    }
}

/// One word of the read-only vocabulary dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub word: String,
    #[serde(default, alias = "part_of_speech")]
    pub part_of_speech: String,
    pub difficulty: Difficulty,
    pub definition: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub antonyms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default, alias = "part_of_speech")]
    pub part_of_speech: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub question_type: Option<String>,
}

/// A named, fixed set of questions from the quiz catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
}

/// On-disk shape of the quiz catalog file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QuizCatalog {
    #[serde(default)]
    pub quizzes: Vec<QuizDefinition>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// How a quiz is played. `Mastery` plays exactly like `Normal`; only the
/// results screen treats a high score differently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Normal,
    Timed,
    Mastery,
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(QuizMode::Normal),
            "timed" => Ok(QuizMode::Timed),
            "mastery" => Ok(QuizMode::Mastery),
            other => Err(format!("unknown quiz mode '{other}' (normal, timed, mastery)")),
        }
    }
}

/// One answered question inside a finished quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question: String,
    #[serde(default)]
    pub word: Option<String>,
    pub selected_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    /// Milliseconds spent on this question.
    #[serde(rename = "timeSpent", default)]
    pub time_spent_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: String,
    pub date: DateTime<Utc>,
    pub quiz_id: String,
    pub score: u32,
    pub total: u32,
    /// Rounded percentage of `score / total`.
    pub accuracy: u32,
    /// Whole seconds from quiz start to completion.
    pub time_spent: u64,
    #[serde(default)]
    pub answers: Vec<AnsweredQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub cards_studied: BTreeSet<String>,
    pub total_flips: u64,
    /// Accumulated minutes.
    pub study_time: u64,
    pub last_study_date: Option<NaiveDate>,
    pub study_streak: u32,
    pub quiz_scores: Vec<QuizResult>,
}

/// The learner's complete, persisted progress record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyState {
    pub current_card_index: usize,
    pub bookmarked_words: BTreeSet<String>,
    pub mastered_words: BTreeMap<String, u8>,
    pub study_stats: StudyStats,
    pub theme: Theme,
}

/// Running totals kept per quiz definition, persisted outside the study record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub attempts: u32,
    pub best: u32,
    pub average: u32,
}

/// What the CLI prints when listing the catalog.
#[derive(Debug, Serialize)]
pub struct QuizListing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub questions: usize,
    pub summary: QuizSummary,
}
