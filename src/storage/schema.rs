//! Persisted shape of the study record and the migration/merge step that turns
//! whatever is found in storage into a valid [`StudyState`].
//!
//! Loading never fails. Each top-level field (and each field of `studyStats`)
//! is recovered on its own, so one bad value only resets itself to its default.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::model::{MAX_MASTERY, QuizResult, StudyState, StudyStats};

/// Version written with every record.
pub const SCHEMA_VERSION: u64 = 2;

#[derive(Serialize)]
struct PersistedRecord<'a> {
    version: u64,
    #[serde(flatten)]
    state: &'a StudyState,
}

pub fn encode(state: &StudyState) -> Result<String, AppError> {
    Ok(serde_json::to_string(&PersistedRecord {
        version: SCHEMA_VERSION,
        state,
    })?)
}

pub fn decode(raw: &str) -> StudyState {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("stored study record is not valid JSON, starting fresh: {e}");
            return StudyState::default();
        }
    };

    match migrate(value) {
        Value::Object(record) => merge(&record),
        other => {
            warn!("stored study record is not an object ({other}), starting fresh");
            StudyState::default()
        }
    }
}

/// Bring an older record up to the current field names.
fn migrate(mut value: Value) -> Value {
    let version = value.get("version").and_then(Value::as_u64).unwrap_or(1);

    if version < 2
        && let Some(stats) = value.get_mut("studyStats").and_then(Value::as_object_mut)
        && !stats.contains_key("cardsStudied")
        && let Some(legacy) = stats.remove("cardStudied")
    {
        stats.insert("cardsStudied".to_string(), legacy);
    }

    value
}

fn merge(record: &Map<String, Value>) -> StudyState {
    StudyState {
        current_card_index: field(record, "currentCardIndex").unwrap_or_default(),
        bookmarked_words: word_set(record, "bookmarkedWords"),
        mastered_words: mastery_levels(record.get("masteredWords")),
        study_stats: match record.get("studyStats") {
            Some(Value::Object(stats)) => merge_stats(stats),
            Some(Value::Null) | None => StudyStats::default(),
            Some(other) => {
                warn!("ignoring malformed studyStats: {other}");
                StudyStats::default()
            }
        },
        theme: field(record, "theme").unwrap_or_default(),
    }
}

fn merge_stats(stats: &Map<String, Value>) -> StudyStats {
    StudyStats {
        cards_studied: word_set(stats, "cardsStudied"),
        total_flips: field(stats, "totalFlips").unwrap_or_default(),
        study_time: field(stats, "studyTime").unwrap_or_default(),
        last_study_date: stats.get("lastStudyDate").and_then(calendar_day),
        study_streak: field(stats, "studyStreak").unwrap_or_default(),
        quiz_scores: quiz_results(stats.get("quizScores")),
    }
}

fn field<T: DeserializeOwned>(record: &Map<String, Value>, key: &str) -> Option<T> {
    let value = record.get(key)?;
    if value.is_null() {
        return None;
    }
    match T::deserialize(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("ignoring malformed field {key}: {e}");
            None
        }
    }
}

/// Any array of strings becomes a set. Other shapes (a serialized native set
/// shows up as `{}`) read as empty.
fn word_set(record: &Map<String, Value>, key: &str) -> BTreeSet<String> {
    match record.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::Object(map)) if map.is_empty() => BTreeSet::new(),
        Some(Value::Null) | None => BTreeSet::new(),
        Some(other) => {
            warn!("ignoring malformed field {key}: expected a list, got {other}");
            BTreeSet::new()
        }
    }
}

fn mastery_levels(value: Option<&Value>) -> BTreeMap<String, u8> {
    let Some(Value::Object(levels)) = value else {
        return BTreeMap::new();
    };

    levels
        .iter()
        .filter_map(|(word, level)| match level.as_f64() {
            Some(n) => Some((word.clone(), n.round().clamp(0.0, MAX_MASTERY as f64) as u8)),
            None => {
                warn!("dropping non-numeric mastery level for {word}: {level}");
                None
            }
        })
        .collect()
}

/// Accepts a plain date, the full UTC timestamp some records stored (read back
/// as the learner's local day), or the `"Sat Mar 09 2024"` form of the oldest
/// records.
fn calendar_day(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| d.with_timezone(&Local).date_naive())
        })
        .or_else(|| NaiveDate::parse_from_str(s, "%a %b %d %Y").ok())
}

fn quiz_results(value: Option<&Value>) -> Vec<QuizResult> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match QuizResult::deserialize(item) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("dropping malformed quiz result: {e}");
                None
            }
        })
        .collect()
}
