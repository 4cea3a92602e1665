use log::warn;

use crate::error::AppError;
use crate::model::{QuizSummary, StudyState};
use crate::storage::kv::KeyValueStore;
use crate::storage::schema;

/// Key the study record is stored under.
pub const STATE_KEY: &str = "vocabMasterState_v2";

fn summary_keys(quiz_id: &str) -> [String; 3] {
    [
        format!("quiz_{quiz_id}_attempts"),
        format!("quiz_{quiz_id}_best"),
        format!("quiz_{quiz_id}_avg"),
    ]
}

// ── Study record ─────────────────────────────────────────────────────────

/// Read the study record. Absent, unreadable or malformed data yields the
/// default state (or a partial recovery of it), never an error.
pub fn load_state<S: KeyValueStore + ?Sized>(store: &S) -> StudyState {
    match store.get(STATE_KEY) {
        Ok(Some(raw)) => schema::decode(&raw),
        Ok(None) => StudyState::default(),
        Err(e) => {
            warn!("could not read study record, starting fresh: {e}");
            StudyState::default()
        }
    }
}

pub fn save_state<S: KeyValueStore + ?Sized>(
    store: &mut S,
    state: &StudyState,
) -> Result<(), AppError> {
    let raw = schema::encode(state)?;
    store.set(STATE_KEY, &raw)
}

// ── Per-quiz summaries ───────────────────────────────────────────────────

fn read_number<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> u32 {
    match store.get(key) {
        Ok(Some(raw)) => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 => n.round() as u32,
            _ => {
                warn!("ignoring malformed value for {key}: {raw:?}");
                0
            }
        },
        Ok(None) => 0,
        Err(e) => {
            warn!("could not read {key}: {e}");
            0
        }
    }
}

pub fn load_quiz_summary<S: KeyValueStore + ?Sized>(store: &S, quiz_id: &str) -> QuizSummary {
    let [attempts, best, avg] = summary_keys(quiz_id);
    QuizSummary {
        attempts: read_number(store, &attempts),
        best: read_number(store, &best),
        average: read_number(store, &avg),
    }
}

pub fn save_quiz_summary<S: KeyValueStore + ?Sized>(
    store: &mut S,
    quiz_id: &str,
    summary: &QuizSummary,
) -> Result<(), AppError> {
    let [attempts, best, avg] = summary_keys(quiz_id);
    store.set_many(&[
        (attempts, summary.attempts.to_string()),
        (best, summary.best.to_string()),
        (avg, summary.average.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::SqliteStore;
    use crate::storage::kv::MemoryStore;

    #[test]
    fn empty_store_loads_default_state() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(load_state(&store), StudyState::default());
    }

    #[test]
    fn saved_state_loads_back_identically() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut state = StudyState::default();
        state.bookmarked_words.insert("lucid".into());
        state.mastered_words.insert("lucid".into(), 4);
        state.study_stats.study_streak = 2;

        save_state(&mut store, &state).unwrap();
        let loaded = load_state(&store);
        assert_eq!(loaded, state);

        // Saving what was loaded writes the same bytes again.
        let first = store.get(STATE_KEY).unwrap();
        save_state(&mut store, &loaded).unwrap();
        assert_eq!(store.get(STATE_KEY).unwrap(), first);
    }

    #[test]
    fn corrupt_record_loads_default_state() {
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, "{\"currentCardIndex\": ").unwrap();
        assert_eq!(load_state(&store), StudyState::default());
    }

    #[test]
    fn save_state_reports_write_failures() {
        let mut store = MemoryStore::failing();
        let err = save_state(&mut store, &StudyState::default()).unwrap_err();
        assert!(matches!(err, AppError::Io(_)), "got: {err:?}");
    }

    #[test]
    fn missing_summary_reads_as_zero() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(load_quiz_summary(&store, "hs-basics"), QuizSummary::default());
    }

    #[test]
    fn summary_uses_one_key_per_field() {
        let mut store = SqliteStore::in_memory().unwrap();
        let summary = QuizSummary {
            attempts: 2,
            best: 72,
            average: 61,
        };
        save_quiz_summary(&mut store, "hs-basics", &summary).unwrap();

        assert_eq!(
            store.get("quiz_hs-basics_best").unwrap().as_deref(),
            Some("72")
        );
        assert_eq!(load_quiz_summary(&store, "hs-basics"), summary);
    }

    #[test]
    fn legacy_float_summary_values_are_rounded() {
        let mut store = MemoryStore::new();
        store.set("quiz_x_attempts", "3").unwrap();
        store.set("quiz_x_best", "88").unwrap();
        store.set("quiz_x_avg", "70.6").unwrap();
        store.set("quiz_y_avg", "NaN").unwrap();

        let x = load_quiz_summary(&store, "x");
        assert_eq!((x.attempts, x.best, x.average), (3, 88, 71));
        assert_eq!(load_quiz_summary(&store, "y").average, 0);
    }
}
