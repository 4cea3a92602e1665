use std::str::FromStr;

use crate::engine::stats::mastered_words;
use crate::model::StudyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Bookmarks,
    Mastered,
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bookmarks" | "bookmarked" => Ok(ExportKind::Bookmarks),
            "mastered" => Ok(ExportKind::Mastered),
            other => Err(format!("unknown export '{other}' (bookmarks, mastered)")),
        }
    }
}

impl ExportKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportKind::Bookmarks => "bookmarks.txt",
            ExportKind::Mastered => "mastered-words.txt",
        }
    }

    /// Newline-joined word list, no trailing newline.
    pub fn render(self, state: &StudyState) -> String {
        match self {
            ExportKind::Bookmarks => state
                .bookmarked_words
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            ExportKind::Mastered => mastered_words(state).join("\n"),
        }
    }
}
