use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Quiz not found: {0}")]
    UnknownQuiz(String),

    #[error("Word not found: {0}")]
    UnknownWord(String),

    #[error("Quiz has no questions: {0}")]
    EmptyQuiz(String),

    #[error(
        "Not enough words to build a quiz: need at least {needed}, found {available}. Try broadening the filters"
    )]
    InsufficientPool { needed: usize, available: usize },

    #[error("Invalid quiz action: {0}")]
    InvalidTransition(&'static str),
}
