//! Command-line configuration shared by both binaries.

use std::io;
use std::path::PathBuf;

use clap::Args;

use crate::VocabMaster;
use crate::error::AppError;
use crate::storage::catalog;

#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Path to the SQLite database file (default: ~/.vocab-master.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Vocabulary dataset (JSON array of entries)
    #[arg(long, global = true, default_value = "data/vocabulary.json")]
    pub vocabulary: PathBuf,

    /// Quiz catalog (JSON object with a "quizzes" array)
    #[arg(long, global = true, default_value = "data/quiz.json")]
    pub quizzes: PathBuf,
}

impl DataArgs {
    pub fn db_path(&self) -> Result<PathBuf, AppError> {
        match &self.db {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    /// Load both datasets and open the study database.
    pub fn open(&self) -> Result<VocabMaster, AppError> {
        let vocabulary = catalog::load_vocabulary(&self.vocabulary)?;
        let quizzes = catalog::load_quizzes(&self.quizzes)?;
        log::debug!(
            "loaded {} words and {} quizzes",
            vocabulary.len(),
            quizzes.len()
        );
        VocabMaster::open(&self.db_path()?, vocabulary, quizzes)
    }
}

pub fn default_db_path() -> Result<PathBuf, AppError> {
    dirs::home_dir()
        .map(|home| home.join(".vocab-master.db"))
        .ok_or_else(|| {
            AppError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine home directory",
            ))
        })
}

/// `warn` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}
